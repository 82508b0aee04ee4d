//! Kindling – a forward-chaining production rule engine.
//!
//! Kindling centers on three constructs: *facts* (ground compound terms
//! held in an insertion-ordered working memory), *rules* (condition/action
//! pairs over terms with variables), and *activations* (concrete matched
//! instantiations of a rule). Each inference cycle matches every rule
//! against working memory, drops instantiations that already fired
//! (refraction), picks one survivor by a conflict-resolution strategy, and
//! asserts its instantiated consequents — until no activation remains or a
//! step ceiling is hit.
//!
//! Facts are owned and deduplicated by a "keeper" structure that assigns
//! each distinct fact an identity, enabling canonical sharing through `Arc`
//! and identity-keyed provenance. Every assertion is recorded in an
//! append-only provenance ledger, from which justification trees can be
//! rendered on demand.
//!
//! ## Modules
//! * [`construct`] – Terms, facts, the fact keeper, working memory, rules.
//! * [`unify`] – Binding environments, unification and template
//!   instantiation.
//! * [`matcher`] – Backtracking search satisfying a rule's condition list.
//! * [`agenda`] – Activations, refraction keys and conflict-resolution
//!   strategies.
//! * [`engine`] – The session loop (match → resolve → act), halt reasons
//!   and the trace-sink observation points.
//! * [`provenance`] – The derivation ledger and justification rendering.
//! * [`tinder`] – A minimal DSL (parser + engine) for declaring facts and
//!   rules and driving inference runs. Grammar details live in
//!   `tinder.pest`.
//! * [`interface`] – Thread-per-run submission with cooperative
//!   cancellation at cycle boundaries.
//! * [`error`] – The crate-wide error type.
//!
//! ## Quick Start
//! ```
//! use kindling::tinder::Engine;
//! let mut engine = Engine::new();
//! let result = engine.execute_collect(
//!     "fact graduate-only(CS550), not-graduate-student(Carol); \
//!      rule graduate-only-course-restriction @7 \
//!        when graduate-only(?course), not-graduate-student(?student) \
//!        then cannot-enroll-course(?student, ?course); \
//!      infer priority;",
//! ).unwrap();
//! assert!(result.runs[0].memory.contains(&String::from("cannot-enroll-course(Carol, CS550)")));
//! ```
//!
//! ## Limitations
//! Deliberate ones, documented where they live: no occurs-check in
//! unification, no retraction (working memory only grows), and consequent
//! variables the antecedent never bound pass through firing as literal
//! tokens instead of being rejected.

pub mod agenda;
pub mod construct;
pub mod engine;
pub mod error;
pub mod interface;
pub mod matcher;
pub mod provenance;
pub mod tinder;
pub mod unify;
