//! The forward-chaining loop: match, resolve, act, repeat.
//!
//! A [`Session`] owns its working memory, fired history and provenance
//! ledger outright. Nothing here is process-global, so independent
//! inference runs are simply independent sessions. The loop is synchronous
//! and single-threaded; each cycle runs to completion before the next
//! begins, and the boundary between cycles is the only place a caller can
//! inject a cooperative check (see the `interface` module).

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::agenda::{Activation, ActivationKey, Strategy};
use crate::construct::{Fact, FactId, OtherHasher, Rule, RuleBase, WorkingMemory};
use crate::error::{KindlingError, Result};
use crate::matcher::match_conditions;
use crate::provenance::{Provenance, ProvenanceLedger};
use crate::unify::instantiate;

/// Defensive ceiling on fired cycles. A malformed rule base that keeps
/// minting distinct new facts (e.g. through a self-feeding compound
/// consequent) would otherwise never quiesce.
pub const DEFAULT_STEP_LIMIT: usize = 10_000;

// ------------- Halt -------------
/// Why a run stopped. Callers must be able to tell the step-limit halt
/// apart from a normal one, so it is a distinguished value, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Halt {
    /// The agenda came up empty: no applicable rules remain.
    Quiescent { cycles: usize },
    /// The hard iteration ceiling was reached before quiescence.
    StepLimit { limit: usize },
}

// ------------- Trace events -------------
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchAttempt {
    /// The rule's conditions had no satisfying combination at all.
    Failed,
    /// The matcher found `total` combinations, of which `refracted` had
    /// already fired and were dropped from the agenda.
    Matched { total: usize, refracted: usize },
}

/// Observation points the engine calls into at well-defined moments. All
/// hooks default to no-ops and the engine's final state is identical
/// whether or not anything observes them. Implementations must not block.
pub trait TraceSink {
    fn cycle_start(&mut self, _cycle: usize, _memory: &[Arc<Fact>]) {}
    fn rule_attempt(&mut self, _rule: &Rule, _attempt: &MatchAttempt) {}
    fn activation_selected(&mut self, _activation: &Activation) {}
    fn fact_asserted(&mut self, _fact: &Fact) {}
}

/// Observes nothing.
pub struct NullSink;
impl TraceSink for NullSink {}

/// Forwards engine events to `tracing`, which is how the binary narrates a
/// run. Cycle chatter goes to debug, firings and assertions to info.
pub struct TracingSink;
impl TraceSink for TracingSink {
    fn cycle_start(&mut self, cycle: usize, memory: &[Arc<Fact>]) {
        debug!(cycle, facts = memory.len(), "cycle start");
    }
    fn rule_attempt(&mut self, rule: &Rule, attempt: &MatchAttempt) {
        match attempt {
            MatchAttempt::Failed => debug!(rule = rule.name(), "match fails"),
            MatchAttempt::Matched { total, refracted } => {
                debug!(rule = rule.name(), total, refracted, "match succeeds")
            }
        }
    }
    fn activation_selected(&mut self, activation: &Activation) {
        info!(rule = activation.rule().name(), bindings = %activation.bindings(), "firing");
    }
    fn fact_asserted(&mut self, fact: &Fact) {
        info!(fact = %fact, "asserting");
    }
}

// ------------- Cycle outcome -------------
#[derive(Debug)]
pub enum CycleOutcome {
    /// One activation fired; `asserted` lists the facts that were new to
    /// working memory (possibly none, which does not halt the loop).
    Fired {
        key: ActivationKey,
        asserted: Vec<Arc<Fact>>,
    },
    Halted(Halt),
}

// ------------- Session -------------
pub struct Session {
    rule_base: Arc<RuleBase>,
    memory: WorkingMemory,
    fired: HashSet<ActivationKey, OtherHasher>,
    fired_order: Vec<ActivationKey>,
    provenance: ProvenanceLedger,
    strategy: Strategy,
    step_limit: usize,
    cycle_count: usize,
}

impl Session {
    /// Sets up a session over the given initial facts and rule base. The
    /// initial facts seed both working memory and the provenance ledger;
    /// duplicates collapse to their first occurrence.
    pub fn new(
        initial: Vec<Fact>,
        rule_base: Arc<RuleBase>,
        strategy: Strategy,
        step_limit: Option<usize>,
    ) -> Self {
        let mut memory = WorkingMemory::new();
        let mut provenance = ProvenanceLedger::new();
        for fact in initial {
            let (_, id, previously_kept) = memory.assert_fact(fact);
            if !previously_kept {
                provenance.record(id, Provenance::Given);
            }
        }
        Self {
            rule_base,
            memory,
            fired: HashSet::default(),
            fired_order: Vec::new(),
            provenance,
            strategy,
            step_limit: step_limit.unwrap_or(DEFAULT_STEP_LIMIT),
            cycle_count: 0,
        }
    }

    /// Runs one match -> resolve -> act step. The step ceiling is checked
    /// before matching, so a session at its limit reports the step-limit
    /// halt without doing further work.
    pub fn cycle(&mut self, sink: &mut dyn TraceSink) -> Result<CycleOutcome> {
        if self.fired_order.len() >= self.step_limit {
            return Ok(CycleOutcome::Halted(Halt::StepLimit {
                limit: self.step_limit,
            }));
        }
        self.cycle_count += 1;
        sink.cycle_start(self.cycle_count, self.memory.facts());

        // build the agenda: rules in declaration order, matches in matcher
        // order, already-fired instantiations dropped
        let mut agenda: Vec<Activation> = Vec::new();
        for rule in self.rule_base.rules() {
            let matches = match_conditions(rule.conditions(), &self.memory);
            if matches.is_empty() {
                sink.rule_attempt(rule, &MatchAttempt::Failed);
                continue;
            }
            let total = matches.len();
            let mut refracted = 0;
            for m in matches {
                let activation = Activation::new(Arc::clone(rule), m.bindings, m.supports);
                if self.fired.contains(&activation.key()) {
                    refracted += 1;
                    continue;
                }
                agenda.push(activation);
            }
            sink.rule_attempt(rule, &MatchAttempt::Matched { total, refracted });
        }
        if agenda.is_empty() {
            return Ok(CycleOutcome::Halted(Halt::Quiescent {
                cycles: self.fired_order.len(),
            }));
        }

        let selected = self.strategy.select(&agenda).ok_or_else(|| {
            KindlingError::Invariant(String::from("selection over a non-empty agenda came up empty"))
        })?;
        let key = selected.key();
        self.fired.insert(key.clone());
        self.fired_order.push(key.clone());
        sink.activation_selected(selected);

        let support_ids = selected
            .supports()
            .iter()
            .map(|f| {
                self.memory.id_of(f).ok_or_else(|| {
                    KindlingError::Invariant(format!("supporting fact {} left the keeper", f))
                })
            })
            .collect::<Result<Vec<FactId>>>()?;
        let rule_name = String::from(selected.rule().name());
        let bindings = selected.bindings().clone();

        let mut asserted = Vec::new();
        for template in selected.rule().actions() {
            let term = instantiate(template, &bindings);
            let fact = Fact::new(term).ok_or_else(|| {
                KindlingError::Invariant(format!(
                    "rule {}: instantiated action is not a ground compound",
                    rule_name
                ))
            })?;
            let (kept, id, previously_kept) = self.memory.assert_fact(fact);
            if !previously_kept {
                self.provenance.record(
                    id,
                    Provenance::Inferred {
                        rule: rule_name.clone(),
                        bindings: bindings.clone(),
                        supports: support_ids.clone(),
                    },
                );
                sink.fact_asserted(&kept);
                asserted.push(kept);
            }
        }
        Ok(CycleOutcome::Fired { key, asserted })
    }

    /// Drives cycles until the session halts. A firing that asserts nothing
    /// new keeps going; refraction and the finite rule base guarantee the
    /// agenda eventually empties, and the step ceiling catches rule bases
    /// that keep minting distinct facts.
    pub fn infer(&mut self, sink: &mut dyn TraceSink) -> Result<Halt> {
        loop {
            match self.cycle(sink)? {
                CycleOutcome::Halted(halt) => return Ok(halt),
                CycleOutcome::Fired { .. } => (),
            }
        }
    }

    pub fn memory(&self) -> &WorkingMemory {
        &self.memory
    }
    pub fn provenance(&self) -> &ProvenanceLedger {
        &self.provenance
    }
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
    pub fn step_limit(&self) -> usize {
        self.step_limit
    }
    /// Keys of fired activations, in firing order.
    pub fn fired_keys(&self) -> &[ActivationKey] {
        &self.fired_order
    }
    /// Justification tree for a fact, against this session's ledger.
    pub fn explain(&self, fact: &Fact) -> String {
        self.provenance.explain(fact, &self.memory)
    }
}
