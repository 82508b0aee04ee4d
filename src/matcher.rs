//! Conjunctive pattern matching: a depth-first backtracking search that
//! finds every way an ordered condition list can be satisfied against
//! working memory.
//!
//! The search is exponential in the condition count, bounded by
//! (memory size)^(condition count). At the scale this engine targets
//! (tens of facts, rules with a handful of conditions) that is fine, and
//! recursion depth is bounded by the condition-list length by construction.

use std::sync::Arc;

use crate::construct::{Fact, Term, WorkingMemory};
use crate::unify::{Bindings, unify};

/// One way of satisfying a condition list: the accumulated bindings and the
/// facts consumed by each condition, in condition order.
#[derive(Clone, Debug)]
pub struct Match {
    pub bindings: Bindings,
    pub supports: Vec<Arc<Fact>>,
}

/// Enumerates every combination of facts that jointly satisfies the ordered
/// conjunction. Result order is deterministic: facts are tried in working
/// memory order for each condition, conditions left to right, so conflict
/// resolution tie-breaks are reproducible.
pub fn match_conditions(conditions: &[Term], memory: &WorkingMemory) -> Vec<Match> {
    let mut results = Vec::new();
    let mut supports = Vec::new();
    descend(
        conditions,
        memory,
        &Bindings::new(),
        &mut supports,
        &mut results,
    );
    results
}

fn descend(
    remaining: &[Term],
    memory: &WorkingMemory,
    env: &Bindings,
    supports: &mut Vec<Arc<Fact>>,
    results: &mut Vec<Match>,
) {
    let Some((first, rest)) = remaining.split_first() else {
        // zero remaining conditions: one result, exactly as accumulated
        results.push(Match {
            bindings: env.clone(),
            supports: supports.clone(),
        });
        return;
    };
    for fact in memory.facts() {
        // each candidate gets a fresh extension of the pre-branch
        // environment, so siblings never see partial bindings
        if let Some(extended) = unify(first, fact.term(), env) {
            supports.push(Arc::clone(fact));
            descend(rest, memory, &extended, supports, results);
            supports.pop();
        }
    }
}
