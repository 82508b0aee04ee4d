//! Activations, refraction keys and conflict resolution.
//!
//! An activation is one concrete, matched-but-not-yet-fired instance of a
//! rule. Activations are ephemeral and recomputed every cycle; what persists
//! is the fired-history set of activation keys, which is what keeps an
//! identical instantiation from firing twice.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::construct::{Fact, Rule, Term};
use crate::error::KindlingError;
use crate::unify::Bindings;

// ------------- Activation -------------
#[derive(Clone, Debug)]
pub struct Activation {
    rule: Arc<Rule>,
    bindings: Bindings,
    supports: Vec<Arc<Fact>>,
}

impl Activation {
    pub fn new(rule: Arc<Rule>, bindings: Bindings, supports: Vec<Arc<Fact>>) -> Self {
        Self {
            rule,
            bindings,
            supports,
        }
    }
    pub fn rule(&self) -> &Arc<Rule> {
        &self.rule
    }
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }
    pub fn supports(&self) -> &[Arc<Fact>] {
        &self.supports
    }
    /// The key identifying this activation's effect for refraction. Bindings
    /// enter the key canonically sorted, so two activations binding the same
    /// variables to the same terms in a different encounter order still
    /// collide.
    pub fn key(&self) -> ActivationKey {
        ActivationKey {
            rule: String::from(self.rule.name()),
            bindings: self.bindings.sorted(),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.rule.name(), self.bindings)
    }
}

// ------------- ActivationKey -------------
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ActivationKey {
    rule: String,
    bindings: Vec<(String, Term)>,
}

impl ActivationKey {
    pub fn rule(&self) -> &str {
        &self.rule
    }
}

impl fmt::Display for ActivationKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = String::new();
        for (variable, term) in &self.bindings {
            s += &format!("?{} = {}, ", variable, term);
        }
        s.pop();
        s.pop();
        write!(f, "{} {{{}}}", self.rule, s)
    }
}

// ------------- Strategy -------------
/// Conflict-resolution strategy. Each is a total order over the agenda with
/// deterministic tie-breaking; selection prefers the first agenda entry
/// among equals, and the agenda itself is built in rule declaration order
/// then match order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    #[default]
    Priority,
    Specificity,
    Order,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Priority => "priority",
            Strategy::Specificity => "specificity",
            Strategy::Order => "order",
        }
    }
    /// Selects exactly one activation, or none when the agenda is empty.
    pub fn select<'a>(&self, agenda: &'a [Activation]) -> Option<&'a Activation> {
        match self {
            // priority dominates, specificity breaks priority ties, earlier
            // declaration breaks the rest
            Strategy::Priority => agenda.iter().min_by_key(|a| {
                (
                    Reverse(a.rule().priority()),
                    Reverse(a.rule().condition_count()),
                    a.rule().index(),
                )
            }),
            Strategy::Specificity => agenda.iter().min_by_key(|a| {
                (
                    Reverse(a.rule().condition_count()),
                    Reverse(a.rule().priority()),
                    a.rule().index(),
                )
            }),
            // globally lowest declaration index; among that rule's matches
            // the first found wins
            Strategy::Order => agenda.iter().min_by_key(|a| a.rule().index()),
        }
    }
}

impl FromStr for Strategy {
    type Err = KindlingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "priority" => Ok(Strategy::Priority),
            "specificity" => Ok(Strategy::Specificity),
            "order" => Ok(Strategy::Order),
            other => Err(KindlingError::Config(format!(
                "unknown conflict resolution strategy: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
