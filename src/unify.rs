//! Structural unification of terms under a binding environment.
//!
//! Environments are never mutated in place across attempts: [`unify`] clones
//! the given environment and extends the clone, so a failed candidate leaves
//! the caller's environment untouched and sibling candidates never observe
//! each other's partial bindings.
//!
//! There is no occurs-check. Binding a variable to a term that contains that
//! same variable is permitted and can cause unbounded recursion if such a
//! binding is ever dereferenced cyclically. This is an accepted limitation,
//! not corrected silently.

use std::collections::HashMap;
use std::fmt;

use crate::construct::{Constant, OtherHasher, Term};

// ------------- Bindings -------------
/// A mapping from variable name to term, built incrementally during
/// unification. Once a variable is bound it is never rebound to an
/// inconsistent value within the same environment; re-unifying an already
/// bound variable recurses through its current binding, which is what makes
/// variable-to-variable chains work.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bindings {
    map: HashMap<String, Term, OtherHasher>,
}

impl Bindings {
    pub fn new() -> Self {
        Self {
            map: HashMap::default(),
        }
    }
    pub fn get(&self, variable: &str) -> Option<&Term> {
        self.map.get(variable)
    }
    pub fn bind(&mut self, variable: String, term: Term) {
        self.map.insert(variable, term);
    }
    pub fn len(&self) -> usize {
        self.map.len()
    }
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
    /// The bindings as a canonically sorted list of pairs. Activation keys
    /// and display both go through this, so equality over bindings is a set
    /// comparison, never an insertion-order one.
    pub fn sorted(&self) -> Vec<(String, Term)> {
        let mut pairs: Vec<(String, Term)> = self
            .map
            .iter()
            .map(|(v, t)| (v.clone(), t.clone()))
            .collect();
        pairs.sort();
        pairs
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = String::new();
        for (variable, term) in self.sorted() {
            s += &format!("?{} = {}, ", variable, term);
        }
        s.pop();
        s.pop();
        write!(f, "{{{}}}", s)
    }
}

// ------------- Unification -------------
/// Attempts to unify a pattern with a value under the given environment.
/// Returns the extended environment on success. Variables are handled on
/// either side, so matching works in both argument positions.
pub fn unify(pattern: &Term, value: &Term, env: &Bindings) -> Option<Bindings> {
    let mut extended = env.clone();
    if unify_into(pattern, value, &mut extended) {
        Some(extended)
    } else {
        None
    }
}

fn unify_into(a: &Term, b: &Term, env: &mut Bindings) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Term::Variable(v), _) => unify_variable(v, b, env),
        (_, Term::Variable(v)) => unify_variable(v, a, env),
        (Term::Compound(xs), Term::Compound(ys)) => {
            // same arity, element pairs unify with the environment threaded
            // left to right; any element failure fails the whole compound
            xs.len() == ys.len() && xs.iter().zip(ys.iter()).all(|(x, y)| unify_into(x, y, env))
        }
        _ => false,
    }
}

fn unify_variable(variable: &str, value: &Term, env: &mut Bindings) -> bool {
    if let Some(bound) = env.get(variable).cloned() {
        return unify_into(&bound, value, env);
    }
    env.bind(String::from(variable), value.clone());
    true
}

// ------------- Instantiation -------------
/// Substitutes bound variables into a consequent template. A variable the
/// environment does not bind is emitted as a literal constant carrying the
/// variable's sigiled name: a rule whose consequent references a variable
/// its antecedent never bound will assert that token as data. The engine
/// does not detect this; it is a latent authoring bug passed through
/// deliberately.
pub fn instantiate(template: &Term, env: &Bindings) -> Term {
    match template {
        Term::Constant(_) => template.clone(),
        Term::Variable(v) => match env.get(v) {
            Some(bound) => instantiate(bound, env),
            None => Term::Constant(Constant::Symbol(format!("?{}", v))),
        },
        Term::Compound(elements) => {
            Term::Compound(elements.iter().map(|e| instantiate(e, env)).collect())
        }
    }
}
