use std::sync::Arc;

// used to keep the one-to-one mapping between facts and their assigned identities
use bimap::BiMap;

// other keepers use HashSet or HashMap
use core::hash::BuildHasherDefault;
use std::collections::HashSet;
use seahash::SeaHasher;

// used to print out readable forms of a construct
use std::fmt;

use crate::error::{KindlingError, Result};

// ------------- FactId -------------
pub type FactId = u64;

pub type ThingHasher = BuildHasherDefault<SeaHasher>;
pub type OtherHasher = BuildHasherDefault<SeaHasher>;

pub const GENESIS: FactId = 0;

// Identities are only handed out by the keeper, one per distinct fact,
// in assertion order. There is no release: working memory never shrinks.
#[derive(Debug)]
pub struct FactIdGenerator {
    lower_bound: FactId,
}

impl FactIdGenerator {
    pub fn new() -> Self {
        Self {
            lower_bound: GENESIS,
        }
    }
    pub fn generate(&mut self) -> FactId {
        self.lower_bound += 1;
        self.lower_bound
    }
}

// ------------- Constant -------------
// An opaque atomic value, compared by equality. Symbols cover both bare
// identifiers and quoted text; numbers exist so rule bases can talk about
// credit limits and the like without encoding digits as names.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Debug)]
pub enum Constant {
    Symbol(String),
    Number(i64),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Constant::Symbol(s) => write!(f, "{}", s),
            Constant::Number(n) => write!(f, "{}", n),
        }
    }
}

// ------------- Term -------------
// The term algebra: constants, variables (lexically marked with a leading
// '?' in the notation, stored without the sigil), and compounds. A compound
// is an ordered, fixed-arity sequence of terms and is immutable once built.
// By convention the first element of a compound is a symbol acting as its
// functor, which is how it is rendered.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Debug)]
pub enum Term {
    Constant(Constant),
    Variable(String),
    Compound(Vec<Term>),
}

impl Term {
    pub fn symbol(name: &str) -> Self {
        Term::Constant(Constant::Symbol(String::from(name)))
    }
    pub fn number(value: i64) -> Self {
        Term::Constant(Constant::Number(value))
    }
    pub fn variable(name: &str) -> Self {
        Term::Variable(String::from(name))
    }
    pub fn compound(elements: Vec<Term>) -> Self {
        Term::Compound(elements)
    }
    /// A compound built from a functor name and its arguments, the usual way
    /// conditions and facts are written: `apply("likes", ...)` renders as
    /// `likes(...)`.
    pub fn apply(functor: &str, args: Vec<Term>) -> Self {
        let mut elements = Vec::with_capacity(args.len() + 1);
        elements.push(Term::symbol(functor));
        elements.extend(args);
        Term::Compound(elements)
    }
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Constant(_) => true,
            Term::Variable(_) => false,
            Term::Compound(elements) => elements.iter().all(|e| e.is_ground()),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Term::Constant(c) => write!(f, "{}", c),
            Term::Variable(v) => write!(f, "?{}", v),
            Term::Compound(elements) => match elements.split_first() {
                Some((Term::Constant(Constant::Symbol(functor)), args)) => {
                    let mut s = String::new();
                    for a in args {
                        s += &(a.to_string() + ", ");
                    }
                    s.pop();
                    s.pop();
                    write!(f, "{}({})", functor, s)
                }
                _ => {
                    let mut s = String::new();
                    for e in elements {
                        s += &(e.to_string() + ", ");
                    }
                    s.pop();
                    s.pop();
                    write!(f, "({})", s)
                }
            },
        }
    }
}

// ------------- Fact -------------
// A fact is a ground compound term. Groundness is checked at construction,
// so everything downstream (matching, provenance) can rely on it.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Debug)]
pub struct Fact {
    term: Term,
}

impl Fact {
    pub fn new(term: Term) -> Option<Self> {
        match &term {
            Term::Compound(_) if term.is_ground() => Some(Self { term }),
            _ => None,
        }
    }
    pub fn term(&self) -> &Term {
        &self.term
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.term)
    }
}

// ------------- FactKeeper -------------
#[derive(Debug)]
pub struct FactKeeper {
    kept: BiMap<Arc<Fact>, FactId>,
    generator: FactIdGenerator,
}

impl FactKeeper {
    pub fn new() -> Self {
        Self {
            kept: BiMap::new(),
            generator: FactIdGenerator::new(),
        }
    }
    pub fn keep(&mut self, fact: Fact) -> (Arc<Fact>, FactId, bool) {
        let keepsake = Arc::new(fact);
        match self.kept.get_by_left(&keepsake) {
            Some(id) => {
                let id = *id;
                (Arc::clone(self.kept.get_by_right(&id).unwrap()), id, true)
            }
            None => {
                let id = self.generator.generate();
                self.kept.insert(Arc::clone(&keepsake), id);
                (keepsake, id, false)
            }
        }
    }
    pub fn id_of(&self, fact: &Fact) -> Option<FactId> {
        // Arc<Fact> borrows as Fact, so a bare fact works as the probe
        self.kept.get_by_left(fact).copied()
    }
    pub fn fact_of(&self, id: FactId) -> Option<Arc<Fact>> {
        self.kept.get_by_right(&id).map(Arc::clone)
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
}

// ------------- WorkingMemory -------------
// An insertion-ordered, duplicate-free sequence of facts. Order reflects
// assertion order and matters for the "order" strategy's determinism and
// for display, never for correctness of matching.
#[derive(Debug)]
pub struct WorkingMemory {
    order: Vec<Arc<Fact>>,
    keeper: FactKeeper,
}

impl WorkingMemory {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            keeper: FactKeeper::new(),
        }
    }
    /// Keeps the fact, appending it to the memory order when it was not
    /// previously known. The flag follows the keeper convention: true when
    /// the fact had already been kept.
    pub fn assert_fact(&mut self, fact: Fact) -> (Arc<Fact>, FactId, bool) {
        let (kept, id, previously_kept) = self.keeper.keep(fact);
        if !previously_kept {
            self.order.push(Arc::clone(&kept));
        }
        (kept, id, previously_kept)
    }
    pub fn contains(&self, fact: &Fact) -> bool {
        self.keeper.id_of(fact).is_some()
    }
    pub fn id_of(&self, fact: &Fact) -> Option<FactId> {
        self.keeper.id_of(fact)
    }
    pub fn fact_of(&self, id: FactId) -> Option<Arc<Fact>> {
        self.keeper.fact_of(id)
    }
    pub fn facts(&self) -> &[Arc<Fact>] {
        &self.order
    }
    pub fn len(&self) -> usize {
        self.order.len()
    }
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// ------------- Rule -------------
// It's intentional to encapsulate the fields in the struct and only expose
// them using "getters", because this yields true immutability after
// creation. The declaration index is assigned by the rule base.
#[derive(Debug)]
pub struct Rule {
    name: String,
    conditions: Vec<Term>,
    actions: Vec<Term>,
    priority: i64,
    index: usize,
}

impl Rule {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn conditions(&self) -> &[Term] {
        &self.conditions
    }
    pub fn actions(&self) -> &[Term] {
        &self.actions
    }
    pub fn priority(&self) -> i64 {
        self.priority
    }
    pub fn index(&self) -> usize {
        self.index
    }
    /// Specificity of the rule, used by conflict resolution.
    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let list = |terms: &[Term]| {
            let mut s = String::new();
            for t in terms {
                s += &(t.to_string() + ", ");
            }
            s.pop();
            s.pop();
            s
        };
        write!(
            f,
            "rule {} @{} when {} then {}",
            self.name,
            self.priority,
            list(&self.conditions),
            list(&self.actions)
        )
    }
}

// ------------- RuleBase -------------
#[derive(Debug, Default)]
pub struct RuleBase {
    rules: Vec<Arc<Rule>>,
    names: HashSet<String, OtherHasher>,
}

impl RuleBase {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            names: HashSet::default(),
        }
    }
    /// Creates a rule and assigns its declaration index. Conditions and
    /// actions must be compound terms; rule names must be unique within the
    /// base. Variables in the actions are not checked against the
    /// conditions here: an action variable the conditions never bind passes
    /// through firing as a literal token (see the engine).
    pub fn create_rule(
        &mut self,
        name: String,
        conditions: Vec<Term>,
        actions: Vec<Term>,
        priority: i64,
    ) -> Result<Arc<Rule>> {
        if self.names.contains(&name) {
            return Err(KindlingError::Execution(format!(
                "duplicate rule name: {}",
                name
            )));
        }
        for term in conditions.iter().chain(actions.iter()) {
            if !matches!(term, Term::Compound(_)) {
                return Err(KindlingError::Execution(format!(
                    "rule {}: conditions and actions must be compound terms, got {}",
                    name, term
                )));
            }
        }
        let rule = Arc::new(Rule {
            name: name.clone(),
            conditions,
            actions,
            priority,
            index: self.rules.len(),
        });
        self.names.insert(name);
        self.rules.push(Arc::clone(&rule));
        Ok(rule)
    }
    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }
    pub fn len(&self) -> usize {
        self.rules.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Clone for RuleBase {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
            names: self.names.clone(),
        }
    }
}
