//! The derivation ledger: how each fact came to be in working memory, and
//! the justification trees reconstructed from it.
//!
//! The ledger is append-only and write-once: a fact's entry is recorded at
//! the moment it is first asserted and never overwritten, mirroring the
//! write-once discipline of the fact keeper itself.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::construct::{Fact, FactId, ThingHasher, WorkingMemory};
use crate::unify::Bindings;

// ------------- Provenance -------------
#[derive(Clone, Debug)]
pub enum Provenance {
    /// Present in the initial working memory.
    Given,
    /// Asserted by a rule firing.
    Inferred {
        rule: String,
        bindings: Bindings,
        supports: Vec<FactId>,
    },
}

// ------------- ProvenanceLedger -------------
#[derive(Debug, Default)]
pub struct ProvenanceLedger {
    entries: HashMap<FactId, Provenance, ThingHasher>,
}

impl ProvenanceLedger {
    pub fn new() -> Self {
        Self {
            entries: HashMap::default(),
        }
    }
    /// Records the entry for a fact unless one already exists. The first
    /// writer wins; re-assertions of a known fact leave the ledger alone.
    pub fn record(&mut self, id: FactId, provenance: Provenance) {
        if let Entry::Vacant(e) = self.entries.entry(id) {
            e.insert(provenance);
        }
    }
    pub fn get(&self, id: FactId) -> Option<&Provenance> {
        self.entries.get(&id)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the justification tree for a fact as indented text, one node
    /// per line, depth first. Facts given at the start are leaves; inferred
    /// facts print their producing rule and bindings and recurse into their
    /// supports. A fact already printed earlier in the traversal renders as
    /// a back-reference, which keeps shared sub-justifications (diamond
    /// dependencies) from being expanded twice. A fact the ledger has never
    /// seen renders as an explicit unknown-source leaf.
    pub fn explain(&self, fact: &Fact, memory: &WorkingMemory) -> String {
        let mut out = String::new();
        let mut visited: HashSet<FactId, ThingHasher> = HashSet::default();
        self.render(fact, memory, 0, &mut visited, &mut out);
        if out.ends_with('\n') {
            out.pop();
        }
        out
    }

    fn render(
        &self,
        fact: &Fact,
        memory: &WorkingMemory,
        depth: usize,
        visited: &mut HashSet<FactId, ThingHasher>,
        out: &mut String,
    ) {
        let indent = "  ".repeat(depth);
        let Some(id) = memory.id_of(fact) else {
            out.push_str(&format!("{}{} (unknown source)\n", indent, fact));
            return;
        };
        if !visited.insert(id) {
            out.push_str(&format!("{}{} (see above)\n", indent, fact));
            return;
        }
        match self.entries.get(&id) {
            None => {
                out.push_str(&format!("{}{} (unknown source)\n", indent, fact));
            }
            Some(Provenance::Given) => {
                out.push_str(&format!("{}{} (given)\n", indent, fact));
            }
            Some(Provenance::Inferred {
                rule,
                bindings,
                supports,
            }) => {
                out.push_str(&format!("{}{} <- {} {}\n", indent, fact, rule, bindings));
                for support in supports {
                    match memory.fact_of(*support) {
                        Some(supporting) => {
                            self.render(&supporting, memory, depth + 1, visited, out)
                        }
                        None => out.push_str(&format!(
                            "{}  fact #{} (unknown source)\n",
                            indent, support
                        )),
                    }
                }
            }
        }
    }
}
