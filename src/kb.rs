use crate::triple::Triple;
use std::collections::{HashMap, HashSet};

/// An in-memory triple store (§10.4). The real KB — storage, indexes,
/// functionality statistics, overlap tables — is explicitly out of scope
/// (§1); this is the fixture the default assistant and the test/bench
/// suites mine against.
pub struct MemoryKb {
    triples: Vec<Triple>,
    by_relation: HashMap<u32, Vec<Triple>>,
}

impl MemoryKb {
    pub fn new(triples: Vec<Triple>) -> Self {
        let mut by_relation: HashMap<u32, Vec<Triple>> = HashMap::new();
        for t in &triples {
            by_relation.entry(t.predicate).or_default().push(*t);
        }
        Self {
            triples,
            by_relation,
        }
    }

    pub fn relations(&self) -> impl Iterator<Item = u32> + '_ {
        self.by_relation.keys().copied()
    }

    pub fn relation_size(&self, predicate: u32) -> u64 {
        self.by_relation
            .get(&predicate)
            .map(|v| v.len() as u64)
            .unwrap_or(0)
    }

    pub fn triples_for(&self, predicate: u32) -> &[Triple] {
        self.by_relation
            .get(&predicate)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn all_triples(&self) -> &[Triple] {
        &self.triples
    }

    /// Every subject appearing at least once under `predicate` — used for
    /// the PCA confidence denominator (§6's glossary entry).
    pub fn subjects_with_relation(&self, predicate: u32) -> HashSet<u32> {
        self.triples_for(predicate).iter().map(|t| t.subject).collect()
    }

    /// Every constant id appearing anywhere in the store, used by the
    /// instantiated-atom operator.
    pub fn constants(&self) -> HashSet<u32> {
        let mut ids = HashSet::new();
        for t in &self.triples {
            ids.insert(t.subject);
            ids.insert(t.object);
        }
        ids
    }
}
