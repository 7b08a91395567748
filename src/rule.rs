use crate::atom::{Atom, Term};
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A Horn clause over RDF-style atoms: `atoms[0]` is the head, `atoms[1..]`
/// the body. Statistics are filled in progressively as the rule survives
/// pruning stages (see [`crate::assistant::Assistant`]); a freshly-seeded
/// rule carries only cheap counts, an emitted one carries all of them.
#[derive(Debug, Clone)]
pub struct Rule {
    pub atoms: Vec<Atom>,
    pub real_length: usize,
    pub support_cardinality: u64,
    pub head_cardinality: u64,
    pub body_cardinality: u64,
    pub std_confidence: f64,
    pub pca_confidence: f64,
    pub std_confidence_upper_bound: f64,
    pub pca_confidence_upper_bound: f64,
    pub parent_rules: Vec<Arc<Rule>>,
    pub is_final: bool,
    pub is_perfect: bool,
}

/// A rule still in flight: support/head counts may already be populated,
/// confidences are filled in only once it survives support pruning. The
/// core never needs a separate type for this — the distinction is purely
/// in which fields a given pipeline stage has bothered to compute.
pub type Candidate = Rule;

/// Key under which dangling-atom refinements are returned from
/// [`crate::assistant::Assistant::apply_operators`]; the core special-cases
/// this key to gate against `max_depth - 1` (see §4.3).
pub const DANGLING: &str = "dangling";
/// Key for refinements that close the rule without introducing a new
/// variable.
pub const CLOSING: &str = "closing";

/// The keyed map of child-rule collections the assistant returns from one
/// operator application.
pub type ChildMap = HashMap<String, Vec<Candidate>>;

impl Rule {
    /// A length-1, head-only rule as produced by seed generation.
    pub fn seed(head: Atom) -> Self {
        Self {
            atoms: vec![head],
            real_length: 0,
            support_cardinality: 0,
            head_cardinality: 0,
            body_cardinality: 0,
            std_confidence: 0.0,
            pca_confidence: 0.0,
            std_confidence_upper_bound: 1.0,
            pca_confidence_upper_bound: 1.0,
            parent_rules: Vec::new(),
            is_final: false,
            is_perfect: false,
        }
    }

    /// Returns a child rule extending this one's body with `atom`.
    ///
    /// `counts_toward_depth` is false for "type"-like atoms the assistant
    /// excludes from `real_length` (§3).
    pub fn refine(&self, atom: Atom, counts_toward_depth: bool, parent: Arc<Rule>) -> Self {
        let mut atoms = self.atoms.clone();
        atoms.push(atom);
        Self {
            atoms,
            real_length: self.real_length + counts_toward_depth as usize,
            support_cardinality: 0,
            head_cardinality: 0,
            body_cardinality: 0,
            std_confidence: 0.0,
            pca_confidence: 0.0,
            std_confidence_upper_bound: 1.0,
            pca_confidence_upper_bound: 1.0,
            parent_rules: vec![parent],
            is_final: false,
            is_perfect: false,
        }
    }

    pub fn head(&self) -> &Atom {
        &self.atoms[0]
    }

    pub fn body(&self) -> &[Atom] {
        &self.atoms[1..]
    }

    /// Body atom count plus the head; matches the spec's `length`.
    pub fn length(&self) -> usize {
        self.atoms.len()
    }

    pub fn variables(&self) -> BTreeSet<u32> {
        let mut vars = BTreeSet::new();
        for atom in &self.atoms {
            if let Term::Var(v) = atom.subject {
                vars.insert(v);
            }
            if let Term::Var(v) = atom.object {
                vars.insert(v);
            }
        }
        vars
    }

    /// Every variable occurs in at least two atoms.
    pub fn is_closed(&self) -> bool {
        let mut counts: HashMap<u32, u32> = HashMap::new();
        for atom in &self.atoms {
            let mut in_atom = HashSet::new();
            if let Term::Var(v) = atom.subject {
                in_atom.insert(v);
            }
            if let Term::Var(v) = atom.object {
                in_atom.insert(v);
            }
            for v in in_atom {
                *counts.entry(v).or_insert(0) += 1;
            }
        }
        counts.values().all(|&c| c >= 2)
    }

    /// The rule's variable graph (edge per atom between its two variables)
    /// is a single connected component.
    pub fn is_connected(&self) -> bool {
        let vars: Vec<u32> = self.variables().into_iter().collect();
        if vars.len() <= 1 {
            return true;
        }
        let index: HashMap<u32, usize> = vars.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        let mut uf = UnionFind::new(vars.len());
        for atom in &self.atoms {
            if let (Term::Var(a), Term::Var(b)) = (atom.subject, atom.object) {
                uf.union(index[&a], index[&b]);
            }
        }
        let root = uf.find(0);
        (1..vars.len()).all(|i| uf.find(i) == root)
    }

    /// Content hash over the head and the unordered multiset of body atoms,
    /// so two rules reachable by different operator orderings but denoting
    /// the same logical pattern collide (§9). Built from `DefaultHasher`
    /// over a canonicalized (sorted) representation rather than from
    /// insertion order, so it is stable across threads.
    pub fn alternative_parent_hash(&self) -> u64 {
        let mut body: Vec<Atom> = self.body().to_vec();
        body.sort();
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.head().hash(&mut hasher);
        body.hash(&mut hasher);
        hasher.finish()
    }

    /// Exact structural equality (same head, same body atoms as a set),
    /// used to distinguish genuine duplicates from mere hash collisions
    /// within a dedup bucket.
    pub fn structurally_equal(&self, other: &Rule) -> bool {
        self.head() == other.head() && self.body_set() == other.body_set()
    }

    fn body_set(&self) -> BTreeSet<Atom> {
        self.body().iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(v: u32) -> Term {
        Term::Var(v)
    }
    fn c(v: u32) -> Term {
        Term::Const(v)
    }

    #[test]
    fn seed_rule_is_closed_and_connected_when_head_has_no_vars() {
        let r = Rule::seed(Atom::new(c(1), 10, c(2)));
        assert!(r.is_closed());
        assert!(r.is_connected());
    }

    #[test]
    fn single_atom_body_is_closed_and_connected() {
        let head = Atom::new(var(0), 1, var(1));
        let body = Atom::new(var(0), 2, var(1));
        let r = Rule {
            atoms: vec![head, body],
            ..Rule::seed(head)
        };
        assert!(r.is_closed());
        assert!(r.is_connected());
    }

    #[test]
    fn dangling_atom_breaks_closedness_not_connectedness() {
        let head = Atom::new(var(0), 1, var(1));
        let dangling = Atom::new(var(1), 2, var(2));
        let r = Rule {
            atoms: vec![head, dangling],
            ..Rule::seed(head)
        };
        assert!(!r.is_closed(), "var(2) occurs only once");
        assert!(r.is_connected());
    }

    #[test]
    fn disjoint_atoms_are_not_connected() {
        let head = Atom::new(var(0), 1, var(1));
        let unrelated = Atom::new(var(2), 2, var(3));
        let r = Rule {
            atoms: vec![head, unrelated],
            ..Rule::seed(head)
        };
        assert!(!r.is_connected());
    }

    #[test]
    fn hash_is_stable_under_body_reordering() {
        let head = Atom::new(var(0), 1, var(1));
        let a1 = Atom::new(var(0), 2, var(2));
        let a2 = Atom::new(var(2), 3, var(1));
        let r1 = Rule {
            atoms: vec![head, a1, a2],
            ..Rule::seed(head)
        };
        let r2 = Rule {
            atoms: vec![head, a2, a1],
            ..Rule::seed(head)
        };
        assert_eq!(r1.alternative_parent_hash(), r2.alternative_parent_hash());
        assert!(r1.structurally_equal(&r2));
    }

    #[test]
    fn structurally_unequal_rules_can_still_collide() {
        // Two rules with different atoms are allowed to share a hash bucket;
        // only the bucket scan (not the hash) decides true duplication.
        let head = Atom::new(var(0), 1, var(1));
        let a1 = Atom::new(var(0), 2, var(1));
        let a2 = Atom::new(var(0), 3, var(1));
        let r1 = Rule {
            atoms: vec![head, a1],
            ..Rule::seed(head)
        };
        let r2 = Rule {
            atoms: vec![head, a2],
            ..Rule::seed(head)
        };
        assert!(!r1.structurally_equal(&r2));
    }
}
