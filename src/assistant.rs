use crate::atom::{Atom, Term};
use crate::config::MiningConfig;
use crate::error::AssistantError;
use crate::kb::MemoryKb;
use crate::rule::{Candidate, ChildMap, Rule, CLOSING, DANGLING};
use crate::triple::Triple;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// The strategy interface the core consumes (§6.1). Any implementation
/// satisfying this contract is interchangeable; the core never queries the
/// KB directly — all KB-touching work happens behind these methods.
pub trait Assistant: Send + Sync {
    fn initial_atoms(&self, min_support: u64) -> Vec<Candidate>;
    fn initial_atoms_from_seeds(&self, seeds: &HashSet<u32>, min_support: u64) -> Vec<Candidate>;
    fn should_output(&self, rule: &Rule) -> bool;
    /// Computes and fills in the cardinalities, applying the support/
    /// head-coverage gate (§4.6). Returns whether emission remains
    /// possible at all.
    fn compute_confidence_bounds(&self, rule: &mut Rule) -> bool;
    fn compute_confidence_metrics(&self, rule: &mut Rule);
    fn test_confidence_thresholds(&self, rule: &Rule) -> bool;
    fn set_additional_parents(&self, rule: &mut Rule, parents: &[Arc<Rule>]);
    fn apply_operators(&self, rule: &Rule, count_threshold: u64) -> Result<ChildMap, AssistantError>;
    fn head_cardinality(&self, rule: &Rule) -> u64;
    fn is_perfect_rules_enabled(&self) -> bool;
    fn max_depth(&self) -> usize;
    fn verbose(&self) -> bool;
    fn format(&self, rule: &Rule) -> String;
    fn header(&self) -> String;
}

/// A binding of rule-local variable ids to KB constants.
type Binding = HashMap<u32, u32>;

/// The default, in-process assistant (§10.4): a compact AMIE-style operator
/// set (dangling, closing, instantiated atoms) over [`MemoryKb`], used by
/// the test suite and by the `miner` CLI's demonstration mode. A
/// production assistant talking to a real KB is explicitly out of scope
/// (§1) — this exists only so the core has something to mine against.
pub struct DefaultAssistant {
    kb: MemoryKb,
    config: MiningConfig,
    /// Relations excluded from `real_length` (§3): rdf:type-like atoms are
    /// free to add without consuming depth budget.
    type_relations: HashSet<u32>,
}

impl DefaultAssistant {
    pub fn new(kb: MemoryKb, config: MiningConfig) -> Self {
        Self {
            kb,
            config,
            type_relations: HashSet::new(),
        }
    }

    pub fn with_type_relations(mut self, type_relations: impl IntoIterator<Item = u32>) -> Self {
        self.type_relations = type_relations.into_iter().collect();
        self
    }

    /// Builds a length-1 seed candidate for `predicate`, pre-populating its
    /// cardinalities with the relation's size (§4.2): a seed's support,
    /// head, and body cardinalities all equal the number of triples under
    /// that relation, since the seed's body is the head atom itself.
    fn seed_for_relation(&self, predicate: u32) -> Candidate {
        let mut rule = Rule::seed(Atom::new(Term::Var(0), predicate, Term::Var(1)));
        let size = self.kb.relation_size(predicate);
        rule.support_cardinality = size;
        rule.head_cardinality = size;
        rule.body_cardinality = size;
        rule
    }

    fn join(&self, atoms: &[Atom]) -> Vec<Binding> {
        let mut bindings = vec![Binding::new()];
        for atom in atoms {
            let candidates = self.kb.triples_for(atom.predicate);
            let mut next = Vec::new();
            for binding in &bindings {
                for triple in candidates {
                    if let Some(extended) = try_extend(atom, triple, binding) {
                        next.push(extended);
                    }
                }
            }
            bindings = next;
            if bindings.is_empty() {
                break;
            }
        }
        bindings
    }

    fn head_values(head: &Atom, binding: &Binding) -> (u32, u32) {
        let value = |term: &Term| match term {
            Term::Const(c) => *c,
            Term::Var(v) => binding[v],
        };
        (value(&head.subject), value(&head.object))
    }

    /// `(support, head_cardinality, body_cardinality)` for `rule`.
    fn cardinalities(&self, rule: &Rule) -> (u64, u64, u64) {
        let head = rule.head();
        let head_cardinality = self.join(std::slice::from_ref(head)).len() as u64;
        if rule.body().is_empty() {
            return (head_cardinality, head_cardinality, head_cardinality);
        }
        let support = self
            .join(&rule.atoms)
            .iter()
            .map(|b| Self::head_values(head, b))
            .collect::<HashSet<_>>()
            .len() as u64;
        let body_cardinality = self
            .join(rule.body())
            .iter()
            .filter_map(|b| head_values_if_bound(head, b))
            .collect::<HashSet<_>>()
            .len() as u64;
        (support, head_cardinality, body_cardinality)
    }

    /// PCA confidence denominator: body bindings whose subject already has
    /// *some* known object under the head relation (the partial
    /// completeness assumption).
    fn pca_body_cardinality(&self, rule: &Rule) -> u64 {
        let head = rule.head();
        if rule.body().is_empty() {
            return self.join(std::slice::from_ref(head)).len() as u64;
        }
        let active_subjects = self.kb.subjects_with_relation(head.predicate);
        self.join(rule.body())
            .iter()
            .filter_map(|b| head_values_if_bound(head, b))
            .filter(|(s, _)| active_subjects.contains(s))
            .collect::<HashSet<_>>()
            .len() as u64
    }

    fn next_var(rule: &Rule) -> u32 {
        rule.variables().last().map(|v| v + 1).unwrap_or(0)
    }

    fn dangling_children(&self, rule: &Rule, parent: &Arc<Rule>, threshold: u64) -> Vec<Candidate> {
        let fresh = Self::next_var(rule);
        let mut children = Vec::new();
        for &v in &rule.variables() {
            for predicate in self.kb.relations() {
                for atom in [
                    Atom::new(Term::Var(v), predicate, Term::Var(fresh)),
                    Atom::new(Term::Var(fresh), predicate, Term::Var(v)),
                ] {
                    self.push_if_significant(rule, atom, parent, threshold, &mut children);
                }
            }
        }
        children
    }

    fn closing_children(&self, rule: &Rule, parent: &Arc<Rule>, threshold: u64) -> Vec<Candidate> {
        let vars: Vec<u32> = rule.variables().into_iter().collect();
        let mut children = Vec::new();
        for i in 0..vars.len() {
            for j in 0..vars.len() {
                if i == j {
                    continue;
                }
                for predicate in self.kb.relations() {
                    let atom = Atom::new(Term::Var(vars[i]), predicate, Term::Var(vars[j]));
                    if rule.atoms.contains(&atom) {
                        continue;
                    }
                    self.push_if_significant(rule, atom, parent, threshold, &mut children);
                }
            }
        }
        children
    }

    fn instantiated_children(&self, rule: &Rule, parent: &Arc<Rule>, threshold: u64) -> Vec<Candidate> {
        let mut children = Vec::new();
        for &v in &rule.variables() {
            for predicate in self.kb.relations() {
                for &k in &self.kb.constants() {
                    for atom in [
                        Atom::new(Term::Var(v), predicate, Term::Const(k)),
                        Atom::new(Term::Const(k), predicate, Term::Var(v)),
                    ] {
                        if rule.atoms.contains(&atom) {
                            continue;
                        }
                        self.push_if_significant(rule, atom, parent, threshold, &mut children);
                    }
                }
            }
        }
        children
    }

    fn push_if_significant(
        &self,
        rule: &Rule,
        atom: Atom,
        parent: &Arc<Rule>,
        threshold: u64,
        out: &mut Vec<Candidate>,
    ) {
        let counts_toward_depth = !self.type_relations.contains(&atom.predicate);
        let child = rule.refine(atom, counts_toward_depth, parent.clone());
        let (support, ..) = self.cardinalities(&child);
        if support >= threshold {
            out.push(child);
        }
    }
}

fn try_extend(atom: &Atom, triple: &Triple, binding: &Binding) -> Option<Binding> {
    if triple.predicate != atom.predicate {
        return None;
    }
    let mut next = binding.clone();
    if !bind_term(&atom.subject, triple.subject, &mut next) {
        return None;
    }
    if !bind_term(&atom.object, triple.object, &mut next) {
        return None;
    }
    Some(next)
}

fn bind_term(term: &Term, value: u32, binding: &mut Binding) -> bool {
    match term {
        Term::Const(c) => *c == value,
        Term::Var(v) => match binding.get(v) {
            Some(&bound) => bound == value,
            None => {
                binding.insert(*v, value);
                true
            }
        },
    }
}

fn head_values_if_bound(head: &Atom, binding: &Binding) -> Option<(u32, u32)> {
    let value = |term: &Term| match term {
        Term::Const(c) => Some(*c),
        Term::Var(v) => binding.get(v).copied(),
    };
    Some((value(&head.subject)?, value(&head.object)?))
}

impl Assistant for DefaultAssistant {
    fn initial_atoms(&self, min_support: u64) -> Vec<Candidate> {
        self.kb
            .relations()
            .filter(|&r| self.kb.relation_size(r) >= min_support)
            .map(|r| self.seed_for_relation(r))
            .collect()
    }

    fn initial_atoms_from_seeds(&self, seeds: &HashSet<u32>, min_support: u64) -> Vec<Candidate> {
        seeds
            .iter()
            .copied()
            .filter(|&r| self.kb.relation_size(r) >= min_support)
            .map(|r| self.seed_for_relation(r))
            .collect()
    }

    fn should_output(&self, rule: &Rule) -> bool {
        if !rule.is_connected() || !rule.is_closed() {
            return false;
        }
        let has_constant = rule.atoms.iter().any(Atom::has_constant);
        if !self.config.allow_constants && has_constant {
            return false;
        }
        if self.config.enforce_constants && !has_constant {
            return false;
        }
        true
    }

    fn compute_confidence_bounds(&self, rule: &mut Rule) -> bool {
        let (support, head, body) = self.cardinalities(rule);
        rule.support_cardinality = support;
        rule.head_cardinality = head;
        rule.body_cardinality = body;
        if support < self.config.min_support {
            return false;
        }
        let head_coverage = if head > 0 {
            support as f64 / head as f64
        } else {
            0.0
        };
        if head_coverage < self.config.min_head_coverage {
            return false;
        }
        let reachable = body > 0;
        rule.std_confidence_upper_bound = if reachable { 1.0 } else { 0.0 };
        rule.pca_confidence_upper_bound = if reachable { 1.0 } else { 0.0 };
        !self.config.upper_bound_pruning || reachable
    }

    fn compute_confidence_metrics(&self, rule: &mut Rule) {
        rule.std_confidence = if rule.body_cardinality > 0 {
            rule.support_cardinality as f64 / rule.body_cardinality as f64
        } else {
            0.0
        };
        let pca_body = self.pca_body_cardinality(rule).max(rule.support_cardinality);
        rule.pca_confidence = if pca_body > 0 {
            rule.support_cardinality as f64 / pca_body as f64
        } else {
            0.0
        };
        rule.is_perfect =
            rule.std_confidence >= 1.0 - f64::EPSILON && rule.support_cardinality >= rule.head_cardinality;
        // Specialization only ever filters existing bindings, so once every
        // body binding already satisfies the head (std_confidence == 1.0),
        // no further atom can raise it: the rule cannot be improved (§3, §8).
        rule.is_final = rule.body_cardinality > 0 && rule.support_cardinality >= rule.body_cardinality;
    }

    fn test_confidence_thresholds(&self, rule: &Rule) -> bool {
        rule.std_confidence >= self.config.min_std_confidence
            && rule.pca_confidence >= self.config.min_pca_confidence
    }

    fn set_additional_parents(&self, rule: &mut Rule, parents: &[Arc<Rule>]) {
        for parent in parents {
            if !rule.parent_rules.iter().any(|p| Arc::ptr_eq(p, parent)) {
                rule.parent_rules.push(parent.clone());
            }
        }
    }

    fn apply_operators(&self, rule: &Rule, count_threshold: u64) -> Result<ChildMap, AssistantError> {
        if rule.is_final {
            return Ok(ChildMap::new());
        }
        let parent = Arc::new(rule.clone());
        let mut map = ChildMap::new();
        map.insert(
            DANGLING.to_string(),
            self.dangling_children(rule, &parent, count_threshold),
        );
        let mut closing = self.closing_children(rule, &parent, count_threshold);
        closing.extend(self.instantiated_children(rule, &parent, count_threshold));
        map.insert(CLOSING.to_string(), closing);
        Ok(map)
    }

    fn head_cardinality(&self, rule: &Rule) -> u64 {
        self.join(std::slice::from_ref(rule.head())).len() as u64
    }

    fn is_perfect_rules_enabled(&self) -> bool {
        self.config.perfect_rule_pruning
    }

    fn max_depth(&self) -> usize {
        self.config.max_depth
    }

    fn verbose(&self) -> bool {
        false
    }

    fn format(&self, rule: &Rule) -> String {
        let atom_str = |a: &Atom| {
            let term = |t: &Term| match t {
                Term::Var(v) => format!("?{v}"),
                Term::Const(c) => format!("{c}"),
            };
            format!("r{}({}, {})", a.predicate, term(&a.subject), term(&a.object))
        };
        let body = rule
            .body()
            .iter()
            .map(atom_str)
            .collect::<Vec<_>>()
            .join(" \u{2227} ");
        format!(
            "{}  =>  {}\tsupport={}\tstd_conf={:.4}\tpca_conf={:.4}",
            body,
            atom_str(rule.head()),
            rule.support_cardinality,
            rule.std_confidence,
            rule.pca_confidence,
        )
    }

    fn header(&self) -> String {
        "Rule\tSupport\tStdConfidence\tPcaConfidence".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb_livesin_bornin() -> MemoryKb {
        MemoryKb::new(vec![Triple::new(1, 100, 2), Triple::new(1, 200, 2)])
    }

    #[test]
    fn seeds_only_include_relations_meeting_initial_support() {
        let kb = kb_livesin_bornin();
        let assistant = DefaultAssistant::new(kb, MiningConfig::default());
        let seeds = assistant.initial_atoms(1);
        assert_eq!(seeds.len(), 2);
        for s in &seeds {
            // Each relation has exactly one triple, so a seed's cardinalities
            // all equal the relation's size (§4.2).
            assert_eq!(s.support_cardinality, 1);
            assert_eq!(s.head_cardinality, 1);
            assert_eq!(s.body_cardinality, 1);
        }
    }

    #[test]
    fn seeds_above_initial_support_threshold_are_excluded() {
        let kb = kb_livesin_bornin();
        let assistant = DefaultAssistant::new(kb, MiningConfig::default());
        assert!(assistant.initial_atoms(2).is_empty());
    }

    #[test]
    fn exact_equivalence_scenario_has_full_confidence() {
        // bornIn(s,o) => livesIn(s,o), identical pairs: support == body ==
        // head, both confidences == 1.0 (§8 scenario 1).
        let kb = kb_livesin_bornin();
        let config = MiningConfig {
            min_support: 1,
            min_head_coverage: 1.0,
            ..MiningConfig::default()
        };
        let assistant = DefaultAssistant::new(kb, config);
        let head = Atom::new(Term::Var(0), 200, Term::Var(1)); // livesIn
        let body = Atom::new(Term::Var(0), 100, Term::Var(1)); // bornIn
        let mut rule = Rule {
            atoms: vec![head, body],
            ..Rule::seed(head)
        };
        assert!(assistant.compute_confidence_bounds(&mut rule));
        assistant.compute_confidence_metrics(&mut rule);
        assert_eq!(rule.support_cardinality, 1);
        assert_eq!(rule.std_confidence, 1.0);
        assert_eq!(rule.pca_confidence, 1.0);
        assert!(rule.is_perfect);
        assert!(rule.is_final);
    }

    #[test]
    fn final_rule_yields_no_children_from_apply_operators() {
        // Same exact-equivalence shape as above: support == body_cardinality,
        // so the rule is final and refinement must be idempotent (§8).
        let kb = kb_livesin_bornin();
        let assistant = DefaultAssistant::new(kb, MiningConfig::default());
        let head = Atom::new(Term::Var(0), 200, Term::Var(1)); // livesIn
        let body = Atom::new(Term::Var(0), 100, Term::Var(1)); // bornIn
        let mut rule = Rule {
            atoms: vec![head, body],
            ..Rule::seed(head)
        };
        assistant.compute_confidence_bounds(&mut rule);
        assistant.compute_confidence_metrics(&mut rule);
        assert!(rule.is_final);

        let children = assistant.apply_operators(&rule, 1).unwrap();
        assert!(children.values().all(Vec::is_empty));
    }

    #[test]
    fn insufficient_support_fails_bounds() {
        let kb = kb_livesin_bornin();
        let config = MiningConfig {
            min_support: 5,
            ..MiningConfig::default()
        };
        let assistant = DefaultAssistant::new(kb, config);
        let head = Atom::new(Term::Var(0), 200, Term::Var(1));
        let body = Atom::new(Term::Var(0), 100, Term::Var(1));
        let mut rule = Rule {
            atoms: vec![head, body],
            ..Rule::seed(head)
        };
        assert!(!assistant.compute_confidence_bounds(&mut rule));
    }

    #[test]
    fn apply_operators_respects_count_threshold() {
        let kb = kb_livesin_bornin();
        let assistant = DefaultAssistant::new(kb, MiningConfig::default());
        let head = Atom::new(Term::Var(0), 200, Term::Var(1));
        let rule = Rule::seed(head);
        let children = assistant.apply_operators(&rule, 1).unwrap();
        assert!(children.contains_key(DANGLING));
        assert!(children.contains_key(CLOSING));
        // With threshold above the KB's total triple count, nothing survives.
        let none = assistant.apply_operators(&rule, 1000).unwrap();
        assert!(none.values().all(Vec::is_empty));
    }

    #[test]
    fn should_output_respects_constant_bias() {
        let kb = MemoryKb::new(vec![Triple::new(1, 900, 2)]);
        let type_atom = Atom::new(Term::Var(0), 900, Term::Const(2));
        let closed_rule = Rule {
            atoms: vec![type_atom, Atom::new(Term::Var(0), 100, Term::Var(0))],
            ..Rule::seed(type_atom)
        };

        let disallowing = DefaultAssistant::new(
            MemoryKb::new(kb.all_triples().to_vec()),
            MiningConfig {
                allow_constants: false,
                ..MiningConfig::default()
            },
        );
        assert!(!disallowing.should_output(&closed_rule));

        let enforcing = DefaultAssistant::new(
            MemoryKb::new(kb.all_triples().to_vec()),
            MiningConfig {
                enforce_constants: true,
                ..MiningConfig::default()
            },
        );
        assert!(enforcing.should_output(&closed_rule));
    }
}
