use crate::assistant::Assistant;
use crate::rule::Candidate;
use std::collections::HashSet;

/// Builds the initial frontier (§4.2): either the caller's target relations
/// or every KB relation meeting `min_initial_support`, dispatched to
/// whichever assistant method applies.
pub fn seed_rules(
    assistant: &dyn Assistant,
    target_relations: Option<&HashSet<u32>>,
    min_initial_support: u64,
) -> Vec<Candidate> {
    match target_relations {
        Some(seeds) => assistant.initial_atoms_from_seeds(seeds, min_initial_support),
        None => assistant.initial_atoms(min_initial_support),
    }
}
