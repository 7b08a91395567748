use crate::assistant::Assistant;
use crate::config::{MiningConfig, PruningMetric};
use crate::rule::Rule;
use std::sync::Arc;

/// The count threshold passed into `apply_operators` (§4.3 step 4), derived
/// from whichever metric the config selects.
pub fn count_threshold(candidate: &Rule, assistant: &dyn Assistant, config: &MiningConfig) -> u64 {
    match config.pruning_metric {
        PruningMetric::Support => config.min_support,
        PruningMetric::HeadCoverage => {
            let head = assistant.head_cardinality(candidate) as f64;
            (config.min_head_coverage * head).ceil() as u64
        }
    }
}

/// `c` is refined further iff it isn't already final, isn't a pruned-off
/// perfect rule, and still has depth budget left (§4.3 step 3).
pub fn should_refine(candidate: &Rule, config: &MiningConfig) -> bool {
    !candidate.is_final
        && !(config.perfect_rule_pruning && candidate.is_perfect)
        && candidate.real_length < config.max_depth
}

/// Dangling children are enqueued only if one depth slot remains reserved
/// for a potential closing atom (§4.3 step 4).
pub fn admits_dangling(parent_real_length: usize, config: &MiningConfig) -> bool {
    parent_real_length < config.max_depth.saturating_sub(1)
}

/// `c` is output iff its confidences clear the configured thresholds and,
/// when skyline pruning is enabled, it strictly dominates every
/// already-published parent on at least one confidence. A perfect rule
/// always clears skyline once it clears the thresholds (§4.3 step 2d).
pub fn is_output_eligible(
    candidate: &Rule,
    parents: &[Arc<Rule>],
    config: &MiningConfig,
    assistant: &dyn Assistant,
) -> bool {
    if !assistant.test_confidence_thresholds(candidate) {
        return false;
    }
    if config.perfect_rule_pruning && candidate.is_perfect {
        return true;
    }
    if !config.skyline {
        return true;
    }
    skyline_dominates_all(candidate, parents)
}

fn skyline_dominates_all(candidate: &Rule, parents: &[Arc<Rule>]) -> bool {
    parents.iter().all(|parent| {
        candidate.std_confidence > parent.std_confidence
            || candidate.pca_confidence > parent.pca_confidence
    })
}
