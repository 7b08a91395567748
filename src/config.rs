use crate::error::MiningError;

/// Which count drives the refinement threshold passed to
/// [`crate::assistant::Assistant::apply_operators`] (§4.3 step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PruningMetric {
    Support,
    HeadCoverage,
}

/// All thresholds and switches enumerated in §6.4, plus the two
/// constant-language-bias knobs implied by §8 scenario 4
/// (`allow_constants`, `enforce_constants`). Mirrors the CLI's flag set
/// (§10.2) and is `serde`-derived so it can also be loaded from a config
/// file on disk.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MiningConfig {
    pub min_support: u64,
    pub min_initial_support: u64,
    pub min_head_coverage: f64,
    pub min_std_confidence: f64,
    pub min_pca_confidence: f64,
    pub max_depth: usize,
    pub pruning_metric: PruningMetric,
    pub n_threads: usize,
    pub real_time: bool,
    pub skyline: bool,
    pub perfect_rule_pruning: bool,
    pub upper_bound_pruning: bool,
    /// If false, any atom with a constant position is shape-ineligible.
    pub allow_constants: bool,
    /// If true, a rule is shape-eligible only when it contains at least
    /// one constant atom.
    pub enforce_constants: bool,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            min_support: 100,
            min_initial_support: 100,
            min_head_coverage: 0.01,
            min_std_confidence: 0.1,
            min_pca_confidence: 0.1,
            max_depth: 3,
            pruning_metric: PruningMetric::Support,
            n_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            real_time: true,
            skyline: true,
            perfect_rule_pruning: true,
            upper_bound_pruning: true,
            allow_constants: true,
            enforce_constants: false,
        }
    }
}

impl MiningConfig {
    /// Rejects a configuration before any thread is spawned (§7
    /// "configuration errors").
    pub fn validate(&self) -> Result<(), MiningError> {
        if self.max_depth < 2 {
            return Err(MiningError::Config(format!(
                "max_depth must be >= 2, got {}",
                self.max_depth
            )));
        }
        if self.n_threads == 0 {
            return Err(MiningError::Config("n_threads must be >= 1".into()));
        }
        if self.min_support == 0 {
            return Err(MiningError::Config(
                "min_support must be >= 1 (0 degenerates the support gate)".into(),
            ));
        }
        for (name, value) in [
            ("min_head_coverage", self.min_head_coverage),
            ("min_std_confidence", self.min_std_confidence),
            ("min_pca_confidence", self.min_pca_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MiningError::Config(format!(
                    "{name} must be within [0.0, 1.0], got {value}"
                )));
            }
        }
        if self.enforce_constants && !self.allow_constants {
            return Err(MiningError::Config(
                "enforce_constants and !allow_constants are contradictory".into(),
            ));
        }
        Ok(())
    }
}
