/// Errors surfaced by the mining engine itself (§7 configuration and
/// invariant-violation classes). Assistant-side failures are reported
/// through [`AssistantError`] and are non-fatal by design — see §7.
#[derive(Debug, thiserror::Error)]
pub enum MiningError {
    #[error("invalid mining configuration: {0}")]
    Config(String),
    #[error("rule sink I/O error: {0}")]
    Sink(#[from] std::io::Error),
}

/// Errors raised by an [`crate::assistant::Assistant`] while answering a
/// single query. Per §7 these are caught by the worker, logged, and treated
/// as "this candidate produced no children" rather than propagated or
/// retried.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("operator application failed: {0}")]
    OperatorFailed(String),
    #[error("knowledge base query failed: {0}")]
    KbUnavailable(String),
}
