//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these. Missing configuration is
//! handled before wiring (fatal bail in main, before any remote call).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Unrecoverable Slack API failure. Propagates and aborts the run;
    /// transient cases (thread_not_found) are absorbed inside the adapter.
    #[error("Slack gateway error: {0}")]
    SlackGateway(String),

    /// Classification model failure. Recovered per chunk by the rule-based
    /// fallback, never fatal.
    #[error("Classification model error: {0}")]
    Model(String),

    /// Export failure. Reported and swallowed at the orchestration layer;
    /// the digest on disk stays valid.
    #[error("Export error: {0}")]
    Export(String),
}
