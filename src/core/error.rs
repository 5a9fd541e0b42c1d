//! Error types for scheduler operations.
//!
//! The surface here is deliberately small: task submission never fails (a
//! stopped pool lazy-starts), and failures inside submitted work or tick
//! callbacks are caught at the execution boundary rather than propagated.
//! What remains is construction-time validation.

use thiserror::Error;

/// Errors produced when constructing scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A named ticker in the configuration has no registered callback.
    #[error("no callback registered for ticker `{0}`")]
    MissingCallback(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        let err = SchedulerError::InvalidConfig("worker_count must be greater than 0".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: worker_count must be greater than 0"
        );
        let err = SchedulerError::MissingCallback("heartbeat".into());
        assert_eq!(
            err.to_string(),
            "no callback registered for ticker `heartbeat`"
        );
    }
}
