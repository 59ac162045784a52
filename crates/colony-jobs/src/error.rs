//! Error types for the colony-jobs crate.

/// Errors raised while restoring a job.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// The stored job record could not be parsed.
    #[error("malformed job record: {source}")]
    Malformed {
        /// The underlying parse error.
        #[from]
        source: serde_json::Error,
    },
}
