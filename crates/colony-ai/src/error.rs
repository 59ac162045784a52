//! Error types for the colony-ai crate.
//!
//! Predicates and actions are host code. When they fail they return a
//! [`TargetError`]; the driver aborts that agent's tick without committing a
//! state transition and hands the error to the caller.

/// Boxed host error carried by [`TargetError::Host`].
pub type HostError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by a target's predicate or action.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// The behavior could not complete.
    #[error("target failed: {reason}")]
    Failed {
        /// Description of what went wrong.
        reason: String,
    },

    /// A host collaborator (world, inventory, request system) failed.
    #[error("host error: {source}")]
    Host {
        /// The underlying host error.
        source: HostError,
    },
}

impl TargetError {
    /// Build a [`TargetError::Failed`] from any displayable reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Wrap a host error.
    pub fn host(source: impl Into<HostError>) -> Self {
        Self::Host {
            source: source.into(),
        }
    }
}
