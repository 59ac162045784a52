//! The AI state space and the state matcher used by targets.

/// Marker for types usable as AI states.
///
/// Any small copyable enum works; the engine uses
/// `colony_types::CitizenState`.
pub trait AiState: Copy + Eq + core::fmt::Debug + 'static {}

impl<T> AiState for T where T: Copy + Eq + core::fmt::Debug + 'static {}

/// The state a target requires before it is considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetState<S> {
    /// Wildcard: eligible whatever the current state is. Used for
    /// interrupts (hunger, sleep) that must preempt normal work, so such
    /// targets usually sit at the front of the table.
    BlockingPriority,
    /// Eligible only while the agent is in exactly this state.
    State(S),
}

impl<S: AiState> TargetState<S> {
    /// Whether a target with this requirement may run in `current`.
    pub fn matches(self, current: S) -> bool {
        match self {
            Self::BlockingPriority => true,
            Self::State(required) => required == current,
        }
    }

    /// Whether this is the wildcard requirement.
    pub const fn is_blocking_priority(self) -> bool {
        matches!(self, Self::BlockingPriority)
    }
}

impl<S> From<S> for TargetState<S> {
    fn from(state: S) -> Self {
        Self::State(state)
    }
}
