//! Enumeration types shared by the scheduler, work orders and dispatch jobs.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Citizen behavior states
// ---------------------------------------------------------------------------

/// Behavior states a citizen AI can occupy.
///
/// This is the state space used by the engine's citizens. The scheduler
/// itself is generic and accepts any `Copy + Eq` state type; the wildcard
/// "blocking priority" match lives in the target model, not here, so it can
/// never become a citizen's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum CitizenState {
    /// Freshly spawned; the AI has not picked a job routine yet.
    Init,
    /// Nothing to do.
    Idle,
    /// Entry state of the job routine.
    StartWorking,
    /// Eating at a restaurant or from the inventory.
    Eating,
    /// Sleeping at home.
    Sleeping,
    /// Working on a claimed build order.
    Building,
    /// Picking up the items of the current delivery task.
    PrepareDelivery,
    /// Carrying the current delivery to its target.
    Delivery,
    /// Heading back to the warehouse to unload and reset.
    Dumping,
}

// ---------------------------------------------------------------------------
// Work orders
// ---------------------------------------------------------------------------

/// Display category of a work order, sent to clients as an ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum WorkOrderType {
    /// Build or upgrade a structure.
    Build,
    /// Place a decoration schematic.
    Decoration,
}

impl WorkOrderType {
    /// All variants in ordinal order.
    pub const ALL: [Self; 2] = [Self::Build, Self::Decoration];

    /// Return the wire ordinal of this type.
    pub const fn ordinal(self) -> u32 {
        match self {
            Self::Build => 0,
            Self::Decoration => 1,
        }
    }

    /// Look up a type by its wire ordinal.
    pub const fn from_ordinal(ordinal: u32) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Build),
            1 => Some(Self::Decoration),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Request system
// ---------------------------------------------------------------------------

/// Lifecycle state of a request in the colony's request system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum RequestState {
    /// Created but not yet assigned to a resolver.
    Created,
    /// Assigned to a resolver (e.g. queued on a deliveryman).
    Assigned,
    /// Actively being worked on.
    InProgress,
    /// Fulfilled successfully.
    Resolved,
    /// Abandoned; the requester must re-request.
    Cancelled,
}

impl RequestState {
    /// Whether the request has reached a final state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Cancelled)
    }
}
