//! Read-only client views.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::WorkOrderType;
use crate::ids::{CitizenId, WorkOrderId};

/// Client-side snapshot of a work order, as decoded from the network view.
///
/// Clients never mutate work orders; they display this view and send
/// commands back to the colony instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorkOrderView {
    /// Colony-scoped id of the order.
    #[ts(type = "number")]
    pub id: WorkOrderId,
    /// Advisory dispatch priority.
    pub priority: i32,
    /// Citizen working on the order, if any.
    #[ts(type = "number | null")]
    pub claimed_by: Option<CitizenId>,
    /// Display category.
    pub order_type: WorkOrderType,
    /// Human-readable description (e.g. structure name and level).
    pub value: String,
}

impl WorkOrderView {
    /// Whether a citizen has claimed the order.
    pub const fn is_claimed(&self) -> bool {
        self.claimed_by.is_some()
    }
}
