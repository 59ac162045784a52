//! The work-order abstraction.
//!
//! Every kind shares a [`WorkOrderData`] record (id, claim, priority, dirty
//! flag) and adds its own payload and behavior through the [`WorkOrder`]
//! trait. Claim state is written only by [`WorkOrderData::claim`] and
//! [`WorkOrderData::unclaim`], both of which raise the dirty flag.

use colony_types::{CitizenId, WorkOrderId, WorkOrderType, WorkOrderView};
use serde_json::{Map, Value};

use crate::error::LoadError;

/// Key-value tree used to persist work orders.
pub type Compound = Map<String, Value>;

/// What a work order may ask of the colony that owns it.
pub trait ColonyContext {
    /// Whether the structure identified by `structure` still exists.
    fn structure_exists(&self, structure: &str) -> bool;

    /// Builders able to take on a new order, in preference order.
    fn available_builders(&self) -> Vec<CitizenId>;
}

/// State shared by every work-order kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkOrderData {
    id: WorkOrderId,
    claimed_by: Option<CitizenId>,
    priority: i32,
    changed: bool,
}

impl WorkOrderData {
    /// Create unclaimed data with id 0 (the manager assigns the real id).
    pub const fn new() -> Self {
        Self {
            id: WorkOrderId(0),
            claimed_by: None,
            priority: 0,
            changed: false,
        }
    }

    /// The order's id.
    pub const fn id(&self) -> WorkOrderId {
        self.id
    }

    pub(crate) const fn set_id(&mut self, id: WorkOrderId) {
        self.id = id;
    }

    /// The citizen holding the claim, if any.
    pub const fn claimed_by(&self) -> Option<CitizenId> {
        self.claimed_by
    }

    /// Whether any citizen holds the claim.
    pub const fn is_claimed(&self) -> bool {
        self.claimed_by.is_some()
    }

    /// Whether `citizen` holds the claim.
    pub fn is_claimed_by(&self, citizen: CitizenId) -> bool {
        self.claimed_by == Some(citizen)
    }

    /// Claim the order for `citizen`.
    pub const fn claim(&mut self, citizen: CitizenId) {
        self.claimed_by = Some(citizen);
        self.changed = true;
    }

    /// Release the claim.
    pub const fn unclaim(&mut self) {
        self.claimed_by = None;
        self.changed = true;
    }

    /// Restore the claim during loading without touching the dirty flag.
    pub(crate) const fn restore_claim(&mut self, claimed_by: Option<CitizenId>) {
        self.claimed_by = claimed_by;
    }

    /// Dispatch priority hint.
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Set the dispatch priority hint.
    pub const fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// Whether the claim state changed since the last [`reset_change`](Self::reset_change).
    pub const fn has_changed(&self) -> bool {
        self.changed
    }

    /// Clear the dirty flag once the change has been propagated.
    pub const fn reset_change(&mut self) {
        self.changed = false;
    }

    pub(crate) const fn mark_changed(&mut self) {
        self.changed = true;
    }
}

/// A unit of colony work.
///
/// Kinds implement the payload accessors and behavior; the shared claim
/// accessors are provided.
pub trait WorkOrder: core::fmt::Debug + Send {
    /// Registry tag of this kind (`"build"`, `"decoration"`).
    fn kind(&self) -> &'static str;

    /// Client display category.
    fn order_type(&self) -> WorkOrderType;

    /// Client display text.
    fn value(&self) -> String;

    /// Shared state.
    fn data(&self) -> &WorkOrderData;

    /// Shared state, mutably.
    fn data_mut(&mut self) -> &mut WorkOrderData;

    /// Whether the order should be kept. Invalid orders are deleted by the
    /// colony on its next tick.
    fn is_valid(&self, _colony: &dyn ColonyContext) -> bool {
        true
    }

    /// Look for a citizen to perform the order and claim it for them.
    /// Returns the citizen that claimed it.
    fn attempt_to_fulfill(&mut self, colony: &dyn ColonyContext) -> Option<CitizenId>;

    /// Write kind-specific fields.
    fn write_extra(&self, _compound: &mut Compound) {}

    /// Read kind-specific fields into a blank order.
    fn read_extra(&mut self, _compound: &Compound) -> Result<(), LoadError> {
        Ok(())
    }

    /// The order's id.
    fn id(&self) -> WorkOrderId {
        self.data().id()
    }

    /// The citizen holding the claim, if any.
    fn claimed_by(&self) -> Option<CitizenId> {
        self.data().claimed_by()
    }

    /// Whether any citizen holds the claim.
    fn is_claimed(&self) -> bool {
        self.data().is_claimed()
    }

    /// Whether `citizen` holds the claim.
    fn is_claimed_by(&self, citizen: CitizenId) -> bool {
        self.data().is_claimed_by(citizen)
    }

    /// Dispatch priority hint.
    fn priority(&self) -> i32 {
        self.data().priority()
    }

    /// Whether the claim state changed since the last reset.
    fn has_changed(&self) -> bool {
        self.data().has_changed()
    }

    /// Snapshot for client display.
    fn view(&self) -> WorkOrderView {
        WorkOrderView {
            id: self.id(),
            priority: self.priority(),
            claimed_by: self.claimed_by(),
            order_type: self.order_type(),
            value: self.value(),
        }
    }
}

/// Claim `order` for `citizen`.
pub fn claim(order: &mut dyn WorkOrder, citizen: CitizenId) {
    order.data_mut().claim(citizen);
}

/// Release the claim on `order`.
pub fn unclaim(order: &mut dyn WorkOrder) {
    order.data_mut().unclaim();
}

/// Read a string field.
pub fn read_string(compound: &Compound, field: &'static str) -> Result<String, LoadError> {
    match compound.get(field) {
        None => Err(LoadError::MissingField { field }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(LoadError::InvalidField {
            field,
            reason: format!("expected a string, found {other}"),
        }),
    }
}

/// Read an unsigned 32-bit field; `None` when the field is absent.
pub fn read_u32(compound: &Compound, field: &'static str) -> Result<Option<u32>, LoadError> {
    let Some(value) = compound.get(field) else {
        return Ok(None);
    };
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| LoadError::InvalidField {
            field,
            reason: format!("expected an unsigned 32-bit integer, found {value}"),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn claim_and_unclaim_raise_dirty_flag() {
        let citizen = CitizenId::new(7).unwrap();
        let mut data = WorkOrderData::new();
        assert!(!data.is_claimed());
        assert!(!data.has_changed());

        data.claim(citizen);
        assert!(data.is_claimed_by(citizen));
        assert!(data.has_changed());

        data.reset_change();
        data.unclaim();
        assert!(!data.is_claimed());
        assert!(data.has_changed());
    }

    #[test]
    fn priority_does_not_touch_claim_state() {
        let mut data = WorkOrderData::new();
        data.set_priority(-3);
        assert_eq!(data.priority(), -3);
        assert!(!data.has_changed());
    }

    #[test]
    fn read_u32_rejects_negative_and_accepts_absent() {
        let mut compound = Compound::new();
        assert_eq!(read_u32(&compound, "id").unwrap(), None);
        compound.insert("id".into(), Value::from(-1));
        assert!(matches!(
            read_u32(&compound, "id"),
            Err(LoadError::InvalidField { field: "id", .. })
        ));
        compound.insert("id".into(), Value::from(12));
        assert_eq!(read_u32(&compound, "id").unwrap(), Some(12));
    }

    #[test]
    fn read_string_reports_missing_field() {
        let compound = Compound::new();
        assert_eq!(
            read_string(&compound, "type"),
            Err(LoadError::MissingField { field: "type" })
        );
    }
}
