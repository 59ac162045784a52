//! The colony-owned work-order collection.
//!
//! The [`WorkManager`] owns every live order of one colony, hands out ids,
//! runs the per-colony-tick validity sweep and lets unclaimed orders look for
//! a builder. Citizens only hold claims; the orders themselves never leave
//! the manager.

use std::collections::{BTreeMap, BTreeSet};

use colony_types::{CitizenId, WorkOrderId, WorkOrderType};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{PersistError, WorkManagerError};
use crate::order::{ColonyContext, Compound, WorkOrder, read_u32};
use crate::registry::WorkOrderRegistry;

const TAG_TOP_ID: &str = "topWorkOrderId";
const TAG_ORDERS: &str = "workOrders";

/// What one colony tick did to the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColonyTickReport {
    /// Orders deleted because they were no longer valid.
    pub removed: Vec<WorkOrderId>,
    /// Orders claimed during the tick and who claimed them.
    pub claimed: Vec<(WorkOrderId, CitizenId)>,
}

/// Colony context that hides builders who already hold a claim.
struct FreeBuilders<'a> {
    inner: &'a dyn ColonyContext,
    busy: BTreeSet<CitizenId>,
}

impl ColonyContext for FreeBuilders<'_> {
    fn structure_exists(&self, structure: &str) -> bool {
        self.inner.structure_exists(structure)
    }

    fn available_builders(&self) -> Vec<CitizenId> {
        self.inner
            .available_builders()
            .into_iter()
            .filter(|citizen| !self.busy.contains(citizen))
            .collect()
    }
}

/// All live work orders of a colony, keyed by id.
#[derive(Debug, Default)]
pub struct WorkManager {
    orders: BTreeMap<WorkOrderId, Box<dyn WorkOrder>>,
    top_id: u32,
}

impl WorkManager {
    /// Create an empty manager.
    pub const fn new() -> Self {
        Self {
            orders: BTreeMap::new(),
            top_id: 0,
        }
    }

    /// Take ownership of `order`, assign it the next id and return the id.
    ///
    /// Ids start at 1 and only grow, so an id is never handed out twice.
    pub fn add_work_order(
        &mut self,
        mut order: Box<dyn WorkOrder>,
    ) -> Result<WorkOrderId, WorkManagerError> {
        let next = self
            .top_id
            .checked_add(1)
            .ok_or(WorkManagerError::IdsExhausted { top: self.top_id })?;
        self.top_id = next;
        let id = WorkOrderId(next);

        let data = order.data_mut();
        data.set_id(id);
        data.mark_changed();
        debug!(order = %id, kind = order.kind(), "work order added");
        self.orders.insert(id, order);
        Ok(id)
    }

    /// Delete an order, returning it.
    pub fn remove_work_order(&mut self, id: WorkOrderId) -> Option<Box<dyn WorkOrder>> {
        self.orders.remove(&id)
    }

    /// Look up an order.
    pub fn get(&self, id: WorkOrderId) -> Option<&dyn WorkOrder> {
        self.orders.get(&id).map(|order| &**order)
    }

    /// Look up an order mutably.
    pub fn get_mut(&mut self, id: WorkOrderId) -> Option<&mut dyn WorkOrder> {
        match self.orders.get_mut(&id) {
            Some(order) => Some(order.as_mut()),
            None => None,
        }
    }

    /// Number of live orders.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether there are no live orders.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Highest id handed out so far.
    pub const fn top_id(&self) -> u32 {
        self.top_id
    }

    /// All orders in id order.
    pub fn iter(&self) -> impl Iterator<Item = &(dyn WorkOrder + 'static)> {
        self.orders.values().map(|order| &**order)
    }

    /// Orders no citizen has claimed, in id order.
    pub fn unclaimed_orders(&self) -> impl Iterator<Item = &(dyn WorkOrder + 'static)> {
        self.iter().filter(|order| !order.is_claimed())
    }

    /// Unclaimed orders of one display type.
    pub fn unclaimed_orders_of(
        &self,
        order_type: WorkOrderType,
    ) -> impl Iterator<Item = &(dyn WorkOrder + 'static)> {
        self.unclaimed_orders()
            .filter(move |order| order.order_type() == order_type)
    }

    /// Orders claimed by `citizen`.
    pub fn orders_claimed_by(
        &self,
        citizen: CitizenId,
    ) -> impl Iterator<Item = &(dyn WorkOrder + 'static)> {
        self.iter().filter(move |order| order.is_claimed_by(citizen))
    }

    /// Release every claim held by `citizen` (e.g. when they die or change
    /// job). Returns how many orders were released.
    pub fn clear_work_for_citizen(&mut self, citizen: CitizenId) -> usize {
        let mut released = 0_usize;
        for order in self.orders.values_mut() {
            if order.is_claimed_by(citizen) {
                order.data_mut().unclaim();
                released = released.saturating_add(1);
            }
        }
        if released > 0 {
            info!(%citizen, released, "released work order claims");
        }
        released
    }

    /// Per-colony-tick maintenance: delete invalid orders, then let each
    /// unclaimed order try to find a builder.
    ///
    /// A builder who already holds a claim is not offered to other orders.
    pub fn on_colony_tick(&mut self, colony: &dyn ColonyContext) -> ColonyTickReport {
        let mut report = ColonyTickReport::default();

        self.orders.retain(|id, order| {
            let keep = order.is_valid(colony);
            if !keep {
                report.removed.push(*id);
            }
            keep
        });
        for id in &report.removed {
            info!(order = %id, "removed invalid work order");
        }

        let mut free = FreeBuilders {
            inner: colony,
            busy: self.orders.values().filter_map(|o| o.claimed_by()).collect(),
        };
        for (id, order) in &mut self.orders {
            if order.is_claimed() {
                continue;
            }
            if let Some(citizen) = order.attempt_to_fulfill(&free) {
                debug!(order = %id, %citizen, "work order claimed");
                free.busy.insert(citizen);
                report.claimed.push((*id, citizen));
            }
        }

        report
    }

    /// Ids of orders whose claim state changed since the last call, clearing
    /// their dirty flags.
    pub fn take_changed(&mut self) -> Vec<WorkOrderId> {
        self.orders
            .iter_mut()
            .filter(|(_, order)| order.has_changed())
            .map(|(id, order)| {
                order.data_mut().reset_change();
                *id
            })
            .collect()
    }

    /// Serialize the whole collection.
    pub fn write_to_compound(
        &self,
        registry: &WorkOrderRegistry,
    ) -> Result<Compound, PersistError> {
        let orders = self
            .iter()
            .map(|order| registry.write_to_compound(order).map(Value::Object))
            .collect::<Result<Vec<_>, _>>()?;

        let mut compound = Compound::new();
        compound.insert(TAG_TOP_ID.into(), Value::from(self.top_id));
        compound.insert(TAG_ORDERS.into(), Value::Array(orders));
        Ok(compound)
    }

    /// Restore a collection. Entries that cannot be restored are dropped;
    /// the top id never ends up below a restored order's id.
    pub fn read_from_compound(registry: &WorkOrderRegistry, compound: &Compound) -> Self {
        let mut manager = Self::new();
        manager.top_id = read_u32(compound, TAG_TOP_ID).ok().flatten().unwrap_or(0);

        let entries = compound
            .get(TAG_ORDERS)
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice);
        let mut unnumbered = Vec::new();
        for entry in entries {
            let Some(order) = entry
                .as_object()
                .and_then(|fields| registry.create_from_compound(fields))
            else {
                continue;
            };
            let id = order.id();
            if id.get() == 0 {
                unnumbered.push(order);
                continue;
            }
            manager.top_id = manager.top_id.max(id.get());
            if manager.orders.insert(id, order).is_some() {
                warn!(order = %id, "duplicate work order id while loading; keeping the later entry");
            }
        }
        // Entries saved without an id are numbered after every stored id.
        for order in unnumbered {
            if let Err(err) = manager.add_work_order(order) {
                warn!(error = %err, "dropping work order saved without an id");
            }
        }

        info!(
            orders = manager.orders.len(),
            top_id = manager.top_id,
            "work orders restored"
        );
        manager
    }
}
