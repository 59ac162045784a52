//! Kind registry and persistence of work orders.
//!
//! The registry maps a kind tag to a factory producing a blank order. It is
//! filled once at startup; [`WorkOrderRegistry::global`] holds the standard
//! kinds. Loading looks up the stored tag, builds a blank order and lets it
//! read its own fields.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use colony_types::{CitizenId, WorkOrderId};
use serde_json::Value;
use tracing::{error, warn};

use crate::error::{LoadError, PersistError, RegistryError};
use crate::kinds::{BUILD_KIND, BuildOrder, DECORATION_KIND, DecorationOrder};
use crate::order::{Compound, WorkOrder, read_string, read_u32};

/// Persistence key of the kind tag.
pub const TAG_TYPE: &str = "type";
/// Persistence key of the order id.
pub const TAG_ID: &str = "id";
/// Persistence key of the claiming citizen; absent when unclaimed.
pub const TAG_CLAIMED_BY: &str = "claimedBy";

/// Builds a blank order of one kind.
pub type Factory = fn() -> Box<dyn WorkOrder>;

static GLOBAL: LazyLock<WorkOrderRegistry> = LazyLock::new(|| {
    WorkOrderRegistry::standard().unwrap_or_else(|err| {
        error!(error = %err, "standard work order kinds failed to register");
        WorkOrderRegistry::new()
    })
});

fn blank_build() -> Box<dyn WorkOrder> {
    Box::new(BuildOrder::default())
}

fn blank_decoration() -> Box<dyn WorkOrder> {
    Box::new(DecorationOrder::default())
}

/// Kind tag to factory map.
#[derive(Debug, Default)]
pub struct WorkOrderRegistry {
    factories: BTreeMap<String, Factory>,
}

impl WorkOrderRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Create a registry holding the `"build"` and `"decoration"` kinds.
    pub fn standard() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(BUILD_KIND, blank_build)?;
        registry.register(DECORATION_KIND, blank_decoration)?;
        Ok(registry)
    }

    /// The process-wide registry of standard kinds, built on first use.
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Register `factory` under `kind`.
    ///
    /// Fails if the tag is taken or if the factory's blank order reports a
    /// different tag.
    pub fn register(&mut self, kind: &str, factory: Factory) -> Result<(), RegistryError> {
        if self.factories.contains_key(kind) {
            return Err(RegistryError::DuplicateKind {
                kind: kind.to_owned(),
            });
        }
        let reported = factory().kind();
        if reported != kind {
            return Err(RegistryError::KindMismatch {
                kind: kind.to_owned(),
                reported: reported.to_owned(),
            });
        }
        self.factories.insert(kind.to_owned(), factory);
        Ok(())
    }

    /// Whether `kind` is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kind tags in sorted order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build a blank order of `kind`.
    pub fn create_blank(&self, kind: &str) -> Option<Box<dyn WorkOrder>> {
        self.factories.get(kind).map(|factory| factory())
    }

    /// Serialize `order` to a compound.
    ///
    /// Writes `type`, `id`, `claimedBy` (only when claimed) and the kind's
    /// own fields.
    pub fn write_to_compound(&self, order: &dyn WorkOrder) -> Result<Compound, PersistError> {
        let kind = order.kind();
        if !self.contains(kind) {
            return Err(PersistError::Unregistered {
                id: order.id(),
                kind: kind.to_owned(),
            });
        }

        let mut compound = Compound::new();
        compound.insert(TAG_TYPE.into(), Value::from(kind));
        compound.insert(TAG_ID.into(), Value::from(order.id().get()));
        if let Some(citizen) = order.claimed_by() {
            compound.insert(TAG_CLAIMED_BY.into(), Value::from(citizen.get()));
        }
        order.write_extra(&mut compound);
        Ok(compound)
    }

    /// Deserialize one order, reporting why it could not be restored.
    ///
    /// A missing `id` reads as 0, which no issued order carries; the
    /// [`crate::WorkManager`] gives such orders a fresh id on load.
    pub fn load(&self, compound: &Compound) -> Result<Box<dyn WorkOrder>, LoadError> {
        let kind = read_string(compound, TAG_TYPE)?;
        let mut order = self
            .create_blank(&kind)
            .ok_or(LoadError::UnknownKind { kind })?;

        let id = read_u32(compound, TAG_ID)?.unwrap_or(0);
        let claimed_by = CitizenId::new(read_u32(compound, TAG_CLAIMED_BY)?.unwrap_or(0));

        order.read_extra(compound)?;
        let data = order.data_mut();
        data.set_id(WorkOrderId(id));
        data.restore_claim(claimed_by);
        Ok(order)
    }

    /// Deserialize one order, or `None` if it cannot be restored.
    ///
    /// Unknown kinds are logged as warnings, malformed entries of a known
    /// kind as errors.
    pub fn create_from_compound(&self, compound: &Compound) -> Option<Box<dyn WorkOrder>> {
        match self.load(compound) {
            Ok(order) => Some(order),
            Err(err @ LoadError::UnknownKind { .. }) => {
                warn!(error = %err, "skipping work order of unknown kind");
                None
            }
            Err(err) => {
                let kind = compound.get(TAG_TYPE).and_then(Value::as_str).unwrap_or("?");
                error!(kind, error = %err, "work order could not be restored");
                None
            }
        }
    }
}
