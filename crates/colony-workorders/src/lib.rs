//! Colony work orders: the polymorphic order model, its kind registry,
//! persistence, the client view codec and the colony-owned collection.
//!
//! # Modules
//!
//! - [`error`] -- Registry, persistence, view and manager errors
//! - [`kinds`] -- The standard kinds ([`BuildOrder`], [`DecorationOrder`])
//! - [`manager`] -- The per-colony collection ([`WorkManager`])
//! - [`order`] -- The [`WorkOrder`] trait, shared [`WorkOrderData`] and the
//!   [`ColonyContext`] seam
//! - [`registry`] -- Kind tag to factory map and compound (de)serialization
//! - [`view`] -- Flat binary client view

pub mod error;
pub mod kinds;
pub mod manager;
pub mod order;
pub mod registry;
pub mod view;

pub use error::{LoadError, PersistError, RegistryError, ViewError, WorkManagerError};
pub use kinds::{BUILD_KIND, BuildOrder, DECORATION_KIND, DecorationOrder};
pub use manager::{ColonyTickReport, WorkManager};
pub use order::{ColonyContext, Compound, WorkOrder, WorkOrderData, claim, unclaim};
pub use registry::{Factory, TAG_CLAIMED_BY, TAG_ID, TAG_TYPE, WorkOrderRegistry};
pub use view::{
    MAX_VIEW_STRING_LEN, create_work_order_view, decode_view, encode_view,
    serialize_view_network_data,
};
