//! Shared type definitions for the colony scheduler workspace.
//!
//! Client-facing types derive `ts-rs` so the display layer can consume them
//! as `TypeScript` bindings.
//!
//! # Modules
//!
//! - [`ids`] -- Citizen and work-order ids, request-system tokens
//! - [`enums`] -- Citizen states, work-order types, request states
//! - [`view`] -- Read-only client views

pub mod enums;
pub mod ids;
pub mod view;

// Re-export all public types at crate root for convenience.
pub use enums::{CitizenState, RequestState, WorkOrderType};
pub use ids::{CitizenId, DataStoreToken, ReservedCitizenId, TaskToken, WorkOrderId};
pub use view::WorkOrderView;
