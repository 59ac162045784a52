//! Logistics jobs for the colony simulation.
//!
//! A deliveryman works through an ordered queue of request tokens. The
//! queue is stored by the colony's request system; the job holds only the
//! store's token, so request-state changes can rearrange the queue while a
//! job call is in flight.
//!
//! # Modules
//!
//! - [`deliveryman`] -- [`JobDeliveryman`] dispatch operations
//! - [`error`] -- Job restore errors ([`JobError`])
//! - [`queue`] -- The [`TaskQueue`] and its deletion rules
//! - [`request`] -- The [`RequestSystem`] seam and [`StandardRequestSystem`]

pub mod deliveryman;
pub mod error;
pub mod queue;
pub mod request;

pub use deliveryman::{JobDeliveryman, TAG_RS_DATA_STORE};
pub use error::JobError;
pub use queue::TaskQueue;
pub use request::{DataStoreManager, RequestSystem, StandardRequestSystem};
