//! The request-system boundary seen by dispatch jobs.
//!
//! Jobs never own their task queue. The queue lives in a data store owned by
//! the colony's request system and the job keeps only the store's token.
//! Changing a request's state may call back into the queue (a cancelled
//! request is pulled out of whatever queue holds it), so callers must not
//! assume the queue is unchanged across [`RequestSystem::update_request_state`].

use std::collections::BTreeMap;

use colony_types::{DataStoreToken, RequestState, TaskToken};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::JobError;
use crate::queue::TaskQueue;

/// What a dispatch job needs from the colony's request system.
pub trait RequestSystem {
    /// Allocate a fresh, empty delivery data store.
    fn create_delivery_store(&mut self) -> DataStoreToken;

    /// The queue stored under `token`, if it exists.
    fn delivery_store(&self, token: DataStoreToken) -> Option<&TaskQueue>;

    /// The queue stored under `token`, created empty if missing.
    fn delivery_store_mut(&mut self, token: DataStoreToken) -> &mut TaskQueue;

    /// Move a request to `state`.
    fn update_request_state(&mut self, token: TaskToken, state: RequestState);
}

/// Owns the delivery data stores of one colony.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataStoreManager {
    stores: BTreeMap<DataStoreToken, TaskQueue>,
}

impl DataStoreManager {
    /// Create an empty manager.
    pub const fn new() -> Self {
        Self {
            stores: BTreeMap::new(),
        }
    }

    /// Allocate a new empty store.
    pub fn create(&mut self) -> DataStoreToken {
        let token = DataStoreToken::new();
        self.stores.insert(token, TaskQueue::new());
        token
    }

    /// Look up a store.
    pub fn get(&self, token: DataStoreToken) -> Option<&TaskQueue> {
        self.stores.get(&token)
    }

    /// Look up a store, creating it empty if missing.
    pub fn get_or_create(&mut self, token: DataStoreToken) -> &mut TaskQueue {
        self.stores.entry(token).or_default()
    }

    /// Drop a store, e.g. when its job is removed.
    pub fn remove(&mut self, token: DataStoreToken) -> Option<TaskQueue> {
        self.stores.remove(&token)
    }

    /// Number of stores.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Whether no store exists.
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = (&DataStoreToken, &mut TaskQueue)> {
        self.stores.iter_mut()
    }
}

/// In-memory request system.
///
/// Tracks each request's state and owns the delivery data stores. Cancelling
/// a request removes it from the queue holding it under the task-deletion
/// rules of [`TaskQueue::on_task_deletion`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardRequestSystem {
    #[serde(rename = "requests", default)]
    states: BTreeMap<TaskToken, RequestState>,
    #[serde(rename = "dataStores", default)]
    stores: DataStoreManager,
}

impl StandardRequestSystem {
    /// Create an empty request system.
    pub const fn new() -> Self {
        Self {
            states: BTreeMap::new(),
            stores: DataStoreManager::new(),
        }
    }

    /// Open a new request in the `Created` state.
    pub fn create_request(&mut self) -> TaskToken {
        let token = TaskToken::new();
        self.states.insert(token, RequestState::Created);
        token
    }

    /// Current state of a request.
    pub fn request_state(&self, token: TaskToken) -> Option<RequestState> {
        self.states.get(&token).copied()
    }

    /// Requests not yet in a terminal state.
    pub fn open_requests(&self) -> impl Iterator<Item = TaskToken> + '_ {
        self.states
            .iter()
            .filter(|(_, state)| !state.is_terminal())
            .map(|(token, _)| *token)
    }

    /// The data stores.
    pub const fn data_stores(&self) -> &DataStoreManager {
        &self.stores
    }

    /// The data stores, mutably.
    pub const fn data_stores_mut(&mut self) -> &mut DataStoreManager {
        &mut self.stores
    }

    /// Serialize every request state and delivery store, queue contents and
    /// returning flags included.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Restore a request system written by [`to_value`](Self::to_value).
    pub fn from_value(value: Value) -> Result<Self, JobError> {
        let restored: Self = serde_json::from_value(value)?;
        debug!(
            requests = restored.states.len(),
            stores = restored.stores.len(),
            "request system restored"
        );
        Ok(restored)
    }
}

impl RequestSystem for StandardRequestSystem {
    fn create_delivery_store(&mut self) -> DataStoreToken {
        self.stores.create()
    }

    fn delivery_store(&self, token: DataStoreToken) -> Option<&TaskQueue> {
        self.stores.get(token)
    }

    fn delivery_store_mut(&mut self, token: DataStoreToken) -> &mut TaskQueue {
        self.stores.get_or_create(token)
    }

    fn update_request_state(&mut self, token: TaskToken, state: RequestState) {
        let previous = self.states.insert(token, state);
        debug!(request = %token, ?previous, ?state, "request state updated");

        if state == RequestState::Cancelled {
            for (store, queue) in self.stores.iter_mut() {
                if queue.on_task_deletion(token) {
                    info!(request = %token, %store, "cancelled request removed from delivery queue");
                }
            }
        }
    }
}
