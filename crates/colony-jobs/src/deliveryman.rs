//! The deliveryman job: pipelines delivery requests through a task queue.
//!
//! The job keeps only a [`DataStoreToken`]; the queue itself is owned by the
//! colony's [`RequestSystem`] and reached through it on every call.

use colony_types::{CitizenId, DataStoreToken, RequestState, TaskToken};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::JobError;
use crate::queue::TaskQueue;
use crate::request::RequestSystem;

/// Persistence key of the data-store token.
pub const TAG_RS_DATA_STORE: &str = "rsDataStore";

#[derive(Serialize, Deserialize)]
struct StoredJob {
    citizen: CitizenId,
    #[serde(rename = "rsDataStore", default, skip_serializing_if = "Option::is_none")]
    data_store: Option<DataStoreToken>,
}

/// A citizen's deliveryman job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDeliveryman {
    citizen: CitizenId,
    data_store: DataStoreToken,
}

impl JobDeliveryman {
    /// Give `citizen` the job, allocating a fresh delivery store.
    pub fn new(citizen: CitizenId, rs: &mut dyn RequestSystem) -> Self {
        let data_store = rs.create_delivery_store();
        debug!(%citizen, store = %data_store, "deliveryman job created");
        Self {
            citizen,
            data_store,
        }
    }

    /// The citizen holding the job.
    pub const fn citizen(&self) -> CitizenId {
        self.citizen
    }

    /// Token of the job's delivery store.
    pub const fn data_store_token(&self) -> DataStoreToken {
        self.data_store
    }

    fn queue<'a>(&self, rs: &'a dyn RequestSystem) -> Option<&'a TaskQueue> {
        rs.delivery_store(self.data_store)
    }

    fn queue_mut<'a>(&self, rs: &'a mut dyn RequestSystem) -> &'a mut TaskQueue {
        rs.delivery_store_mut(self.data_store)
    }

    /// Whether there is a queued task or a pending return.
    pub fn has_task(&self, rs: &dyn RequestSystem) -> bool {
        self.queue(rs).is_some_and(TaskQueue::has_task)
    }

    /// The task being serviced (the queue head).
    pub fn current_task(&self, rs: &dyn RequestSystem) -> Option<TaskToken> {
        self.queue(rs).and_then(TaskQueue::head)
    }

    /// Snapshot of the queue, head first.
    pub fn task_queue(&self, rs: &dyn RequestSystem) -> Vec<TaskToken> {
        self.queue(rs)
            .map(|queue| queue.iter().collect())
            .unwrap_or_default()
    }

    /// Append a request at the tail of the queue.
    pub fn add_request(&self, token: TaskToken, rs: &mut dyn RequestSystem) {
        self.queue_mut(rs).push_back(token);
    }

    /// Finish the current task.
    ///
    /// Sets the returning flag, then resolves (`successful`) or cancels the
    /// head through the request system. The update may itself change the
    /// queue, so the head is removed only if it is still the same task
    /// afterwards. Returns the finished task, or `None` if the queue was
    /// empty.
    pub fn finish_request(&self, successful: bool, rs: &mut dyn RequestSystem) -> Option<TaskToken> {
        let queue = self.queue_mut(rs);
        let current = queue.head()?;
        queue.set_returning(true);

        let state = if successful {
            RequestState::Resolved
        } else {
            RequestState::Cancelled
        };
        rs.update_request_state(current, state);

        let queue = self.queue_mut(rs);
        if queue.head() == Some(current) {
            let _ = queue.pop_front();
        }
        debug!(citizen = %self.citizen, request = %current, ?state, "delivery finished");
        Some(current)
    }

    /// A scheduled task was cancelled elsewhere: drop it from the queue,
    /// returning to unload if it was the one being serviced.
    pub fn on_task_deletion(&self, token: TaskToken, rs: &mut dyn RequestSystem) -> bool {
        self.queue_mut(rs).on_task_deletion(token)
    }

    /// Whether the worker must return to unload.
    pub fn is_returning(&self, rs: &dyn RequestSystem) -> bool {
        self.queue(rs).is_some_and(TaskQueue::is_returning)
    }

    /// Set the returning flag. A queued task is still preferred by the AI
    /// once the flag is cleared.
    pub fn set_returning(&self, returning: bool, rs: &mut dyn RequestSystem) {
        self.queue_mut(rs).set_returning(returning);
    }

    /// Serialize the job. Only the citizen and the store token are written;
    /// the queue belongs to the request system.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(StoredJob {
            citizen: self.citizen,
            data_store: Some(self.data_store),
        })
        .unwrap_or(Value::Null)
    }

    /// Restore a job. A record without a store token gets a fresh store.
    pub fn from_value(value: Value, rs: &mut dyn RequestSystem) -> Result<Self, JobError> {
        let stored: StoredJob = serde_json::from_value(value)?;
        let data_store = match stored.data_store {
            Some(token) => token,
            None => {
                let token = rs.create_delivery_store();
                info!(citizen = %stored.citizen, store = %token, "deliveryman had no data store; created one");
                token
            }
        };
        Ok(Self {
            citizen: stored.citizen,
            data_store,
        })
    }
}
