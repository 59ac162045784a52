//! The per-job task queue.
//!
//! The head of the queue is the task being serviced. The `returning` flag
//! sends the worker back to base to unload; it takes priority over the head.

use std::collections::VecDeque;

use colony_types::TaskToken;
use serde::{Deserialize, Serialize};

/// Ordered tasks of one dispatch job plus its returning flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskQueue {
    queue: VecDeque<TaskToken>,
    returning: bool,
}

impl TaskQueue {
    /// Create an empty, non-returning queue.
    pub const fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            returning: false,
        }
    }

    /// The task being serviced.
    pub fn head(&self) -> Option<TaskToken> {
        self.queue.front().copied()
    }

    /// Append a task at the tail.
    pub fn push_back(&mut self, token: TaskToken) {
        self.queue.push_back(token);
    }

    /// Remove and return the head.
    pub fn pop_front(&mut self) -> Option<TaskToken> {
        self.queue.pop_front()
    }

    /// Whether `token` is queued anywhere.
    pub fn contains(&self, token: TaskToken) -> bool {
        self.queue.contains(&token)
    }

    /// Remove the first occurrence of `token` from anywhere in the queue.
    pub fn remove(&mut self, token: TaskToken) -> bool {
        match self.queue.iter().position(|t| *t == token) {
            Some(index) => self.queue.remove(index).is_some(),
            None => false,
        }
    }

    /// Apply the task-deletion rules: if `token` is queued, remove it, and if
    /// it was the head, send the worker back to unload what it picked up.
    ///
    /// Returns whether the token was queued.
    pub fn on_task_deletion(&mut self, token: TaskToken) -> bool {
        if !self.contains(token) {
            return false;
        }
        if self.head() == Some(token) {
            self.returning = true;
        }
        self.remove(token)
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no task is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queued tasks, head first.
    pub fn iter(&self) -> impl Iterator<Item = TaskToken> + '_ {
        self.queue.iter().copied()
    }

    /// Whether the worker must return to unload.
    pub const fn is_returning(&self) -> bool {
        self.returning
    }

    /// Set the returning flag.
    pub const fn set_returning(&mut self, returning: bool) {
        self.returning = returning;
    }

    /// Whether there is anything to do: a queued task or a pending return.
    pub fn has_task(&self) -> bool {
        !self.queue.is_empty() || self.returning
    }
}
