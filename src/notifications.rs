// 11.0: user-facing messages produced by the form. the controller queues them and the
// UI layer drains the queue after each interaction, the same way toast messages work.

use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub timestamp: Timestamp,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationQueue {
    pending: VecDeque<Notification>,
    capacity: usize,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl NotificationQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Oldest messages are dropped once the queue is full.
    pub fn push(&mut self, notification: Notification) {
        self.pending.push_back(notification);
        while self.pending.len() > self.capacity {
            self.pending.pop_front();
        }
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        self.pending.drain(..).collect()
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.pending.back()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
