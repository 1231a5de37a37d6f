//! Bounded command history.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

/// Number of commands kept before the oldest is evicted.
pub const HISTORY_CAPACITY: usize = 10;

/// One executed utterance.
#[derive(Debug, Clone, Serialize)]
pub struct CommandRecord {
    pub id: Uuid,
    /// The utterance exactly as received, before trimming.
    pub command: String,
    pub timestamp: DateTime<Local>,
}

impl CommandRecord {
    pub fn new(command: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            command: command.to_string(),
            timestamp: Local::now(),
        }
    }
}

/// Fixed-capacity ring buffer of command records, oldest first.
///
/// Not synchronized; the owner wraps it in a lock.
#[derive(Debug)]
pub struct CommandHistory {
    records: VecDeque<CommandRecord>,
    capacity: usize,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record, silently evicting the oldest when full.
    pub fn push(&mut self, record: CommandRecord) {
        if self.capacity == 0 {
            return;
        }
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &CommandRecord> {
        self.records.iter()
    }

    /// Copy of the records, oldest first.
    pub fn snapshot(&self) -> Vec<CommandRecord> {
        self.records.iter().cloned().collect()
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}
