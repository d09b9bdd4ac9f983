// Backing store for log entries

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use super::types::{LogEntry, LogId, NewLogEntry};
use crate::ids::{agi_uuid, IdNamespace};

/// Bookkeeping the logger needs from whatever holds its entries
pub trait LogStoreActions: Send + Sync {
    fn get_entry(&self, id: &str) -> Option<LogEntry>;

    /// Store a new entry and return its id
    fn add_entry(&self, entry: NewLogEntry) -> LogId;

    /// Mark one action completed, or every action of the entry when `action_id` is None
    fn mark_action_completed(&self, id: &str, action_id: Option<&str>);

    fn mark_dismissed(&self, id: &str);

    /// Entries with at least one action not yet completed, in insertion order
    fn pending_action_entries(&self) -> Vec<LogEntry>;
}

/// Insertion-ordered, capacity-capped in-memory store
pub struct MemoryLogStore {
    entries: Mutex<VecDeque<LogEntry>>,
    max_entries: usize,
}

impl MemoryLogStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Snapshot of all entries, oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<F>(&self, id: &str, f: F)
    where
        F: FnOnce(&mut LogEntry),
    {
        if let Some(entry) = self.lock().iter_mut().find(|e| e.id == id) {
            f(entry);
        }
    }
}

impl Default for MemoryLogStore {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl LogStoreActions for MemoryLogStore {
    fn get_entry(&self, id: &str) -> Option<LogEntry> {
        self.lock().iter().find(|e| e.id == id).cloned()
    }

    fn add_entry(&self, entry: NewLogEntry) -> LogId {
        let id = agi_uuid(IdNamespace::LogEntry);
        let NewLogEntry {
            level,
            message,
            details,
            source,
            actions,
        } = entry;

        let mut entries = self.lock();
        entries.push_back(LogEntry {
            id: id.clone(),
            timestamp: Utc::now(),
            level,
            message,
            details,
            source,
            actions,
            dismissed: false,
        });
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
        id
    }

    fn mark_action_completed(&self, id: &str, action_id: Option<&str>) {
        self.update(id, |entry| {
            for action in &mut entry.actions {
                if action_id.map_or(true, |aid| action.id == aid) {
                    action.completed = true;
                }
            }
        });
    }

    fn mark_dismissed(&self, id: &str) {
        self.update(id, |entry| entry.dismissed = true);
    }

    fn pending_action_entries(&self) -> Vec<LogEntry> {
        self.lock()
            .iter()
            .filter(|e| e.has_pending_actions())
            .cloned()
            .collect()
    }
}
