use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{HistoryEntry, WorkspaceId};
use crate::storage::{self, KeyValueStore, HISTORY_KEY};

/// Question/SQL pairs, newest first. The whole log is rewritten to storage
/// on every append.
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    store: Arc<dyn KeyValueStore>,
    limit: Option<usize>,
}

impl HistoryLog {
    /// Loads the persisted log. Absent or unreadable data starts an empty log.
    /// A `limit` of zero is treated as one.
    pub fn load(store: Arc<dyn KeyValueStore>, limit: Option<usize>) -> Self {
        let limit = limit.map(|limit| limit.max(1));
        let entries: VecDeque<HistoryEntry> = storage::load_or_default(store.as_ref(), HISTORY_KEY);
        let mut log = Self { entries, store, limit };
        log.enforce_limit();
        tracing::debug!(entries = log.entries.len(), "history loaded");
        log
    }

    pub fn append(&mut self, workspace_id: WorkspaceId, question: &str, sql: &str) -> HistoryEntry {
        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            question: question.to_string(),
            sql: sql.to_string(),
            workspace_id,
            timestamp: Utc::now(),
        };
        self.entries.push_front(entry.clone());
        self.enforce_limit();

        // Best effort: the in-memory log stays authoritative.
        if let Err(err) = self.persist() {
            tracing::warn!(error = %err, "failed to persist query history");
        }
        entry
    }

    /// Entries recorded for `workspace_id`, newest first.
    pub fn list(&self, workspace_id: WorkspaceId) -> impl Iterator<Item = &HistoryEntry> + Clone + '_ {
        self.entries.iter().filter(move |entry| entry.workspace_id == workspace_id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> + Clone + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn persist(&self) -> AppResult<()> {
        storage::save(self.store.as_ref(), HISTORY_KEY, &self.entries)
    }

    fn enforce_limit(&mut self) {
        if let Some(limit) = self.limit {
            self.entries.truncate(limit);
        }
    }
}
