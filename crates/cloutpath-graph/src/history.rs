//! Graph-level history log (`metadata.history`).
//!
//! History is copy-on-write: every append builds a fresh sequence, so a
//! snapshot returned by [`Graph::history`] never changes after the fact.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Graph;

/// One record in the graph's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

impl Graph {
    /// Snapshot of the current history.
    pub fn history(&self) -> Arc<Vec<HistoryEntry>> {
        Arc::clone(&self.history)
    }

    /// Append a record stamped with the current time.
    pub fn append_history(&mut self, description: impl Into<String>) {
        self.append_history_at(Utc::now(), description);
    }

    pub fn append_history_at(&mut self, timestamp: DateTime<Utc>, description: impl Into<String>) {
        let mut next = Vec::with_capacity(self.history.len() + 1);
        next.extend(self.history.iter().cloned());
        next.push(HistoryEntry {
            timestamp,
            description: description.into(),
        });
        self.history = Arc::new(next);
    }
}
