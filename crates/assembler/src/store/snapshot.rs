//! Snapshot: JSON file holding sessions and summaries, loaded into a
//! [`MemoryStore`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::MemoryStore;
use crate::error::StoreError;
use crate::session::{ConversationSummary, SessionRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub sessions: Vec<SessionRecord>,
    pub summaries: Vec<ConversationSummary>,
}

impl Snapshot {
    pub fn read(path: &Path) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| StoreError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self).map_err(StoreError::Encode)?;
        std::fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub async fn into_store(self) -> MemoryStore {
        let store = MemoryStore::new();
        for session in self.sessions {
            store.insert_session(session).await;
        }
        for summary in self.summaries {
            store.insert_summary(summary).await;
        }
        store
    }
}

impl MemoryStore {
    pub async fn from_snapshot(path: &Path) -> Result<Self, StoreError> {
        let snapshot = Snapshot::read(path)?;
        tracing::info!(
            path = %path.display(),
            sessions = snapshot.sessions.len(),
            summaries = snapshot.summaries.len(),
            "Loaded session snapshot"
        );
        Ok(snapshot.into_store().await)
    }

    /// Write the current contents, summaries included, to `path`.
    pub async fn save_snapshot(&self, path: &Path) -> Result<(), StoreError> {
        let (sessions, summaries) = self.export().await;
        Snapshot { sessions, summaries }.write(path)
    }
}
