//! Memory: in-memory [`SessionStore`].
//!
//! Backs the CLI's snapshot mode and every async test. A failure switch lets
//! tests exercise the store-unavailable paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use super::{SessionStore, StoreFuture};
use crate::error::StoreError;
use crate::session::{ConversationSummary, SessionRecord};

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, SessionRecord>,
    summaries: Vec<ConversationSummary>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a session.
    pub async fn insert_session(&self, session: SessionRecord) {
        let mut inner = self.inner.lock().await;
        inner.sessions.insert(session.id.clone(), session);
    }

    /// Seed a summary without going through the trait.
    pub async fn insert_summary(&self, summary: ConversationSummary) {
        self.inner.lock().await.summaries.push(summary);
    }

    /// Every summary of a session, oldest first.
    pub async fn summaries_for(&self, session_id: &str) -> Vec<ConversationSummary> {
        let inner = self.inner.lock().await;
        inner
            .summaries
            .iter()
            .filter(|s| s.session_id == session_id)
            .cloned()
            .collect()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) async fn export(&self) -> (Vec<SessionRecord>, Vec<ConversationSummary>) {
        let inner = self.inner.lock().await;
        let mut sessions: Vec<_> = inner.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| a.id.cmp(&b.id));
        (sessions, inner.summaries.clone())
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched to failing".to_string()));
        }
        Ok(())
    }
}

impl SessionStore for MemoryStore {
    fn load_session<'a>(&'a self, session_id: &'a str) -> StoreFuture<'a, Option<SessionRecord>> {
        Box::pin(async move {
            self.check()?;
            Ok(self.inner.lock().await.sessions.get(session_id).cloned())
        })
    }

    fn latest_summary<'a>(&'a self, session_id: &'a str) -> StoreFuture<'a, Option<ConversationSummary>> {
        Box::pin(async move {
            self.check()?;
            let inner = self.inner.lock().await;
            // Later insertions win ties on created_at
            let latest = inner
                .summaries
                .iter()
                .enumerate()
                .filter(|(_, s)| s.session_id == session_id)
                .max_by_key(|(idx, s)| (s.created_at, *idx))
                .map(|(_, s)| s.clone());
            Ok(latest)
        })
    }

    fn append_summary(&self, summary: ConversationSummary) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.check()?;
            self.inner.lock().await.summaries.push(summary);
            Ok(())
        })
    }
}
