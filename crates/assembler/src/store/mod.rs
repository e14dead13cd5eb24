//! Store: abstract interface over session persistence.
//!
//! Context assembly and summarization reach persisted sessions only through
//! [`SessionStore`]. `memory.rs` holds an in-memory implementation,
//! `snapshot.rs` loads one from a JSON file.

pub mod memory;
pub mod snapshot;

use std::future::Future;
use std::pin::Pin;

use crate::error::StoreError;
use crate::session::{ConversationSummary, SessionRecord};

pub use memory::MemoryStore;
pub use snapshot::Snapshot;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Async access to persisted sessions and their summaries.
///
/// Object-safe thanks to `Pin<Box<…>>` returns so it can be shared as
/// `Arc<dyn SessionStore>` with the background worker.
pub trait SessionStore: Send + Sync {
    /// Files and messages of a session, or `None` if it does not exist.
    fn load_session<'a>(&'a self, session_id: &'a str) -> StoreFuture<'a, Option<SessionRecord>>;

    /// Newest summary recorded for the session.
    fn latest_summary<'a>(&'a self, session_id: &'a str) -> StoreFuture<'a, Option<ConversationSummary>>;

    /// Records are append-only; earlier summaries are never rewritten.
    fn append_summary(&self, summary: ConversationSummary) -> StoreFuture<'_, ()>;
}
