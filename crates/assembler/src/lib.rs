//! Token-budgeted context assembly for log troubleshooting sessions.

// Core infrastructure
pub mod conf;
pub mod error;
pub mod runtime;
pub mod store;
pub mod tokens;

// Domain modules
pub mod context;
pub mod files;
pub mod optimize;
pub mod prompt;
pub mod session;
pub mod summarize;
pub mod window;

pub use conf::{AssemblerConfig, BudgetConfig, SummarizerConfig};
pub use context::build_chat_context;
pub use error::{AssemblerError, AssemblerResult, ConfigError, StoreError, SummarizeError};
pub use optimize::{optimize, ContentAnalysis, OptimizedContent};
pub use session::{ChatContext, ChatMessage, ProcessedFile, Role};
pub use store::{MemoryStore, SessionStore};
pub use summarize::{spawn_summary_worker, Summarizer, SummaryQueue};
pub use tokens::estimate_tokens;
pub use window::ContextWindowManager;
