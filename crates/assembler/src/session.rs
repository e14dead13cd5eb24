//! Session: persisted records consumed from the store and the per-request
//! context values built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::prompt;

/// Free-form environment description entered with the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemInfo {
    pub os: String,
    pub app_name: String,
    pub app_version: String,
    pub environment: String,
    pub notes: String,
}

impl SystemInfo {
    /// `(label, value)` pairs for the fields that are filled in.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("OS", self.os.as_str()),
            ("Application", self.app_name.as_str()),
            ("Version", self.app_version.as_str()),
            ("Environment", self.environment.as_str()),
            ("Notes", self.notes.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Speaker tag used in summarization transcripts.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// An uploaded log file as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: String,
    pub filename: String,
    pub content: String,
    /// Upload size in bytes
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    /// Set when the file was attached to a specific chat turn rather than the
    /// session itself
    #[serde(default)]
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only record of a summarization run. Only the newest one per
/// session is consulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub session_id: String,
    pub summary: String,
    /// Id of the last message folded into this summary
    pub summarized_up_to_id: String,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Everything the store holds for one session, files and messages in
/// chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    #[serde(default)]
    pub system_info: SystemInfo,
    #[serde(default)]
    pub files: Vec<StoredFile>,
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
}

/// A message as sent to the language model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&StoredMessage> for ChatMessage {
    fn from(message: &StoredMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// A session file after budget optimization. Derived per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedFile {
    pub filename: String,
    pub content: String,
    pub original_size: u64,
    pub truncated: bool,
    pub format_summary: Option<String>,
}

/// Everything needed for one model call. Rebuilt per request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatContext {
    pub session_id: String,
    pub system_info: SystemInfo,
    pub files: Vec<ProcessedFile>,
    /// History after windowing
    pub messages: Vec<ChatMessage>,
    pub system_prompt_context: String,
    /// True when the middle of the history was summarized or dropped
    pub windowed: bool,
}

impl ChatContext {
    /// Base analyst prompt, session section and the budgeted file contents.
    pub fn full_system_prompt(&self) -> String {
        prompt::full_system_prompt(&self.system_prompt_context, &self.files)
    }
}
