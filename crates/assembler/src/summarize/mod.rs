//! Summarize: fold the middle of a long conversation into a persisted
//! summary.
//!
//! `trigger.rs` decides what to send, [`run_once`] performs one pass against
//! the store and the summarization collaborator, and `worker.rs` runs passes
//! off the request path. `scripted.rs` is an in-memory collaborator for tests.

pub mod scripted;
pub mod trigger;
pub mod worker;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::Utc;

use crate::conf::AssemblerConfig;
use crate::error::SummarizeError;
use crate::prompt::SUMMARIZATION_SYSTEM_PROMPT;
use crate::session::{ConversationSummary, StoredMessage};
use crate::store::SessionStore;

pub use scripted::ScriptedSummarizer;
pub use trigger::{plan_summarization, SkipReason, SummaryPlan};
pub use worker::{spawn_summary_worker, SummaryQueue, WorkerStats, WorkerStatsSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    pub system_prompt: String,
    pub prompt: String,
    pub max_output_tokens: usize,
}

/// The language model call that turns a transcript into a summary.
pub trait Summarizer: Send + Sync {
    fn summarize(
        &self,
        request: SummaryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, SummarizeError>> + Send + '_>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    SessionNotFound,
    Skipped(SkipReason),
    Summarized {
        message_count: usize,
        summarized_up_to_id: String,
    },
}

pub fn render_conversation(messages: &[StoredMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("[{}]: {}", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_summary_prompt(messages: &[StoredMessage], previous_summary: Option<&str>) -> String {
    let conversation = render_conversation(messages);
    match previous_summary {
        Some(previous) => format!(
            "## Previous summary\n{}\n\n## New conversation (merge into the summary)\n{}",
            previous, conversation
        ),
        None => format!("## Conversation to summarize\n{}", conversation),
    }
}

/// One summarization pass for a session.
///
/// Skips are not errors. Collaborator failures, timeouts, empty replies and
/// store failures are, and leave the stored summaries untouched.
pub async fn run_once(
    store: &dyn SessionStore,
    summarizer: &dyn Summarizer,
    session_id: &str,
    config: &AssemblerConfig,
) -> Result<SummaryOutcome, SummarizeError> {
    let Some(session) = store.load_session(session_id).await? else {
        return Ok(SummaryOutcome::SessionNotFound);
    };
    let latest = store.latest_summary(session_id).await?;

    let (messages, previous_summary) =
        match plan_summarization(&session.messages, latest.as_ref(), &config.budget, &config.summarizer) {
            SummaryPlan::Skip(reason) => {
                tracing::debug!(session_id, reason = reason.as_str(), "summarization skipped");
                return Ok(SummaryOutcome::Skipped(reason));
            }
            SummaryPlan::Summarize {
                messages,
                previous_summary,
            } => (messages, previous_summary),
        };

    let request = SummaryRequest {
        system_prompt: SUMMARIZATION_SYSTEM_PROMPT.to_string(),
        prompt: build_summary_prompt(messages, previous_summary),
        max_output_tokens: config.summarizer.max_output_tokens,
    };

    let timeout = Duration::from_secs(config.summarizer.timeout_secs);
    let text = match tokio::time::timeout(timeout, summarizer.summarize(request)).await {
        Ok(result) => result?,
        Err(_) => return Err(SummarizeError::Timeout(timeout)),
    };
    let text = text.trim();
    if text.is_empty() {
        return Err(SummarizeError::EmptySummary);
    }

    // plan_summarization never yields an empty slice
    let Some(last) = messages.last() else {
        return Ok(SummaryOutcome::Skipped(SkipReason::AlreadySummarized));
    };

    store
        .append_summary(ConversationSummary {
            session_id: session_id.to_string(),
            summary: text.to_string(),
            summarized_up_to_id: last.id.clone(),
            message_count: messages.len(),
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!(
        session_id,
        message_count = messages.len(),
        summarized_up_to_id = %last.id,
        incremental = previous_summary.is_some(),
        "conversation summarized"
    );

    Ok(SummaryOutcome::Summarized {
        message_count: messages.len(),
        summarized_up_to_id: last.id.clone(),
    })
}
