//! Context: assemble everything one model call needs for a session.

use crate::conf::AssemblerConfig;
use crate::error::AssemblerResult;
use crate::files::process_session_files;
use crate::prompt::{build_system_prompt_context, full_system_prompt};
use crate::session::{ChatContext, ChatMessage};
use crate::store::SessionStore;
use crate::window::ContextWindowManager;

/// Build the [`ChatContext`] for a session, or `None` if it does not exist.
///
/// Files are budgeted first because the conversation budget depends on the
/// size of the resulting system prompt.
pub async fn build_chat_context(
    store: &dyn SessionStore,
    session_id: &str,
    config: &AssemblerConfig,
) -> AssemblerResult<Option<ChatContext>> {
    let Some(session) = store.load_session(session_id).await? else {
        return Ok(None);
    };

    let files = process_session_files(&session.files, &config.budget).await?;
    let system_prompt_context = build_system_prompt_context(&session.system_info, &files);
    let system_prompt = full_system_prompt(&system_prompt_context, &files);

    let history: Vec<ChatMessage> = session.messages.iter().map(ChatMessage::from).collect();
    let latest = store.latest_summary(session_id).await?;

    let manager = ContextWindowManager::new(config.budget.clone());
    let windowed = manager.window(&history, &system_prompt, latest.as_ref().map(|s| s.summary.as_str()));

    tracing::debug!(
        session_id,
        files = files.len(),
        history_tokens = windowed.history_tokens,
        conversation_budget = windowed.conversation_budget,
        windowed = windowed.windowed,
        "assembled chat context"
    );

    Ok(Some(ChatContext {
        session_id: session.id,
        system_info: session.system_info,
        files,
        messages: windowed.messages,
        system_prompt_context,
        windowed: windowed.windowed,
    }))
}
