//! Window: keep conversation history inside the context budget.
//!
//! Over budget, history is split into three zones: the first message (A), the
//! middle (B) and the most recent messages (C). A and C are sent verbatim; B is
//! replaced by the latest persisted summary, or dropped if there is none.

use crate::conf::BudgetConfig;
use crate::session::ChatMessage;
use crate::tokens::estimate_tokens;

const SUMMARY_PREFIX: &str = "[Summary of the earlier conversation]";
const SUMMARY_ACK: &str = "Understood. I have the context of the earlier conversation and will continue from there.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowedHistory {
    pub messages: Vec<ChatMessage>,
    /// Zone B was replaced or dropped
    pub windowed: bool,
    pub summary_used: bool,
    pub history_tokens: usize,
    pub conversation_budget: usize,
}

pub fn message_tokens(messages: &[ChatMessage]) -> usize {
    messages.iter().map(|m| estimate_tokens(&m.content)).sum()
}

#[derive(Debug, Clone)]
pub struct ContextWindowManager {
    budget: BudgetConfig,
}

impl ContextWindowManager {
    pub fn new(budget: BudgetConfig) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> &BudgetConfig {
        &self.budget
    }

    /// Room left for history once the system prompt (files included), the
    /// reply and the safety margin are accounted for.
    pub fn conversation_budget(&self, system_prompt: &str) -> usize {
        self.budget
            .max_context_tokens
            .saturating_sub(estimate_tokens(system_prompt))
            .saturating_sub(self.budget.max_output_tokens)
            .saturating_sub(self.budget.safety_margin)
    }

    pub fn window(&self, messages: &[ChatMessage], system_prompt: &str, summary: Option<&str>) -> WindowedHistory {
        let conversation_budget = self.conversation_budget(system_prompt);
        let history_tokens = message_tokens(messages);
        let recent = self.budget.recent_messages_to_keep;

        let unchanged = |messages: &[ChatMessage]| WindowedHistory {
            messages: messages.to_vec(),
            windowed: false,
            summary_used: false,
            history_tokens,
            conversation_budget,
        };

        if history_tokens <= conversation_budget {
            return unchanged(messages);
        }
        if messages.len() <= recent + 1 {
            // Nothing between the first and the recent messages to give up
            tracing::warn!(
                history_tokens,
                conversation_budget,
                messages = messages.len(),
                "history over budget but too short to window"
            );
            return unchanged(messages);
        }

        let zone_c_start = messages.len() - recent;
        let mut windowed = Vec::with_capacity(recent + 3);
        windowed.push(messages[0].clone());

        let summary = summary.map(str::trim).filter(|s| !s.is_empty());
        if let Some(text) = summary {
            windowed.push(ChatMessage::user(format!("{}\n{}", SUMMARY_PREFIX, text)));
            windowed.push(ChatMessage::assistant(SUMMARY_ACK));
        }
        windowed.extend_from_slice(&messages[zone_c_start..]);

        tracing::info!(
            history_tokens,
            conversation_budget,
            dropped = zone_c_start - 1,
            summary_used = summary.is_some(),
            "windowed conversation history"
        );

        WindowedHistory {
            history_tokens,
            conversation_budget,
            summary_used: summary.is_some(),
            windowed: true,
            messages: windowed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    fn manager() -> ContextWindowManager {
        ContextWindowManager::new(BudgetConfig {
            max_context_tokens: 20_000,
            max_output_tokens: 1000,
            safety_margin: 1000,
            reserved_tokens: 5000,
            ..Default::default()
        })
    }

    /// `count` alternating messages of roughly `tokens_each` tokens.
    fn history(count: usize, tokens_each: usize) -> Vec<ChatMessage> {
        (0..count)
            .map(|i| {
                let body = format!("message {} {}", i, "x".repeat(tokens_each * 10 / 3));
                if i % 2 == 0 {
                    ChatMessage::user(body)
                } else {
                    ChatMessage::assistant(body)
                }
            })
            .collect()
    }

    #[test]
    fn test_conversation_budget() {
        let m = manager();
        assert_eq!(m.conversation_budget(""), 18_000);
        // 300 chars is 90 tokens
        assert_eq!(m.conversation_budget(&"a".repeat(300)), 17_910);
    }

    #[test]
    fn test_conversation_budget_saturates() {
        let m = manager();
        assert_eq!(m.conversation_budget(&"a".repeat(100_000)), 0);
    }

    #[test]
    fn test_within_budget_passes_through() {
        let m = manager();
        let messages = history(20, 100);
        let out = m.window(&messages, "", Some("summary"));
        assert!(!out.windowed);
        assert_eq!(out.messages, messages);
    }

    #[test]
    fn test_over_budget_without_summary_drops_middle() {
        let m = manager();
        let messages = history(20, 2000);
        let out = m.window(&messages, "", None);

        assert!(out.windowed);
        assert!(!out.summary_used);
        assert_eq!(out.messages.len(), 7);
        assert_eq!(out.messages[0], messages[0]);
        assert_eq!(&out.messages[1..], &messages[14..]);
    }

    #[test]
    fn test_over_budget_with_summary_substitutes_middle() {
        let m = manager();
        let messages = history(20, 2000);
        let out = m.window(&messages, "", Some("Disk full on node-3."));

        assert!(out.summary_used);
        assert_eq!(out.messages.len(), 9);
        assert_eq!(out.messages[0], messages[0]);
        assert_eq!(out.messages[1].role, Role::User);
        assert!(out.messages[1].content.contains("Disk full on node-3."));
        assert_eq!(out.messages[2].role, Role::Assistant);
        assert_eq!(&out.messages[3..], &messages[14..]);
    }

    #[test]
    fn test_blank_summary_counts_as_absent() {
        let m = manager();
        let out = m.window(&history(20, 2000), "", Some("   "));
        assert_eq!(out.messages.len(), 7);
    }

    #[test]
    fn test_short_history_is_never_windowed() {
        let m = manager();
        let messages = history(7, 5000);
        let out = m.window(&messages, "", Some("summary"));
        assert!(!out.windowed);
        assert_eq!(out.messages, messages);
    }

    #[test]
    fn test_zone_a_and_c_survive_for_all_lengths() {
        let m = manager();
        for len in 8..40 {
            let messages = history(len, 3000);
            for summary in [None, Some("s")] {
                let out = m.window(&messages, "", summary);
                assert_eq!(out.messages[0], messages[0]);
                let tail = &out.messages[out.messages.len() - 6..];
                assert_eq!(tail, &messages[len - 6..]);
                assert!(out.messages.len() <= 1 + 2 + 6);
            }
        }
    }
}
