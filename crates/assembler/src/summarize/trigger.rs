//! Trigger: decide whether a session needs (re)summarization and which
//! messages to send.

use crate::conf::{BudgetConfig, SummarizerConfig};
use crate::session::{ConversationSummary, StoredMessage};
use crate::tokens::estimate_tokens;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    TooFewMessages,
    BelowThreshold,
    AlreadySummarized,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Disabled => "disabled",
            SkipReason::TooFewMessages => "too few messages",
            SkipReason::BelowThreshold => "below threshold",
            SkipReason::AlreadySummarized => "already summarized",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryPlan<'a> {
    Skip(SkipReason),
    Summarize {
        /// Oldest first, never empty
        messages: &'a [StoredMessage],
        /// Text to merge into when summarizing incrementally
        previous_summary: Option<&'a str>,
    },
}

fn history_tokens(messages: &[StoredMessage]) -> usize {
    messages.iter().map(|m| estimate_tokens(&m.content)).sum()
}

pub fn plan_summarization<'a>(
    messages: &'a [StoredMessage],
    latest: Option<&'a ConversationSummary>,
    budget: &BudgetConfig,
    summarizer: &SummarizerConfig,
) -> SummaryPlan<'a> {
    if !summarizer.enabled {
        return SummaryPlan::Skip(SkipReason::Disabled);
    }

    let recent = budget.recent_messages_to_keep;
    if messages.len() <= recent + 1 {
        return SummaryPlan::Skip(SkipReason::TooFewMessages);
    }

    let trigger_budget = budget.trigger_budget();
    let threshold = (trigger_budget as f64 * budget.summarization_threshold) as usize;
    if history_tokens(messages) < threshold {
        return SummaryPlan::Skip(SkipReason::BelowThreshold);
    }

    let zone_b = &messages[1..messages.len() - recent];

    let (candidates, previous_summary) = match latest {
        Some(summary) => match zone_b.iter().position(|m| m.id == summary.summarized_up_to_id) {
            Some(anchor) if anchor + 1 == zone_b.len() => {
                return SummaryPlan::Skip(SkipReason::AlreadySummarized);
            }
            Some(anchor) => (&zone_b[anchor + 1..], Some(summary.summary.as_str())),
            None => {
                tracing::debug!(
                    anchor = %summary.summarized_up_to_id,
                    "summary anchor outside the middle zone, resummarizing from scratch"
                );
                (zone_b, None)
            }
        },
        None => (zone_b, None),
    };

    let input_cap = summarizer.max_input_tokens.unwrap_or(trigger_budget);
    // Merging needs a gapless run after the anchor; the rest waits for the next pass
    let messages = if previous_summary.is_some() {
        cap_oldest(candidates, input_cap)
    } else {
        cap_newest(candidates, input_cap)
    };
    SummaryPlan::Summarize {
        messages,
        previous_summary,
    }
}

/// Oldest prefix of `messages` within `cap` tokens, always at least one
/// message.
fn cap_oldest(messages: &[StoredMessage], cap: usize) -> &[StoredMessage] {
    let mut used = 0usize;
    let mut end = 0usize;
    for message in messages {
        let tokens = estimate_tokens(&message.content);
        if used + tokens > cap && end > 0 {
            break;
        }
        used += tokens;
        end += 1;
    }

    if end < messages.len() {
        tracing::debug!(
            deferred = messages.len() - end,
            kept = end,
            cap,
            "summarization input capped, newer messages deferred to the next pass"
        );
    }
    &messages[..end]
}

/// Newest suffix of `messages` within `cap` tokens, always at least one
/// message.
fn cap_newest(messages: &[StoredMessage], cap: usize) -> &[StoredMessage] {
    let mut used = 0usize;
    let mut start = messages.len();
    for (idx, message) in messages.iter().enumerate().rev() {
        let tokens = estimate_tokens(&message.content);
        if used + tokens > cap && start < messages.len() {
            break;
        }
        used += tokens;
        start = idx;
    }

    if start > 0 {
        tracing::warn!(
            dropped = start,
            kept = messages.len() - start,
            cap,
            "summarization input capped, oldest messages left out"
        );
    }
    &messages[start..]
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::session::Role;

    fn budget() -> BudgetConfig {
        BudgetConfig {
            max_context_tokens: 20_000,
            max_output_tokens: 1000,
            safety_margin: 1000,
            reserved_tokens: 10_000,
            ..Default::default()
        }
    }

    fn messages(count: usize, tokens_each: usize) -> Vec<StoredMessage> {
        let base = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        (0..count)
            .map(|i| StoredMessage {
                id: format!("m{}", i),
                role: if i % 2 == 0 { Role::User } else { Role::Assistant },
                content: "x".repeat(tokens_each * 10 / 3),
                created_at: base + Duration::minutes(i as i64),
            })
            .collect()
    }

    fn summary_up_to(id: &str) -> ConversationSummary {
        ConversationSummary {
            session_id: "s1".to_string(),
            summary: "earlier findings".to_string(),
            summarized_up_to_id: id.to_string(),
            message_count: 3,
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 11, 0, 0).unwrap(),
        }
    }

    fn ids(plan: &SummaryPlan<'_>) -> Vec<String> {
        match plan {
            SummaryPlan::Summarize { messages, .. } => messages.iter().map(|m| m.id.clone()).collect(),
            SummaryPlan::Skip(reason) => panic!("expected Summarize, got Skip({:?})", reason),
        }
    }

    #[test]
    fn test_skip_when_disabled() {
        let msgs = messages(20, 1000);
        let cfg = SummarizerConfig {
            enabled: false,
            ..Default::default()
        };
        assert_eq!(plan_summarization(&msgs, None, &budget(), &cfg), SummaryPlan::Skip(SkipReason::Disabled));
    }

    #[test]
    fn test_skip_with_too_few_messages() {
        let msgs = messages(7, 5000);
        let plan = plan_summarization(&msgs, None, &budget(), &SummarizerConfig::default());
        assert_eq!(plan, SummaryPlan::Skip(SkipReason::TooFewMessages));
    }

    #[test]
    fn test_skip_below_threshold() {
        // 20 x 300 = 6000 < 8000
        let msgs = messages(20, 300);
        let plan = plan_summarization(&msgs, None, &budget(), &SummarizerConfig::default());
        assert_eq!(plan, SummaryPlan::Skip(SkipReason::BelowThreshold));
    }

    #[test]
    fn test_first_summary_covers_middle_zone() {
        let msgs = messages(20, 1000);
        let plan = plan_summarization(&msgs, None, &budget(), &SummarizerConfig::default());
        let expected: Vec<String> = (1..14).map(|i| format!("m{}", i)).collect();
        assert_eq!(ids(&plan), expected);
        assert!(matches!(plan, SummaryPlan::Summarize { previous_summary: None, .. }));
    }

    #[test]
    fn test_incremental_after_anchor() {
        let msgs = messages(20, 1000);
        let latest = summary_up_to("m9");
        let plan = plan_summarization(&msgs, Some(&latest), &budget(), &SummarizerConfig::default());
        assert_eq!(ids(&plan), vec!["m10", "m11", "m12", "m13"]);
        assert!(matches!(
            plan,
            SummaryPlan::Summarize { previous_summary: Some("earlier findings"), .. }
        ));
    }

    #[test]
    fn test_anchor_at_end_of_middle_zone_skips() {
        let msgs = messages(20, 1000);
        let latest = summary_up_to("m13");
        let plan = plan_summarization(&msgs, Some(&latest), &budget(), &SummarizerConfig::default());
        assert_eq!(plan, SummaryPlan::Skip(SkipReason::AlreadySummarized));
    }

    #[test]
    fn test_missing_anchor_resummarizes_everything() {
        let msgs = messages(20, 1000);
        for anchor in ["m0", "m15", "gone"] {
            let latest = summary_up_to(anchor);
            let plan = plan_summarization(&msgs, Some(&latest), &budget(), &SummarizerConfig::default());
            assert_eq!(ids(&plan).len(), 13, "anchor {}", anchor);
            assert!(matches!(plan, SummaryPlan::Summarize { previous_summary: None, .. }));
        }
    }

    #[test]
    fn test_input_cap_keeps_newest() {
        let msgs = messages(20, 1000);
        let cfg = SummarizerConfig {
            max_input_tokens: Some(3500),
            ..Default::default()
        };
        let plan = plan_summarization(&msgs, None, &budget(), &cfg);
        assert_eq!(ids(&plan), vec!["m11", "m12", "m13"]);
    }

    #[test]
    fn test_input_cap_keeps_at_least_one_message() {
        let msgs = messages(20, 1000);
        let cfg = SummarizerConfig {
            max_input_tokens: Some(10),
            ..Default::default()
        };
        let plan = plan_summarization(&msgs, None, &budget(), &cfg);
        assert_eq!(ids(&plan), vec!["m13"]);
    }

    #[test]
    fn test_input_cap_after_anchor_continues_without_gaps() {
        let msgs = messages(20, 1000);
        let cfg = SummarizerConfig {
            max_input_tokens: Some(3500),
            ..Default::default()
        };
        let latest = summary_up_to("m3");
        let plan = plan_summarization(&msgs, Some(&latest), &budget(), &cfg);
        assert_eq!(ids(&plan), vec!["m4", "m5", "m6"]);
        assert!(matches!(
            plan,
            SummaryPlan::Summarize {
                previous_summary: Some("earlier findings"),
                ..
            }
        ));

        // The next pass picks up right after the new anchor
        let latest = summary_up_to("m6");
        let plan = plan_summarization(&msgs, Some(&latest), &budget(), &cfg);
        assert_eq!(ids(&plan), vec!["m7", "m8", "m9"]);
    }

    #[test]
    fn test_input_cap_after_anchor_keeps_at_least_one_message() {
        let msgs = messages(20, 1000);
        let cfg = SummarizerConfig {
            max_input_tokens: Some(10),
            ..Default::default()
        };
        let latest = summary_up_to("m9");
        let plan = plan_summarization(&msgs, Some(&latest), &budget(), &cfg);
        assert_eq!(ids(&plan), vec!["m10"]);
    }
}
