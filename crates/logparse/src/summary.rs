/// Prompt-oriented rendering of parse results.
///
/// Both functions produce plain text meant to be pasted into a language
/// model prompt, so the output favours compact, greppable lines over
/// anything machine readable.

use crate::model::{LogEntry, LogLevel, ParseResult};

/// Multi-line overview of a parse: format, sizes, time range, level
/// distribution and stack-trace count. Optional lines are left out when they
/// would be empty.
pub fn build_log_summary(result: &ParseResult) -> String {
    let ParseResult {
        format,
        total_lines,
        stats,
        ..
    } = result;

    let mut parts = vec![
        format!(
            "Log format: {} (confidence: {}%)",
            format.format.label(),
            (format.confidence * 100.0).round() as u32
        ),
        format!("Total lines: {} / Parsed entries: {}", total_lines, stats.total_entries),
    ];

    if let Some(range) = &stats.time_range {
        parts.push(format!("Time range: {} ~ {}", range.start, range.end));
    }

    let levels = LogLevel::ALL
        .iter()
        .filter_map(|level| match stats.count(*level) {
            0 => None,
            count => Some(format!("{}: {}", level.as_upper(), count)),
        })
        .collect::<Vec<_>>()
        .join(", ");
    if !levels.is_empty() {
        parts.push(format!("Level distribution: {}", levels));
    }

    if stats.has_stack_traces {
        parts.push(format!("Stack traces: {}", stats.stack_trace_count));
    }

    parts.join("\n")
}

/// `[timestamp] [LEVEL] [source] message`, absent fields omitted, with the
/// stack trace on the following lines.
pub fn format_entry_for_prompt(entry: &LogEntry) -> String {
    let mut out = String::with_capacity(entry.message.len() + 48);

    if let Some(ts) = &entry.timestamp {
        out.push('[');
        out.push_str(ts);
        out.push_str("] ");
    }
    out.push('[');
    out.push_str(entry.level.as_upper());
    out.push_str("] ");
    if let Some(source) = &entry.source {
        out.push('[');
        out.push_str(source);
        out.push_str("] ");
    }
    out.push_str(&entry.message);

    if let Some(stack) = &entry.stack_trace {
        out.push('\n');
        out.push_str(stack);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DetectionResult, LogFormat};
    use crate::stats::compute_stats;

    fn entry(level: LogLevel) -> LogEntry {
        LogEntry {
            line_number: 1,
            timestamp: None,
            level,
            message: "boom".to_string(),
            source: None,
            stack_trace: None,
            raw: String::new(),
        }
    }

    #[test]
    fn test_format_entry_minimal() {
        assert_eq!(format_entry_for_prompt(&entry(LogLevel::Warn)), "[WARN] boom");
    }

    #[test]
    fn test_format_entry_full() {
        let mut e = entry(LogLevel::Error);
        e.timestamp = Some("2024-01-15T10:30:45.123".to_string());
        e.source = Some("com.foo.Bar".to_string());
        e.stack_trace = Some("\tat a.B.c(B.java:1)".to_string());
        assert_eq!(
            format_entry_for_prompt(&e),
            "[2024-01-15T10:30:45.123] [ERROR] [com.foo.Bar] boom\n\tat a.B.c(B.java:1)"
        );
    }

    #[test]
    fn test_summary_full() {
        let mut with_stack = entry(LogLevel::Error);
        with_stack.timestamp = Some("2024-01-15T10:00:00".to_string());
        with_stack.stack_trace = Some("\tat x".to_string());
        let mut info = entry(LogLevel::Info);
        info.timestamp = Some("2024-01-15T11:00:00".to_string());
        let entries = vec![with_stack, info.clone(), info];

        let result = ParseResult {
            format: DetectionResult::new(LogFormat::Atlassian, 0.876, 10),
            total_lines: 12,
            stats: compute_stats(&entries),
            entries,
        };

        assert_eq!(
            build_log_summary(&result),
            "Log format: Atlassian (Jira/Confluence/Bitbucket) (confidence: 88%)\n\
             Total lines: 12 / Parsed entries: 3\n\
             Time range: 2024-01-15T10:00:00 ~ 2024-01-15T11:00:00\n\
             Level distribution: ERROR: 1, INFO: 2\n\
             Stack traces: 1"
        );
    }

    #[test]
    fn test_summary_of_empty_parse() {
        let result = ParseResult {
            format: DetectionResult::empty(),
            total_lines: 1,
            entries: Vec::new(),
            stats: compute_stats(&[]),
        };
        assert_eq!(
            build_log_summary(&result),
            "Log format: Plain Text (confidence: 0%)\nTotal lines: 1 / Parsed entries: 0"
        );
    }
}
