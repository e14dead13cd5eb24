//! Log format detection and parsing.
//!
//! Turns arbitrary uploaded log text into structured [`LogEntry`] values:
//!
//! - `normalize.rs`: BOM stripping and line-ending normalization
//! - `detector.rs`: signature sampling over the leading lines
//! - `formats/`: one parser per format, dispatched by [`LogFormat`]
//! - `stats.rs`: level histogram, time range and stack-trace counts
//! - `summary.rs`: prompt-ready rendering of results and entries
//!
//! Parsing never fails on content. Lines a strict format cannot read are
//! either skipped (JSON) or kept as `unknown` entries (everything else).

pub mod detector;
pub mod formats;
pub mod model;
pub mod normalize;
pub mod stats;
pub mod summary;

pub use detector::detect_format;
pub use formats::http_status_to_level;
pub use model::{
    DetectionResult, LogEntry, LogFormat, LogLevel, LogStats, ParseOptions, ParseResult, TimeRange,
    UnknownFormat,
};
pub use normalize::normalize_content;
pub use stats::compute_stats;
pub use summary::{build_log_summary, format_entry_for_prompt};

/// Non-blank lines sampled by the detector unless told otherwise.
pub const DEFAULT_SAMPLE_SIZE: usize = 50;

/// Normalize, detect (unless a format is forced), parse and aggregate.
pub fn parse_log(content: &str, options: &ParseOptions) -> ParseResult {
    let normalized = normalize::normalize_content(content);
    let lines = normalize::split_lines(&normalized);

    let format = match options.format {
        Some(forced) => DetectionResult::forced(forced),
        None => detect_format(&normalized, options.sample_size),
    };

    let mut entries = formats::parse_lines(format.format, &lines, options.max_entries);
    if !options.include_raw {
        entries.iter_mut().for_each(|entry| entry.raw.clear());
    }

    let stats = compute_stats(&entries);
    tracing::debug!(
        format = %format.format,
        lines = lines.len(),
        entries = stats.total_entries,
        "parsed log"
    );

    ParseResult {
        format,
        total_lines: lines.len(),
        entries,
        stats,
    }
}

/// Fatal, error and warning entries of a full parse, in input order.
pub fn extract_issues(content: &str) -> Vec<LogEntry> {
    parse_log(content, &ParseOptions::default())
        .entries
        .into_iter()
        .filter(|entry| entry.level.is_issue())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atlassian_scenario() {
        let content = "2024-01-15 10:30:45,123 ERROR [com.foo.Bar] boom\n2024-01-15 10:30:46,000 INFO [com.foo.Bar] ok";
        let result = parse_log(content, &ParseOptions::default());

        assert_eq!(result.format.format, LogFormat::Atlassian);
        assert_eq!(result.total_lines, 2);
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].level, LogLevel::Error);
        assert_eq!(result.entries[1].level, LogLevel::Info);
        assert_eq!(result.entries[0].message, "boom");
        assert_eq!(result.entries[1].message, "ok");
        for entry in &result.entries {
            assert_eq!(entry.source.as_deref(), Some("com.foo.Bar"));
        }
    }

    #[test]
    fn test_single_json_scenario() {
        let result = parse_log(
            r#"{"level":"warn","msg":"disk low","ts":"2024-01-01T00:00:00Z"}"#,
            &ParseOptions::default(),
        );
        assert_eq!(result.format.format, LogFormat::Json);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].level, LogLevel::Warn);
        assert_eq!(result.entries[0].message, "disk low");
        assert_eq!(result.entries[0].timestamp.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_crlf_and_bom_are_normalized() {
        let content = "\u{FEFF}2024-01-15 10:30:45,123 ERROR [a] boom\r\n\tat x.Y.z(Y.java:1)\r\n";
        let result = parse_log(content, &ParseOptions::default());
        assert_eq!(result.format.format, LogFormat::Atlassian);
        // trailing newline yields a final empty line
        assert_eq!(result.total_lines, 3);
        assert_eq!(result.entries[0].raw, "2024-01-15 10:30:45,123 ERROR [a] boom\n\tat x.Y.z(Y.java:1)");
        assert!(!result.entries[0].raw.contains('\r'));
    }

    #[test]
    fn test_forced_format_skips_detection() {
        let options = ParseOptions::default().with_format(LogFormat::Plain);
        let result = parse_log(r#"{"level":"error","msg":"x"}"#, &options);
        assert_eq!(result.format, DetectionResult::forced(LogFormat::Plain));
        assert_eq!(result.format.confidence, 1.0);
        assert_eq!(result.format.sample_size, 0);
        assert_eq!(result.entries[0].level, LogLevel::Error);
    }

    #[test]
    fn test_without_raw_and_max_entries() {
        let options = ParseOptions::default().with_max_entries(2).without_raw();
        let result = parse_log("a\nb\nc\nd", &options);
        assert_eq!(result.entries.len(), 2);
        assert!(result.entries.iter().all(|entry| entry.raw.is_empty()));
        assert_eq!(result.stats.total_entries, 2);
        assert_eq!(result.total_lines, 4);
    }

    #[test]
    fn test_ndjson_reparse_of_raw_keeps_entry_count() {
        let content = "{\"level\":\"info\",\"msg\":\"a\"}\nnot json\n{\"level\":\"error\",\"msg\":\"b\"}\n{\"msg\":\"c\"}\n";
        let first = parse_log(content, &ParseOptions::default());
        assert_eq!(first.format.format, LogFormat::Ndjson);

        let rebuilt: Vec<&str> = first.entries.iter().map(|entry| entry.raw.as_str()).collect();
        let options = ParseOptions::default().with_format(first.format.format);
        let second = parse_log(&rebuilt.join("\n"), &options);
        assert_eq!(first.entries.len(), second.entries.len());
    }

    #[test]
    fn test_extract_issues() {
        let content = "\
2024-01-15 10:30:45,123 INFO [a] fine
2024-01-15 10:30:46,000 WARN [a] careful
2024-01-15 10:30:47,000 ERROR [a] broken
2024-01-15 10:30:48,000 DEBUG [a] noise";
        let issues = extract_issues(content);
        let messages: Vec<&str> = issues.iter().map(|entry| entry.message.as_str()).collect();
        assert_eq!(messages, vec!["careful", "broken"]);
    }

    #[test]
    fn test_level_counts_always_sum_to_total() {
        let inputs = [
            "",
            "plain\ntext",
            "2024-01-15 10:30:45,123 ERROR [a] x\n\tat y",
            "<34>Oct 11 22:14:15 h su: z\nnoise",
            "{\"level\":\"warn\"}\n{\"level\":\"oops\"}",
        ];
        for input in inputs {
            let result = parse_log(input, &ParseOptions::default());
            assert_eq!(result.stats.level_counts.values().sum::<usize>(), result.stats.total_entries);
        }
    }
}
