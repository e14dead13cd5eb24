use std::sync::LazyLock;

use regex::Regex;

use super::EntrySink;
use crate::model::{LogEntry, LogLevel};

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}[-/]\d{2}[-/]\d{2}[\sT]\d{2}:\d{2}:\d{2}(?:[.,]\d{1,6})?(?:Z|[+-]\d{2}:?\d{2})?")
        .expect("generic timestamp")
});

static LEVEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(FATAL|CRITICAL|EMERGENCY|ERROR|ERR|WARN(?:ING)?|INFO|NOTICE|DEBUG|TRACE)\b")
        .expect("generic level")
});

static LEADING_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\-:|\[\]]+").expect("leading separators"));

/// Fallback parser. Every non-blank line becomes an entry; a timestamp and a
/// level keyword are picked out when present.
pub fn parse(lines: &[&str], sink: &mut EntrySink) {
    for (idx, line) in lines.iter().enumerate() {
        if sink.is_full() {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        if !sink.push(parse_line(idx + 1, line)) {
            break;
        }
    }
}

fn parse_line(line_number: usize, line: &str) -> LogEntry {
    let ts_match = TIMESTAMP.find(line);
    let level_match = LEVEL.captures(line).and_then(|caps| caps.get(1));

    let timestamp = ts_match.map(|m| {
        m.as_str()
            .replacen(char::is_whitespace, "T", 1)
            .replacen(',', ".", 1)
    });
    let level = level_match
        .map(|m| LogLevel::normalize(m.as_str()))
        .unwrap_or(LogLevel::Unknown);

    // Cut the matched ranges out, right-most first so offsets stay valid
    let mut remainder = line.to_string();
    let mut ranges: Vec<_> = ts_match
        .map(|m| m.range())
        .into_iter()
        .chain(level_match.map(|m| m.range()))
        .collect();
    ranges.sort_by_key(|range| std::cmp::Reverse(range.start));
    for range in ranges {
        remainder = cut_span(&remainder, range);
    }

    let message = LEADING_SEPARATORS.replace(remainder.trim(), "");
    let message = match message.trim() {
        "" => line.trim().to_string(),
        stripped => stripped.to_string(),
    };

    LogEntry {
        line_number,
        timestamp,
        level,
        message,
        source: None,
        stack_trace: None,
        raw: line.to_string(),
    }
}

/// Remove `range`, joining the text on either side with one space.
fn cut_span(text: &str, range: std::ops::Range<usize>) -> String {
    let before = text[..range.start].trim_end();
    let after = text[range.end..].trim_start();
    match (before.is_empty(), after.is_empty()) {
        (true, _) => after.to_string(),
        (_, true) => before.to_string(),
        _ => format!("{} {}", before, after),
    }
}
