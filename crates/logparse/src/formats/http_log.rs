use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{month_number, EntrySink};
use crate::model::{LogEntry, LogLevel};

static SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\S+\s+\S+\s+\S+\s+\[\d{2}/\w{3}/\d{4}:\d{2}:\d{2}:\d{2}\s+[+-]\d{4}\]\s+""#)
        .expect("access log signature")
});

// Format: host ident authuser [date] "request" status bytes ["referrer" ["user-agent"]]
// Example: 127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET /apache_pb.gif HTTP/1.0" 200 2326
static COMBINED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(\S+)\s+(\S+)\s+(\S+)\s+\[(\d{2}/\w{3}/\d{4}:\d{2}:\d{2}:\d{2}\s+[+-]\d{4})\]\s+"(\S+)\s+(.*?)\s+(\S+)"\s+(\d{3})\s+(\S+)(?:\s+"([^"]*)")?(?:\s+"([^"]*)")?"#,
    )
    .expect("combined log pattern")
});

static WEB_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2})/(\w{3})/(\d{4}):(\d{2}:\d{2}:\d{2})\s+([+-]\d{2})(\d{2})$").expect("web timestamp")
});

/// Detector signature: host, ident and user followed by a bracketed
/// `DD/Mon/YYYY:HH:MM:SS ±ZZZZ` date and the opening quote of the request.
pub fn matches_signature(line: &str) -> bool {
    SIGNATURE.is_match(line)
}

/// 5xx is an error, 4xx a warning, everything else informational.
pub fn http_status_to_level(status: u16) -> LogLevel {
    if status >= 500 {
        LogLevel::Error
    } else if status >= 400 {
        LogLevel::Warn
    } else {
        LogLevel::Info
    }
}

/// `15/Jan/2024:10:30:45 +0900` -> `2024-01-15T10:30:45+09:00`
pub fn parse_web_timestamp(raw: &str) -> Option<String> {
    let caps = WEB_TIMESTAMP.captures(raw.trim())?;
    let month = month_number(&caps[2])?;
    Some(format!(
        "{}-{}-{}T{}{}:{}",
        &caps[3], month, &caps[1], &caps[4], &caps[5], &caps[6]
    ))
}

/// One entry per non-blank line; lines that are not access log records are
/// kept as `unknown` entries.
pub fn parse(lines: &[&str], sink: &mut EntrySink) {
    for (idx, line) in lines.iter().enumerate() {
        if sink.is_full() {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let entry = COMBINED
            .captures(line)
            .and_then(|caps| from_combined(idx + 1, line, &caps))
            .unwrap_or_else(|| LogEntry::unknown(idx + 1, line));

        if !sink.push(entry) {
            break;
        }
    }
}

fn from_combined(line_number: usize, line: &str, caps: &Captures<'_>) -> Option<LogEntry> {
    let status: u16 = caps[8].parse().ok()?;
    let size = match &caps[9] {
        "-" => 0,
        other => other.parse::<u64>().unwrap_or(0),
    };

    Some(LogEntry {
        line_number,
        timestamp: parse_web_timestamp(&caps[4]),
        level: http_status_to_level(status),
        message: format!("{} {} {} {}", &caps[5], &caps[6], status, size),
        source: Some(caps[1].to_string()),
        stack_trace: None,
        raw: line.to_string(),
    })
}
