use std::sync::LazyLock;

use chrono::Datelike;
use regex::{Captures, Regex};

use super::{month_number, EntrySink};
use crate::model::{LogEntry, LogLevel};

static SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<\d{1,3}>(?:\d\s+\d{4}-|[A-Z][a-z]{2}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})")
        .expect("syslog signature")
});

/// `[<PRI>]VERSION TIMESTAMP HOST APP PROCID MSGID rest`
static RFC5424: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:<(\d{1,3})>)?(\d)\s+(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:\d{2}))\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s*(.*)",
    )
    .expect("rfc5424 pattern")
});

/// `[<PRI>]Mon D HH:MM:SS HOST TAG[PID]: message`
static RFC3164: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:<(\d{1,3})>)?([A-Z][a-z]{2})\s+(\d{1,2})\s+(\d{2}:\d{2}:\d{2})\s+(\S+)\s+(\S+?)(?:\[(\d+)\])?\s*:\s*(.*)",
    )
    .expect("rfc3164 pattern")
});

/// Detector signature: priority prefix followed by either timestamp style.
pub fn matches_signature(line: &str) -> bool {
    SIGNATURE.is_match(line)
}

/// Severity is the low three bits of the priority (RFC 5424 §6.2.1).
pub fn priority_to_level(priority: u32) -> LogLevel {
    match priority % 8 {
        0..=2 => LogLevel::Fatal,
        3 => LogLevel::Error,
        4 => LogLevel::Warn,
        5 | 6 => LogLevel::Info,
        _ => LogLevel::Debug,
    }
}

/// One entry per non-blank line. RFC 3164 timestamps carry no year, so the
/// current year is assumed.
pub fn parse(lines: &[&str], sink: &mut EntrySink) {
    parse_with_year(lines, sink, chrono::Utc::now().year());
}

/// As [`parse`], with an explicit year for RFC 3164 timestamps.
pub fn parse_with_year(lines: &[&str], sink: &mut EntrySink, year: i32) {
    for (idx, line) in lines.iter().enumerate() {
        if sink.is_full() {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let line_number = idx + 1;
        let entry = RFC5424
            .captures(line)
            .map(|caps| from_rfc5424(line_number, line, &caps))
            .or_else(|| {
                RFC3164
                    .captures(line)
                    .map(|caps| from_rfc3164(line_number, line, &caps, year))
            })
            .unwrap_or_else(|| LogEntry::unknown(line_number, line));

        if !sink.push(entry) {
            break;
        }
    }
}

fn level_from_priority(caps: &Captures<'_>) -> LogLevel {
    caps.get(1)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(priority_to_level)
        .unwrap_or(LogLevel::Info)
}

fn from_rfc5424(line_number: usize, line: &str, caps: &Captures<'_>) -> LogEntry {
    let app = caps.get(5).map_or("-", |m| m.as_str());
    let proc_id = caps.get(6).map_or("-", |m| m.as_str());
    let rest = caps.get(8).map_or("", |m| m.as_str());

    LogEntry {
        line_number,
        timestamp: caps.get(3).map(|m| m.as_str().to_string()),
        level: level_from_priority(caps),
        message: strip_structured_data(rest).to_string(),
        source: Some(format!("{}[{}]", app, proc_id)),
        stack_trace: None,
        raw: line.to_string(),
    }
}

fn from_rfc3164(line_number: usize, line: &str, caps: &Captures<'_>, year: i32) -> LogEntry {
    let timestamp = match (caps.get(2), caps.get(3), caps.get(4)) {
        (Some(month), Some(day), Some(time)) => month_number(month.as_str()).map(|month| {
            format!("{}-{}-{:0>2}T{}", year, month, day.as_str(), time.as_str())
        }),
        _ => None,
    };

    LogEntry {
        line_number,
        timestamp,
        level: level_from_priority(caps),
        message: caps.get(8).map_or("", |m| m.as_str()).to_string(),
        source: caps
            .get(6)
            .map(|m| m.as_str().to_string())
            .filter(|s| !s.is_empty()),
        stack_trace: None,
        raw: line.to_string(),
    }
}

/// Drop the RFC 5424 STRUCTURED-DATA element (`-` or `[...]` blocks) that
/// precedes the free-form message.
fn strip_structured_data(rest: &str) -> &str {
    let rest = rest.trim_start();
    if let Some(after_nil) = rest.strip_prefix('-') {
        if after_nil.is_empty() || after_nil.starts_with(char::is_whitespace) {
            return after_nil.trim_start();
        }
        return rest;
    }
    if !rest.starts_with('[') {
        return rest;
    }

    // Walk consecutive [..] elements, honouring backslash escapes in values
    let mut depth = 0usize;
    let mut escaped = false;
    let mut end = 0usize;
    for (i, c) in rest.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' if depth == 0 => depth = 1,
            ']' if depth == 1 => {
                depth = 0;
                end = i + 1;
            }
            c if depth == 0 && c.is_whitespace() => break,
            _ if depth == 0 => return rest,
            _ => {}
        }
    }

    if depth != 0 {
        return rest;
    }
    rest[end..].trim_start()
}
