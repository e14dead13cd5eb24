use serde_json::{Map, Value};

use super::EntrySink;
use crate::model::{LogEntry, LogLevel};

const TIMESTAMP_FIELDS: &[&str] = &["timestamp", "time", "@timestamp", "ts", "date", "datetime", "eventTime"];
const LEVEL_FIELDS: &[&str] = &["level", "severity", "loglevel", "log_level", "priority", "lvl"];
const MESSAGE_FIELDS: &[&str] = &["message", "msg", "text", "log", "body"];
const SOURCE_FIELDS: &[&str] = &["logger", "source", "class", "module", "component", "logger_name"];
const STACK_FIELDS: &[&str] = &["stackTrace", "stack_trace", "stack", "exception", "error.stack", "stacktrace"];

/// Detector signature: a line that is a single `{ ... }` object.
pub fn matches_signature(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 2 && trimmed.starts_with('{') && trimmed.ends_with('}')
}

/// One entry per line holding a JSON object.
///
/// Blank lines, unparsable lines and non-object values are skipped; this
/// format assumes each line is well formed.
pub fn parse(lines: &[&str], sink: &mut EntrySink) {
    for (idx, line) in lines.iter().enumerate() {
        if sink.is_full() {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let obj = match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(obj)) => obj,
            Ok(_) => continue,
            Err(e) => {
                tracing::trace!(line = idx + 1, error = %e, "skipping unparsable json line");
                continue;
            }
        };

        if !sink.push(entry_from_object(idx + 1, line, &obj)) {
            break;
        }
    }
}

fn entry_from_object(line_number: usize, raw: &str, obj: &Map<String, Value>) -> LogEntry {
    let level = find_field(obj, LEVEL_FIELDS)
        .map(|v| LogLevel::normalize(&stringify(v)))
        .unwrap_or(LogLevel::Unknown);

    let message = find_field(obj, MESSAGE_FIELDS)
        .map(stringify)
        .unwrap_or_else(|| {
            serde_json::to_string(obj).unwrap_or_else(|_| raw.trim().to_string())
        });

    LogEntry {
        line_number,
        timestamp: find_field(obj, TIMESTAMP_FIELDS).map(stringify),
        level,
        message,
        source: find_field(obj, SOURCE_FIELDS).map(stringify),
        stack_trace: find_field(obj, STACK_FIELDS).map(stringify),
        raw: raw.to_string(),
    }
}

/// Resolve the first present candidate: exact key match over the whole list,
/// then a case-insensitive pass over the object's keys.
///
/// Falsy values (`null`, `false`, `0`, `""`) count as absent.
fn find_field<'a>(obj: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Value> {
    let found = candidates
        .iter()
        .find_map(|key| obj.get(*key))
        .or_else(|| {
            obj.iter()
                .find(|(key, _)| candidates.iter().any(|c| c.eq_ignore_ascii_case(key)))
                .map(|(_, value)| value)
        })?;

    if is_falsy(found) {
        None
    } else {
        Some(found)
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        // Nested structures are kept as compact JSON
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
