use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of log formats the detector can choose between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// A single JSON object
    Json,
    /// Newline-delimited JSON objects
    Ndjson,
    /// Syslog (RFC 3164 / RFC 5424)
    Syslog,
    /// Atlassian-style `YYYY-MM-DD HH:MM:SS,mmm LEVEL [source] message`
    Atlassian,
    /// Nginx combined access log
    Nginx,
    /// Apache combined access log (parsed identically to nginx)
    Apache,
    /// Bare Java exception output
    JavaStacktrace,
    /// Unstructured text fallback
    Plain,
}

impl LogFormat {
    pub const ALL: [LogFormat; 8] = [
        LogFormat::Json,
        LogFormat::Ndjson,
        LogFormat::Syslog,
        LogFormat::Atlassian,
        LogFormat::Nginx,
        LogFormat::Apache,
        LogFormat::JavaStacktrace,
        LogFormat::Plain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Json => "json",
            LogFormat::Ndjson => "ndjson",
            LogFormat::Syslog => "syslog",
            LogFormat::Atlassian => "atlassian",
            LogFormat::Nginx => "nginx",
            LogFormat::Apache => "apache",
            LogFormat::JavaStacktrace => "java-stacktrace",
            LogFormat::Plain => "plain",
        }
    }

    /// Human readable name used in prompt summaries.
    pub fn label(&self) -> &'static str {
        match self {
            LogFormat::Json => "JSON",
            LogFormat::Ndjson => "NDJSON",
            LogFormat::Syslog => "Syslog",
            LogFormat::Atlassian => "Atlassian (Jira/Confluence/Bitbucket)",
            LogFormat::Nginx => "Nginx Access Log",
            LogFormat::Apache => "Apache Access Log",
            LogFormat::JavaStacktrace => "Java Stack Trace",
            LogFormat::Plain => "Plain Text",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown log format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for LogFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        LogFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == wanted)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// Normalized severity. Variant order is severity order (most severe first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    Unknown,
}

impl LogLevel {
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Fatal,
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
        LogLevel::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Fatal => "fatal",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
            LogLevel::Unknown => "unknown",
        }
    }

    pub fn as_upper(&self) -> &'static str {
        match self {
            LogLevel::Fatal => "FATAL",
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
            LogLevel::Unknown => "UNKNOWN",
        }
    }

    /// Map a free-form level string onto the closed level set.
    ///
    /// Case-insensitive; anything not in the table is `Unknown`.
    pub fn normalize(raw: &str) -> LogLevel {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fatal" | "critical" | "emergency" | "emerg" => LogLevel::Fatal,
            "error" | "err" | "severe" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "info" | "information" | "notice" => LogLevel::Info,
            "debug" | "fine" => LogLevel::Debug,
            "trace" | "finest" | "verbose" => LogLevel::Trace,
            _ => LogLevel::Unknown,
        }
    }

    /// Fatal, error and warn entries are retained first under budget pressure.
    pub fn is_issue(&self) -> bool {
        matches!(self, LogLevel::Fatal | LogLevel::Error | LogLevel::Warn)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical log record, possibly folded from several physical lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// 1-based number of the first physical line of the entry
    pub line_number: usize,
    pub timestamp: Option<String>,
    pub level: LogLevel,
    pub message: String,
    /// Logger, class, host or program that emitted the entry
    pub source: Option<String>,
    pub stack_trace: Option<String>,
    /// Every physical line folded into this entry, newline-joined
    pub raw: String,
}

impl LogEntry {
    /// Entry for a line that did not match its format's pattern.
    pub fn unknown(line_number: usize, line: &str) -> Self {
        Self {
            line_number,
            timestamp: None,
            level: LogLevel::Unknown,
            message: line.to_string(),
            source: None,
            stack_trace: None,
            raw: line.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub format: LogFormat,
    /// Share of sampled lines that matched the chosen signature (0.0 - 1.0)
    pub confidence: f32,
    /// Number of non-blank lines sampled
    pub sample_size: usize,
}

impl DetectionResult {
    pub fn new(format: LogFormat, confidence: f32, sample_size: usize) -> Self {
        Self {
            format,
            confidence: confidence.clamp(0.0, 1.0),
            sample_size,
        }
    }

    /// Nothing to sample: plain text with zero confidence.
    pub fn empty() -> Self {
        Self::new(LogFormat::Plain, 0.0, 0)
    }

    /// Caller-chosen format, detection skipped.
    pub fn forced(format: LogFormat) -> Self {
        Self::new(format, 1.0, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStats {
    pub total_entries: usize,
    /// Always holds all seven levels, zero-filled
    pub level_counts: BTreeMap<LogLevel, usize>,
    pub time_range: Option<TimeRange>,
    pub has_stack_traces: bool,
    pub stack_trace_count: usize,
}

impl LogStats {
    pub fn count(&self, level: LogLevel) -> usize {
        self.level_counts.get(&level).copied().unwrap_or(0)
    }

    pub fn issue_count(&self) -> usize {
        LogLevel::ALL
            .iter()
            .filter(|level| level.is_issue())
            .map(|level| self.count(*level))
            .sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub format: DetectionResult,
    /// Physical lines after normalization
    pub total_lines: usize,
    pub entries: Vec<LogEntry>,
    pub stats: LogStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Skip detection and parse as this format
    pub format: Option<LogFormat>,
    /// Stop after this many entries
    pub max_entries: Option<usize>,
    /// When false, `raw` is blanked on every entry
    pub include_raw: bool,
    /// Non-blank leading lines inspected by the detector
    pub sample_size: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            format: None,
            max_entries: None,
            include_raw: true,
            sample_size: crate::DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl ParseOptions {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn without_raw(mut self) -> Self {
        self.include_raw = false;
        self
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names_round_trip_through_from_str() {
        for format in LogFormat::ALL {
            assert_eq!(format.as_str().parse::<LogFormat>(), Ok(format));
        }
        assert_eq!("Java-StackTrace".parse::<LogFormat>(), Ok(LogFormat::JavaStacktrace));
    }

    #[test]
    fn test_unknown_format_name_is_rejected() {
        let err = "logfmt".parse::<LogFormat>().unwrap_err();
        assert_eq!(err, UnknownFormat("logfmt".to_string()));
        assert_eq!(err.to_string(), "Unknown log format: logfmt");
    }

    #[test]
    fn test_format_serializes_kebab_case() {
        let json = serde_json::to_string(&LogFormat::JavaStacktrace).unwrap();
        assert_eq!(json, "\"java-stacktrace\"");
    }

    #[test]
    fn test_level_normalization_table() {
        let cases = [
            ("FATAL", LogLevel::Fatal),
            ("critical", LogLevel::Fatal),
            ("Emergency", LogLevel::Fatal),
            ("emerg", LogLevel::Fatal),
            ("error", LogLevel::Error),
            ("ERR", LogLevel::Error),
            ("severe", LogLevel::Error),
            ("warn", LogLevel::Warn),
            ("Warning", LogLevel::Warn),
            ("info", LogLevel::Info),
            ("information", LogLevel::Info),
            ("notice", LogLevel::Info),
            ("debug", LogLevel::Debug),
            ("FINE", LogLevel::Debug),
            ("trace", LogLevel::Trace),
            ("finest", LogLevel::Trace),
            ("verbose", LogLevel::Trace),
            ("banana", LogLevel::Unknown),
            ("", LogLevel::Unknown),
        ];

        for (raw, expected) in cases {
            assert_eq!(LogLevel::normalize(raw), expected, "level {:?}", raw);
        }
    }

    #[test]
    fn test_issue_levels() {
        let issues: Vec<LogLevel> = LogLevel::ALL.into_iter().filter(|l| l.is_issue()).collect();
        assert_eq!(issues, vec![LogLevel::Fatal, LogLevel::Error, LogLevel::Warn]);
    }

    #[test]
    fn test_detection_result_clamps_confidence() {
        assert_eq!(DetectionResult::new(LogFormat::Json, 1.7, 3).confidence, 1.0);
        assert_eq!(DetectionResult::new(LogFormat::Json, -0.2, 3).confidence, 0.0);
    }

    #[test]
    fn test_parse_options_builders() {
        let opts = ParseOptions::default()
            .with_format(LogFormat::Syslog)
            .with_max_entries(10)
            .without_raw();
        assert_eq!(opts.format, Some(LogFormat::Syslog));
        assert_eq!(opts.max_entries, Some(10));
        assert!(!opts.include_raw);
        assert!(ParseOptions::default().include_raw);
    }
}
