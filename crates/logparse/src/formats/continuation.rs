//! Stack-trace continuation detection shared by the multi-line parsers.
//!
//! Java-style traces are the only continuation shape the multi-line formats
//! care about: `at` frames, `Caused by:` chains, `... N more` elisions, and
//! the exception header line itself.

use std::sync::LazyLock;

use regex::Regex;

static FRAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+at\s+").expect("frame pattern"));

static CAUSED_BY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Caused by:\s+").expect("caused-by pattern"));

static ELLIPSIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+\.\.\.\s+\d+\s+more").expect("ellipsis pattern"));

static EXCEPTION_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w.$]*(?:Exception|Error|Throwable))(?::\s*(.*))?$").expect("exception pattern")
});

static EXCEPTION_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:Exception|Error)(?::\s|\s+at\s)").expect("exception mention pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuationPattern {
    StackFrame,
    CausedBy,
    Ellipsis,
}

/// Indented `at ...` frame.
pub fn is_stack_frame(line: &str) -> bool {
    FRAME.is_match(line)
}

/// `Caused by: ...` at the start of `line` (callers decide whether to trim).
pub fn is_caused_by(line: &str) -> bool {
    CAUSED_BY.is_match(line)
}

/// Indented `... N more`.
pub fn is_ellipsis(line: &str) -> bool {
    ELLIPSIS.is_match(line)
}

/// Classify a raw line as a stack-trace continuation.
pub fn classify(line: &str) -> Option<ContinuationPattern> {
    if is_stack_frame(line) {
        Some(ContinuationPattern::StackFrame)
    } else if is_caused_by(line) {
        Some(ContinuationPattern::CausedBy)
    } else if is_ellipsis(line) {
        Some(ContinuationPattern::Ellipsis)
    } else {
        None
    }
}

/// Exception header split into its type and optional message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionStart<'a> {
    pub exception_type: &'a str,
    pub message: Option<&'a str>,
}

impl ExceptionStart<'_> {
    /// `Type: message`, or just `Type` when there is no message.
    pub fn summary(&self) -> String {
        match self.message {
            Some(message) if !message.is_empty() => format!("{}: {}", self.exception_type, message),
            _ => self.exception_type.to_string(),
        }
    }
}

/// Match an exception header such as `java.lang.IllegalStateException: boom`.
///
/// Expects a trimmed line.
pub fn exception_start(line: &str) -> Option<ExceptionStart<'_>> {
    let caps = EXCEPTION_START.captures(line)?;
    let exception_type = caps.get(1)?.as_str();
    let message = caps.get(2).map(|m| m.as_str());
    Some(ExceptionStart { exception_type, message })
}

/// Detector signature: a frame line, or an exception mentioned with a
/// message or an inline frame.
pub fn matches_signature(line: &str) -> bool {
    is_stack_frame(line) || EXCEPTION_MENTION.is_match(line)
}
