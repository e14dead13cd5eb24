use std::ops::ControlFlow;

use super::continuation::{self, ContinuationPattern};
use super::EntrySink;
use crate::model::{LogEntry, LogLevel};

/// Exception under construction: header plus accumulated frames.
struct PendingTrace<'a> {
    line_number: usize,
    message: String,
    source: Option<String>,
    stack_lines: Vec<&'a str>,
    raw_lines: Vec<&'a str>,
}

impl<'a> PendingTrace<'a> {
    fn open(line_number: usize, line: &'a str, message: String, source: Option<String>) -> Self {
        Self {
            line_number,
            message,
            source,
            stack_lines: Vec::new(),
            raw_lines: vec![line],
        }
    }

    fn attach(&mut self, line: &'a str) {
        self.stack_lines.push(line);
        self.raw_lines.push(line);
    }

    fn into_entry(self) -> LogEntry {
        LogEntry {
            line_number: self.line_number,
            timestamp: None,
            level: LogLevel::Error,
            message: self.message,
            source: self.source,
            stack_trace: (!self.stack_lines.is_empty()).then(|| self.stack_lines.join("\n")),
            raw: self.raw_lines.join("\n"),
        }
    }
}

enum LineAction<'a> {
    /// New exception header; flush whatever is open
    Open(PendingTrace<'a>),
    /// Frame, `Caused by:` or `... N more` for the open trace
    Attach,
    /// Frame with nothing to attach to
    Drop,
    /// Unrelated text; flush and emit as a standalone line
    Standalone,
    Skip,
}

fn classify_line<'a>(line_number: usize, line: &'a str, has_open: bool) -> LineAction<'a> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineAction::Skip;
    }

    if let Some(start) = continuation::exception_start(trimmed) {
        let source = Some(start.exception_type.to_string());
        return LineAction::Open(PendingTrace::open(line_number, line, start.summary(), source));
    }

    if continuation::is_caused_by(trimmed) {
        return if has_open {
            LineAction::Attach
        } else {
            LineAction::Standalone
        };
    }

    match continuation::classify(line) {
        Some(ContinuationPattern::StackFrame | ContinuationPattern::Ellipsis) => {
            return if has_open { LineAction::Attach } else { LineAction::Drop };
        }
        Some(ContinuationPattern::CausedBy) | None => {}
    }

    // e.g. `Exception in thread "main" java.lang.IllegalStateException: boom`
    if continuation::matches_signature(line) {
        return LineAction::Open(PendingTrace::open(line_number, line, trimmed.to_string(), None));
    }

    LineAction::Standalone
}

/// Groups exception headers with their stack frames. Any other text line
/// closes the open trace and becomes an `unknown` entry of its own.
pub fn parse(lines: &[&str], sink: &mut EntrySink) {
    if sink.is_full() {
        return;
    }

    let folded = lines.iter().copied().enumerate().try_fold(
        None::<PendingTrace<'_>>,
        |pending, (idx, line)| {
            let mut pending = pending;
            match classify_line(idx + 1, line, pending.is_some()) {
                LineAction::Skip | LineAction::Drop => {}
                LineAction::Attach => {
                    if let Some(trace) = pending.as_mut() {
                        trace.attach(line);
                    }
                }
                LineAction::Open(next) => {
                    if let Some(done) = pending.take() {
                        if !sink.push(done.into_entry()) {
                            return ControlFlow::Break(());
                        }
                    }
                    pending = Some(next);
                }
                LineAction::Standalone => {
                    if let Some(done) = pending.take() {
                        if !sink.push(done.into_entry()) {
                            return ControlFlow::Break(());
                        }
                    }
                    let mut entry = LogEntry::unknown(idx + 1, line);
                    entry.message = line.trim().to_string();
                    if !sink.push(entry) {
                        return ControlFlow::Break(());
                    }
                }
            }
            ControlFlow::Continue(pending)
        },
    );

    if let ControlFlow::Continue(Some(last)) = folded {
        sink.push(last.into_entry());
    }
}
