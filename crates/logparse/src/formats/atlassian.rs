use std::ops::ControlFlow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::continuation::{classify, exception_start};
use super::EntrySink;
use crate::model::{LogEntry, LogLevel};

static SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2},\d{3}\s+(?:TRACE|DEBUG|INFO|WARN|ERROR|FATAL)\s+\[")
        .expect("atlassian signature")
});

/// `YYYY-MM-DD HH:MM:SS,mmm LEVEL [source] message`
static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4}-\d{2}-\d{2})\s+(\d{2}:\d{2}:\d{2}),(\d{3})\s+(TRACE|DEBUG|INFO|WARN|ERROR|FATAL)\s+\[([^\]]+)\]\s*(.*)",
    )
    .expect("atlassian header")
});

/// Detector signature: the header prefix up to the opening `[` of the source.
pub fn matches_signature(line: &str) -> bool {
    SIGNATURE.is_match(line)
}

enum Continuation {
    Stack,
    Message,
}

/// Entry under construction. Owns nothing but the header fields; the
/// continuation lines borrow from the input.
struct PendingEntry<'a> {
    line_number: usize,
    timestamp: String,
    level: LogLevel,
    source: String,
    message: String,
    message_lines: Vec<&'a str>,
    stack_lines: Vec<&'a str>,
    raw_lines: Vec<&'a str>,
    /// Blank lines seen since the last non-blank line. Folded in only if
    /// another continuation line follows.
    blank_run: Vec<&'a str>,
}

impl<'a> PendingEntry<'a> {
    fn open(line_number: usize, line: &'a str, caps: &Captures<'_>) -> Self {
        let part = |i: usize| caps.get(i).map_or("", |m| m.as_str());

        Self {
            line_number,
            timestamp: format!("{}T{}.{}", part(1), part(2), part(3)),
            level: LogLevel::normalize(part(4)),
            source: part(5).to_string(),
            message: part(6).to_string(),
            message_lines: Vec::new(),
            stack_lines: Vec::new(),
            raw_lines: vec![line],
            blank_run: Vec::new(),
        }
    }

    fn fold(&mut self, line: &'a str) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            self.blank_run.push(line);
            return;
        }

        let kind = if classify(line).is_some() || exception_start(trimmed).is_some() {
            Continuation::Stack
        } else {
            Continuation::Message
        };
        let target = match kind {
            Continuation::Stack => &mut self.stack_lines,
            Continuation::Message => &mut self.message_lines,
        };

        target.extend(self.blank_run.iter().copied());
        target.push(line);
        self.raw_lines.append(&mut self.blank_run);
        self.raw_lines.push(line);
    }

    fn into_entry(self) -> LogEntry {
        let mut message = self.message;
        if !self.message_lines.is_empty() {
            message.push('\n');
            message.push_str(&self.message_lines.join("\n"));
        }

        LogEntry {
            line_number: self.line_number,
            timestamp: Some(self.timestamp),
            level: self.level,
            message,
            source: Some(self.source),
            stack_trace: (!self.stack_lines.is_empty()).then(|| self.stack_lines.join("\n")),
            raw: self.raw_lines.join("\n"),
        }
    }
}

/// Multi-line parse: an entry starts only on a header line and absorbs every
/// line up to the next header. Lines before the first header are ignored.
pub fn parse(lines: &[&str], sink: &mut EntrySink) {
    if sink.is_full() {
        return;
    }

    let folded = lines.iter().copied().enumerate().try_fold(
        None::<PendingEntry<'_>>,
        |pending, (idx, line)| match HEADER.captures(line) {
            Some(caps) => {
                if let Some(done) = pending {
                    if !sink.push(done.into_entry()) {
                        return ControlFlow::Break(());
                    }
                }
                ControlFlow::Continue(Some(PendingEntry::open(idx + 1, line, &caps)))
            }
            None => {
                let mut pending = pending;
                if let Some(entry) = pending.as_mut() {
                    entry.fold(line);
                }
                ControlFlow::Continue(pending)
            }
        },
    );

    if let ControlFlow::Continue(Some(last)) = folded {
        sink.push(last.into_entry());
    }
}
