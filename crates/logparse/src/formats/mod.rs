/// Individual log format parsers
///
/// Every parser has the same shape: it walks a slice of normalized physical
/// lines and pushes [`LogEntry`] values into an [`EntrySink`]. Dispatch is a
/// plain `match` on [`LogFormat`]; there is no parser trait object.

pub mod atlassian;
pub mod continuation;
pub mod http_log;
pub mod java;
pub mod json;
pub mod plain;
pub mod syslog;

use crate::model::{LogEntry, LogFormat};

pub use http_log::http_status_to_level;

/// Parse `lines` as `format`, stopping once `max_entries` entries exist.
pub fn parse_lines(format: LogFormat, lines: &[&str], max_entries: Option<usize>) -> Vec<LogEntry> {
    let mut sink = EntrySink::new(max_entries);

    match format {
        LogFormat::Json | LogFormat::Ndjson => json::parse(lines, &mut sink),
        LogFormat::Syslog => syslog::parse(lines, &mut sink),
        LogFormat::Atlassian => atlassian::parse(lines, &mut sink),
        LogFormat::Nginx | LogFormat::Apache => http_log::parse(lines, &mut sink),
        LogFormat::JavaStacktrace => java::parse(lines, &mut sink),
        LogFormat::Plain => plain::parse(lines, &mut sink),
    }

    tracing::trace!(format = %format, entries = sink.len(), "parsed lines");
    sink.into_entries()
}

/// Bounded collector for parsed entries.
///
/// Parsers push completed entries and stop as soon as `push` reports the sink
/// is full, which guarantees `len() <= limit`.
#[derive(Debug)]
pub struct EntrySink {
    entries: Vec<LogEntry>,
    limit: Option<usize>,
}

impl EntrySink {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    /// Add an entry. Returns `false` once no further entries are wanted.
    ///
    /// An entry offered to an already full sink is discarded.
    pub fn push(&mut self, entry: LogEntry) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries.push(entry);
        !self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.entries.len() >= limit)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }
}

const MONTHS: [(&str, &str); 12] = [
    ("Jan", "01"), ("Feb", "02"), ("Mar", "03"), ("Apr", "04"),
    ("May", "05"), ("Jun", "06"), ("Jul", "07"), ("Aug", "08"),
    ("Sep", "09"), ("Oct", "10"), ("Nov", "11"), ("Dec", "12"),
];

/// Two-digit month number for an English three-letter month abbreviation.
pub(crate) fn month_number(name: &str) -> Option<&'static str> {
    MONTHS
        .iter()
        .find(|(abbr, _)| *abbr == name)
        .map(|(_, number)| *number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LogLevel;

    #[test]
    fn test_sink_respects_limit() {
        let mut sink = EntrySink::new(Some(2));
        assert!(sink.push(LogEntry::unknown(1, "a")));
        assert!(!sink.push(LogEntry::unknown(2, "b")));
        assert!(!sink.push(LogEntry::unknown(3, "c")));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_sink_zero_limit_accepts_nothing() {
        let mut sink = EntrySink::new(Some(0));
        assert!(sink.is_full());
        assert!(!sink.push(LogEntry::unknown(1, "a")));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_sink_unbounded() {
        let mut sink = EntrySink::new(None);
        for n in 1..=100 {
            assert!(sink.push(LogEntry::unknown(n, "x")));
        }
        assert_eq!(sink.len(), 100);
    }

    #[test]
    fn test_month_number() {
        assert_eq!(month_number("Jan"), Some("01"));
        assert_eq!(month_number("Dec"), Some("12"));
        assert_eq!(month_number("jan"), None);
        assert_eq!(month_number("Foo"), None);
    }

    #[test]
    fn test_dispatch_apache_and_nginx_share_parser() {
        let lines = [r#"10.0.0.1 - - [01/Feb/2026:12:00:00 +0000] "GET /crash HTTP/1.1" 500 0"#];
        let nginx = parse_lines(LogFormat::Nginx, &lines, None);
        let apache = parse_lines(LogFormat::Apache, &lines, None);
        assert_eq!(nginx, apache);
        assert_eq!(nginx[0].level, LogLevel::Error);
    }

    #[test]
    fn test_dispatch_honours_max_entries_for_every_format() {
        let lines = ["one", "two", "three", "four"];
        for format in LogFormat::ALL {
            let entries = parse_lines(format, &lines, Some(2));
            assert!(entries.len() <= 2, "{} produced {} entries", format, entries.len());
        }
    }
}
