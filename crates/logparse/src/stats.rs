use std::collections::BTreeMap;

use crate::model::{LogEntry, LogLevel, LogStats, TimeRange};

/// Reduce parsed entries to a level histogram, time range and stack-trace
/// count.
///
/// Timestamps are compared as strings. Every parser emits zero-padded,
/// most-significant-first timestamps, so lexicographic order is time order
/// within one file.
pub fn compute_stats(entries: &[LogEntry]) -> LogStats {
    let mut level_counts: BTreeMap<LogLevel, usize> =
        LogLevel::ALL.iter().map(|level| (*level, 0)).collect();
    let mut time_range: Option<TimeRange> = None;
    let mut stack_trace_count = 0;

    for entry in entries {
        *level_counts.entry(entry.level).or_insert(0) += 1;

        if entry.stack_trace.is_some() {
            stack_trace_count += 1;
        }

        if let Some(ts) = entry.timestamp.as_deref() {
            match time_range.as_mut() {
                Some(range) => {
                    if ts < range.start.as_str() {
                        range.start = ts.to_string();
                    }
                    if ts > range.end.as_str() {
                        range.end = ts.to_string();
                    }
                }
                None => {
                    time_range = Some(TimeRange {
                        start: ts.to_string(),
                        end: ts.to_string(),
                    })
                }
            }
        }
    }

    LogStats {
        total_entries: entries.len(),
        level_counts,
        time_range,
        has_stack_traces: stack_trace_count > 0,
        stack_trace_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: LogLevel, timestamp: Option<&str>, stack: bool) -> LogEntry {
        LogEntry {
            line_number: 1,
            timestamp: timestamp.map(str::to_string),
            level,
            message: "m".to_string(),
            source: None,
            stack_trace: stack.then(|| "\tat x".to_string()),
            raw: "m".to_string(),
        }
    }

    #[test]
    fn test_empty_entries() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.level_counts.len(), 7);
        assert!(stats.level_counts.values().all(|count| *count == 0));
        assert_eq!(stats.time_range, None);
        assert!(!stats.has_stack_traces);
    }

    #[test]
    fn test_histogram_time_range_and_stacks() {
        let entries = vec![
            entry(LogLevel::Info, Some("2024-01-15T10:30:46"), false),
            entry(LogLevel::Error, Some("2024-01-15T10:30:45"), true),
            entry(LogLevel::Error, None, true),
            entry(LogLevel::Warn, Some("2024-01-16T00:00:00"), false),
        ];
        let stats = compute_stats(&entries);
        assert_eq!(stats.total_entries, 4);
        assert_eq!(stats.count(LogLevel::Error), 2);
        assert_eq!(stats.count(LogLevel::Info), 1);
        assert_eq!(stats.count(LogLevel::Fatal), 0);
        assert_eq!(stats.issue_count(), 3);
        assert_eq!(
            stats.time_range,
            Some(TimeRange {
                start: "2024-01-15T10:30:45".to_string(),
                end: "2024-01-16T00:00:00".to_string(),
            })
        );
        assert!(stats.has_stack_traces);
        assert_eq!(stats.stack_trace_count, 2);
    }

    #[test]
    fn test_level_counts_sum_to_total() {
        // Deterministic pseudo-random level sequences of varying length
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        for len in 0..64 {
            let entries: Vec<LogEntry> = (0..len)
                .map(|_| {
                    seed ^= seed << 13;
                    seed ^= seed >> 7;
                    seed ^= seed << 17;
                    let level = LogLevel::ALL[(seed % LogLevel::ALL.len() as u64) as usize];
                    entry(level, None, seed % 3 == 0)
                })
                .collect();
            let stats = compute_stats(&entries);
            assert_eq!(stats.level_counts.values().sum::<usize>(), stats.total_entries);
            assert_eq!(stats.total_entries, len);
        }
    }
}
