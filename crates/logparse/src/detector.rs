use crate::formats::{atlassian, continuation, http_log, json, syslog};
use crate::model::{DetectionResult, LogFormat};

/// JSON lines win outright at or above this share of the sample.
const JSON_THRESHOLD: f32 = 0.5;
/// Any other signature needs at least this share.
const SIGNATURE_THRESHOLD: f32 = 0.3;

/// Line-level signature classes tallied by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signature {
    Atlassian,
    Syslog,
    WebAccess,
    JavaStack,
}

impl Signature {
    /// Tie-break order: earlier wins when match counts are equal.
    const PRIORITY: [Signature; 4] = [
        Signature::Atlassian,
        Signature::Syslog,
        Signature::WebAccess,
        Signature::JavaStack,
    ];

    fn matches(&self, line: &str) -> bool {
        match self {
            Signature::Atlassian => atlassian::matches_signature(line),
            Signature::Syslog => syslog::matches_signature(line),
            Signature::WebAccess => http_log::matches_signature(line),
            Signature::JavaStack => continuation::matches_signature(line),
        }
    }

    fn format(&self) -> LogFormat {
        match self {
            Signature::Atlassian => LogFormat::Atlassian,
            Signature::Syslog => LogFormat::Syslog,
            // Nginx and Apache share the combined format; report the former
            Signature::WebAccess => LogFormat::Nginx,
            Signature::JavaStack => LogFormat::JavaStacktrace,
        }
    }
}

/// Guess the format of normalized `content` from its first `sample_size`
/// non-blank lines.
///
/// Every sampled line is tested against each signature independently, so one
/// line may count towards several classes.
pub fn detect_format(content: &str, sample_size: usize) -> DetectionResult {
    let sample: Vec<&str> = content
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .take(sample_size)
        .collect();

    if sample.is_empty() {
        return DetectionResult::empty();
    }

    let total = sample.len();
    let ratio = |count: usize| count as f32 / total as f32;

    let json_count = sample.iter().filter(|line| json::matches_signature(line)).count();
    if ratio(json_count) >= JSON_THRESHOLD {
        let format = if json_count > 1 { LogFormat::Ndjson } else { LogFormat::Json };
        let result = DetectionResult::new(format, ratio(json_count), total);
        tracing::debug!(format = %result.format, confidence = result.confidence, sample = total, "detected format");
        return result;
    }

    // max_by_key keeps the last maximum; iterate in reverse priority so ties
    // resolve to the highest-priority signature
    let (best, best_count) = Signature::PRIORITY
        .iter()
        .rev()
        .map(|signature| {
            let count = sample.iter().filter(|line| signature.matches(line)).count();
            (*signature, count)
        })
        .max_by_key(|(_, count)| *count)
        .unwrap_or((Signature::Atlassian, 0));

    let result = if best_count > 0 && ratio(best_count) >= SIGNATURE_THRESHOLD {
        DetectionResult::new(best.format(), ratio(best_count), total)
    } else {
        DetectionResult::new(LogFormat::Plain, 1.0, total)
    };

    tracing::debug!(format = %result.format, confidence = result.confidence, sample = total, "detected format");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_SAMPLE_SIZE;

    const WEB: &str = r#"10.0.0.1 - - [15/Jan/2024:10:30:45 +0000] "GET /index.html HTTP/1.1" 200 512 "-" "curl/8.0""#;

    #[test]
    fn test_empty_and_blank_input() {
        assert_eq!(detect_format("", DEFAULT_SAMPLE_SIZE), DetectionResult::empty());
        assert_eq!(detect_format("\n  \n\t\n", DEFAULT_SAMPLE_SIZE), DetectionResult::empty());
    }

    #[test]
    fn test_single_json_line() {
        let result = detect_format(r#"{"level":"info","msg":"hi"}"#, DEFAULT_SAMPLE_SIZE);
        assert_eq!(result.format, LogFormat::Json);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.sample_size, 1);
    }

    #[test]
    fn test_ndjson_with_some_noise() {
        let content = [
            r#"{"level":"info","msg":"a"}"#,
            "garbage",
            r#"{"level":"info","msg":"b"}"#,
            r#"{"level":"info","msg":"c"}"#,
        ]
        .join("\n");
        let result = detect_format(&content, DEFAULT_SAMPLE_SIZE);
        assert_eq!(result.format, LogFormat::Ndjson);
        assert_eq!(result.confidence, 0.75);
    }

    #[test]
    fn test_fifty_web_lines_are_nginx() {
        let content = vec![WEB; 50].join("\n");
        let result = detect_format(&content, DEFAULT_SAMPLE_SIZE);
        assert_eq!(result.format, LogFormat::Nginx);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.sample_size, 50);
    }

    #[test]
    fn test_atlassian_with_stack_trace() {
        let content = "\
2024-01-15 10:30:45,123 ERROR [main] [c.a.jira] Failure
java.lang.IllegalStateException: bad
\tat com.atlassian.Foo.bar(Foo.java:1)
\tat com.atlassian.Foo.baz(Foo.java:2)
2024-01-15 10:30:46,000 INFO [main] [c.a.jira] Recovered
2024-01-15 10:30:47,000 INFO [main] [c.a.jira] Done";
        // 3 header lines vs 3 java lines out of 6: the tie goes to atlassian
        let result = detect_format(content, DEFAULT_SAMPLE_SIZE);
        assert_eq!(result.format, LogFormat::Atlassian);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn test_syslog() {
        let content = "<34>Oct 11 22:14:15 host su: failed\n<13>Oct 11 22:14:16 host cron: ok";
        assert_eq!(detect_format(content, DEFAULT_SAMPLE_SIZE).format, LogFormat::Syslog);
    }

    #[test]
    fn test_java_stack_trace() {
        let content = "\
Exception in thread \"main\" java.lang.NullPointerException: x
\tat app.Main.run(Main.java:10)
\tat app.Main.main(Main.java:3)";
        let result = detect_format(content, DEFAULT_SAMPLE_SIZE);
        assert_eq!(result.format, LogFormat::JavaStacktrace);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_plain_fallback_is_certain() {
        let content = "starting up\nloaded 3 plugins\nready";
        let result = detect_format(content, DEFAULT_SAMPLE_SIZE);
        assert_eq!(result.format, LogFormat::Plain);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.sample_size, 3);
    }

    #[test]
    fn test_below_signature_threshold_is_plain() {
        // 1 of 4 = 0.25
        let content = format!("{}\nalpha\nbeta\ngamma", WEB);
        assert_eq!(detect_format(&content, DEFAULT_SAMPLE_SIZE).format, LogFormat::Plain);

        // 2 of 6 = 0.33
        let content = format!("{}\n{}\na\nb\nc\nd", WEB, WEB);
        assert_eq!(detect_format(&content, DEFAULT_SAMPLE_SIZE).format, LogFormat::Nginx);
    }

    #[test]
    fn test_sample_counts_only_non_blank_leading_lines() {
        let mut lines = vec![""; 10];
        lines.extend(vec!["plain"; 3]);
        lines.extend(vec![WEB; 10]);
        let content = lines.join("\n");

        // the first 3 non-blank lines are plain text; web lines are outside the sample
        let result = detect_format(&content, 3);
        assert_eq!(result.format, LogFormat::Plain);
        assert_eq!(result.sample_size, 3);

        let result = detect_format(&content, 13);
        assert_eq!(result.format, LogFormat::Nginx);
    }
}
