//! Optimize: fit one log file into a token budget.
//!
//! Analysis (detect, parse, summarize, render) does not depend on the budget
//! and can run on a blocking thread per file. Fitting is cheap and runs
//! afterwards, once the caller knows how much room the file gets.

use logparse::{build_log_summary, format_entry_for_prompt, parse_log, ParseOptions};

use crate::tokens::estimate_tokens;

/// Share of the budget issue entries may take when none is configured.
pub const DEFAULT_ISSUE_RATIO: f64 = 0.7;

const ISSUE_SEPARATOR: &str = "--- [Other entries (most recent)] ---";

// Blank-line joins between the at most five output sections
const SECTION_JOIN_TOKENS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedContent {
    pub content: String,
    pub truncated: bool,
    /// Format-aware overview, present whether or not truncation happened
    pub summary: String,
}

#[derive(Debug, Clone)]
struct RenderedEntry {
    text: String,
    tokens: usize,
}

impl RenderedEntry {
    fn new(text: String) -> Self {
        // +1 for the newline joining it to its neighbour
        let tokens = estimate_tokens(&text) + 1;
        Self { text, tokens }
    }
}

/// Budget-independent view of one raw file.
#[derive(Debug, Clone)]
pub struct ContentAnalysis {
    raw: String,
    raw_tokens: usize,
    total_lines: usize,
    summary: String,
    issues: Vec<RenderedEntry>,
    normal: Vec<RenderedEntry>,
}

impl ContentAnalysis {
    pub fn new(raw: String, sample_size: usize) -> Self {
        let result = parse_log(&raw, &ParseOptions::default().with_sample_size(sample_size));
        let summary = build_log_summary(&result);

        let (issues, normal): (Vec<_>, Vec<_>) = result
            .entries
            .iter()
            .partition(|entry| entry.level.is_issue());

        Self {
            raw_tokens: estimate_tokens(&raw),
            raw,
            total_lines: result.total_lines,
            summary,
            issues: issues
                .into_iter()
                .map(|entry| RenderedEntry::new(format_entry_for_prompt(entry)))
                .collect(),
            normal: normal
                .into_iter()
                .map(|entry| RenderedEntry::new(format_entry_for_prompt(entry)))
                .collect(),
        }
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn raw_tokens(&self) -> usize {
        self.raw_tokens
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    /// Fit the content into `budget` tokens.
    ///
    /// Content already within budget is returned unchanged. Otherwise the
    /// output is a truncation notice, the summary, issue entries in input
    /// order while they fit in `issue_ratio` of the budget, and then the most
    /// recent ordinary entries that still fit.
    pub fn fit(&self, budget: usize, issue_ratio: f64) -> OptimizedContent {
        if self.raw_tokens <= budget {
            return OptimizedContent {
                content: self.raw.clone(),
                truncated: false,
                summary: self.summary.clone(),
            };
        }

        let header = format!("[Log summary]\n{}", self.summary);
        // Reserve room for the notice using the widest count it can show
        let notice_reserve = estimate_tokens(&self.notice(self.issues.len() + self.normal.len()));
        let mut used = estimate_tokens(&header) + notice_reserve + SECTION_JOIN_TOKENS;

        let issue_cap = (budget as f64 * issue_ratio).floor() as usize;
        let mut kept_issues: Vec<&str> = Vec::new();
        for entry in &self.issues {
            if used + entry.tokens <= issue_cap {
                kept_issues.push(&entry.text);
                used += entry.tokens;
            }
        }

        let with_separator = !self.issues.is_empty() && !self.normal.is_empty();
        if with_separator {
            used += estimate_tokens(ISSUE_SEPARATOR);
        }

        // Newest first until the budget runs out
        let mut kept_normal: Vec<&str> = Vec::new();
        for entry in self.normal.iter().rev() {
            if used + entry.tokens > budget {
                break;
            }
            kept_normal.push(&entry.text);
            used += entry.tokens;
        }
        kept_normal.reverse();

        let shown = kept_issues.len() + kept_normal.len();
        tracing::debug!(
            budget,
            raw_tokens = self.raw_tokens,
            used,
            issues_kept = kept_issues.len(),
            issues_total = self.issues.len(),
            normal_kept = kept_normal.len(),
            "truncated log content"
        );

        let mut sections = vec![self.notice(shown), header];
        if !kept_issues.is_empty() {
            sections.push(kept_issues.join("\n"));
        }
        if with_separator {
            sections.push(ISSUE_SEPARATOR.to_string());
        }
        if !kept_normal.is_empty() {
            sections.push(kept_normal.join("\n"));
        }

        OptimizedContent {
            content: sections.join("\n\n"),
            truncated: true,
            summary: self.summary.clone(),
        }
    }

    fn notice(&self, shown: usize) -> String {
        format!(
            "[Log truncated to fit the token budget. Original: {} lines, shown: {} entries]\n[Issue entries found: {}]",
            self.total_lines,
            shown,
            self.issues.len()
        )
    }
}

/// Analyse and fit in one step with default sampling and issue ratio.
pub fn optimize(raw: &str, budget: usize) -> OptimizedContent {
    ContentAnalysis::new(raw.to_string(), logparse::DEFAULT_SAMPLE_SIZE).fit(budget, DEFAULT_ISSUE_RATIO)
}
