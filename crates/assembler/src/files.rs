//! Files: session files under the per-file and cumulative token caps.
//!
//! Analysis of each file is independent and runs on the blocking pool. The
//! cumulative cap is applied afterwards in upload order, since every file's
//! allowance depends on what the files before it consumed.

use crate::conf::BudgetConfig;
use crate::error::AssemblerResult;
use crate::optimize::ContentAnalysis;
use crate::session::{ProcessedFile, StoredFile};
use crate::tokens::estimate_tokens;

pub const OMITTED_PLACEHOLDER: &str = "[Omitted due to token limit]";

/// Files uploaded to the session itself. Files attached to a chat turn are
/// injected with that turn instead.
pub fn session_level_files(files: &[StoredFile]) -> Vec<&StoredFile> {
    files.iter().filter(|f| f.message_id.is_none()).collect()
}

/// Optimize session files with the analysis step spread over blocking tasks.
pub async fn process_session_files(
    files: &[StoredFile],
    budget: &BudgetConfig,
) -> AssemblerResult<Vec<ProcessedFile>> {
    let files = session_level_files(files);
    let sample_size = budget.detection_sample_size;

    let handles: Vec<_> = files
        .iter()
        .map(|file| {
            let content = file.content.clone();
            tokio::task::spawn_blocking(move || ContentAnalysis::new(content, sample_size))
        })
        .collect();

    let mut analyses = Vec::with_capacity(handles.len());
    for handle in handles {
        analyses.push(handle.await?);
    }

    Ok(apply_budget(&files, analyses, budget))
}

/// Same result as [`process_session_files`], computed on the calling thread.
pub fn process_session_files_blocking(files: &[StoredFile], budget: &BudgetConfig) -> Vec<ProcessedFile> {
    let files = session_level_files(files);
    let analyses = files
        .iter()
        .map(|file| ContentAnalysis::new(file.content.clone(), budget.detection_sample_size))
        .collect();
    apply_budget(&files, analyses, budget)
}

fn apply_budget(files: &[&StoredFile], analyses: Vec<ContentAnalysis>, budget: &BudgetConfig) -> Vec<ProcessedFile> {
    let mut used = 0usize;
    let mut processed = Vec::with_capacity(files.len());

    for (file, analysis) in files.iter().zip(analyses) {
        let remaining = budget.max_log_tokens.saturating_sub(used);
        if remaining == 0 {
            tracing::debug!(filename = %file.filename, "cumulative log budget exhausted, omitting file");
            processed.push(ProcessedFile {
                filename: file.filename.clone(),
                content: OMITTED_PLACEHOLDER.to_string(),
                original_size: file.size,
                truncated: true,
                format_summary: None,
            });
            continue;
        }

        let allowance = budget.max_file_tokens.min(remaining);
        let fitted = analysis.fit(allowance, budget.issue_budget_ratio);
        used += estimate_tokens(&fitted.content);

        if fitted.truncated {
            tracing::debug!(
                filename = %file.filename,
                raw_tokens = analysis.raw_tokens(),
                budget = allowance,
                "file truncated"
            );
        }

        processed.push(ProcessedFile {
            filename: file.filename.clone(),
            content: fitted.content,
            original_size: file.size,
            truncated: fitted.truncated,
            format_summary: Some(fitted.summary),
        });
    }

    processed
}

/// Optimize a file attached to the current chat turn against the per-file cap.
pub fn process_new_file(filename: &str, content: &str, budget: &BudgetConfig) -> ProcessedFile {
    let analysis = ContentAnalysis::new(content.to_string(), budget.detection_sample_size);
    let fitted = analysis.fit(budget.max_file_tokens, budget.issue_budget_ratio);
    ProcessedFile {
        filename: filename.to_string(),
        content: fitted.content,
        original_size: content.len() as u64,
        truncated: fitted.truncated,
        format_summary: Some(fitted.summary),
    }
}
