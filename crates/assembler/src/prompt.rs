//! Prompt: text sent to the model around the conversation itself.

use crate::session::{ProcessedFile, SystemInfo};

pub const BASE_SYSTEM_PROMPT: &str = "\
You are a log analysis assistant for application operators.
Read the uploaded logs and the conversation, then explain what went wrong.

When answering:
- Point to the exact log lines, timestamps and components involved.
- Separate the root cause from its downstream symptoms.
- Suggest concrete next steps such as settings to check, commands to run, or known fixes.
- Say so plainly when the logs do not contain enough information.
- Some log files are truncated to fit the context. A truncated file starts with a notice and a summary, followed by warning and error entries and the most recent ordinary entries.";

pub const SUMMARIZATION_SYSTEM_PROMPT: &str = "\
You summarize log troubleshooting conversations so they can continue with less context.

Write a concise summary that preserves:
- error codes, exception types and messages
- file names, line numbers and components
- configuration values and settings discussed
- root-cause findings and hypotheses still open
- actions already tried and their outcome

If a previous summary is given, merge the new conversation into it instead of repeating it.
Reply with the summary only.";

const NO_SYSTEM_INFO: &str = "No information provided";
const NO_FILES_LISTED: &str = "None";
const NO_FILES_UPLOADED: &str = "No log files uploaded";
const DEFAULT_TURN_TEXT: &str = "Please analyze the attached files.";

/// Session section: system info and the list of uploaded files.
pub fn build_system_prompt_context(system_info: &SystemInfo, files: &[ProcessedFile]) -> String {
    let mut out = String::from("## Session information\n\n### System\n");

    let fields = system_info.fields();
    if fields.is_empty() {
        out.push_str(NO_SYSTEM_INFO);
        out.push('\n');
    } else {
        for (label, value) in fields {
            out.push_str(&format!("- {}: {}\n", label, value.trim()));
        }
    }

    out.push_str("\n### Uploaded files\n");
    if files.is_empty() {
        out.push_str(NO_FILES_LISTED);
        out.push('\n');
    } else {
        for file in files {
            let partial = if file.truncated { " [partial]" } else { "" };
            out.push_str(&format!("- {} ({} bytes){}\n", file.filename, file.original_size, partial));
        }
    }

    out
}

/// Budgeted file contents, each under its own heading.
pub fn format_files_for_prompt(files: &[ProcessedFile]) -> String {
    if files.is_empty() {
        return NO_FILES_UPLOADED.to_string();
    }

    files
        .iter()
        .map(|file| {
            let mut block = format!("### {}{}\n", file.filename, partial_suffix(file));
            if let Some(summary) = file.format_summary.as_deref().filter(|s| !s.is_empty()) {
                block.push_str(summary);
                block.push('\n');
            }
            block.push_str(&fenced(&file.content));
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn full_system_prompt(system_prompt_context: &str, files: &[ProcessedFile]) -> String {
    format!(
        "{}\n\n{}\n## Initially uploaded log files\n\n{}",
        BASE_SYSTEM_PROMPT,
        system_prompt_context,
        format_files_for_prompt(files)
    )
}

/// User text for a turn that carries newly attached files.
pub fn compose_user_turn(message: &str, files: &[ProcessedFile]) -> String {
    let text = if message.trim().is_empty() {
        DEFAULT_TURN_TEXT
    } else {
        message
    };
    if files.is_empty() {
        return text.to_string();
    }

    let mut out = text.to_string();
    for file in files {
        out.push_str(&format!(
            "\n\n### Newly attached file: {}{}\n{}",
            file.filename,
            partial_suffix(file),
            fenced(&file.content)
        ));
    }
    out
}

fn partial_suffix(file: &ProcessedFile) -> &'static str {
    if file.truncated {
        " (partial)"
    } else {
        ""
    }
}

fn fenced(content: &str) -> String {
    format!("```\n{}\n```", content.trim_end_matches('\n'))
}
