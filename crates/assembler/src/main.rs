use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use assembler::conf::AssemblerConfig;
use assembler::runtime::{init_logging, load_config};
use assembler::store::{MemoryStore, SessionStore};
use assembler::summarize::{plan_summarization, SummaryPlan};
use assembler::{build_chat_context, ContentAnalysis};
use logparse::{build_log_summary, detect_format, format_entry_for_prompt, parse_log, LogFormat, ParseOptions};

/// logctx: fit log files and troubleshooting conversations into a model's
/// context window.
#[derive(Parser)]
#[command(name = "logctx", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (defaults to $LOGCTX_CONFIG_FILE or logctx.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the format of each file.
    Detect {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Parse a file and print its summary and issue entries.
    Analyze {
        file: PathBuf,

        /// Stop parsing after this many entries.
        #[arg(long)]
        max_entries: Option<usize>,

        /// Skip detection and parse as this format (json, ndjson, syslog,
        /// atlassian, nginx, apache, java-stacktrace, plain).
        #[arg(long)]
        format: Option<LogFormat>,
    },

    /// Print a file as it would be sent under a token budget.
    Optimize {
        file: PathBuf,

        /// Token budget (defaults to budget.max_file_tokens).
        #[arg(long)]
        budget: Option<usize>,
    },

    /// Assemble the system prompt and message list for a stored session.
    Context {
        /// JSON snapshot with sessions and summaries.
        snapshot: PathBuf,

        session_id: String,

        /// Also show what a summarization pass would send.
        #[arg(long)]
        plan: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Detect { files } => {
            for path in files {
                let content = read_log(&path)?;
                let result = detect_format(&content, config.budget.detection_sample_size);
                println!(
                    "{}: {} (confidence {:.0}%, {} lines sampled)",
                    path.display(),
                    result.format,
                    result.confidence * 100.0,
                    result.sample_size
                );
            }
        }
        Commands::Analyze {
            file,
            max_entries,
            format,
        } => {
            let content = read_log(&file)?;
            let options = ParseOptions {
                format,
                max_entries,
                sample_size: config.budget.detection_sample_size,
                ..Default::default()
            };
            let result = parse_log(&content, &options);
            println!("{}", build_log_summary(&result));

            let issues: Vec<_> = result.entries.iter().filter(|e| e.level.is_issue()).collect();
            if !issues.is_empty() {
                println!("\nIssues ({}):", issues.len());
                for entry in issues {
                    println!("{}", format_entry_for_prompt(entry));
                }
            }
        }
        Commands::Optimize { file, budget } => {
            let content = read_log(&file)?;
            let budget = budget.unwrap_or(config.budget.max_file_tokens);
            let analysis = ContentAnalysis::new(content, config.budget.detection_sample_size);
            let out = analysis.fit(budget, config.budget.issue_budget_ratio);
            tracing::info!(budget, raw_tokens = analysis.raw_tokens(), truncated = out.truncated, "optimized");
            println!("{}", out.content);
        }
        Commands::Context {
            snapshot,
            session_id,
            plan,
        } => print_context(&snapshot, &session_id, plan, &config).await?,
    }

    Ok(())
}

fn read_log(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(logparse::normalize::decode_bytes(&bytes).into_owned())
}

async fn print_context(snapshot: &Path, session_id: &str, plan: bool, config: &AssemblerConfig) -> Result<()> {
    let store = MemoryStore::from_snapshot(snapshot)
        .await
        .with_context(|| format!("Failed to load snapshot {}", snapshot.display()))?;

    let ctx = build_chat_context(&store, session_id, config)
        .await
        .context("Failed to assemble context")?
        .with_context(|| format!("Session {} not found in snapshot", session_id))?;

    println!("===== SYSTEM PROMPT =====\n{}", ctx.full_system_prompt());
    println!("\n===== MESSAGES ({}{}) =====", ctx.messages.len(), if ctx.windowed { ", windowed" } else { "" });
    for message in &ctx.messages {
        println!("\n[{}]\n{}", message.role.label(), message.content);
    }

    if plan {
        let Some(session) = store.load_session(session_id).await? else {
            return Ok(());
        };
        let latest = store.latest_summary(session_id).await?;
        println!("\n===== SUMMARIZATION PLAN =====");
        match plan_summarization(&session.messages, latest.as_ref(), &config.budget, &config.summarizer) {
            SummaryPlan::Skip(reason) => println!("skip: {}", reason.as_str()),
            SummaryPlan::Summarize {
                messages,
                previous_summary,
            } => {
                let first = messages.first().map(|m| m.id.as_str()).unwrap_or("-");
                let last = messages.last().map(|m| m.id.as_str()).unwrap_or("-");
                println!(
                    "summarize {} messages ({} .. {}){}",
                    messages.len(),
                    first,
                    last,
                    if previous_summary.is_some() { ", merging into previous summary" } else { "" }
                );
            }
        }
    }

    Ok(())
}
