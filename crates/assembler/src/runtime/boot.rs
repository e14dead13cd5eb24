//! Boot: logging init and config load for the CLI.

use std::path::Path;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::conf::AssemblerConfig;
use crate::error::ConfigError;

const DEFAULT_FILTER: &str = "logctx=info,assembler=info,logparse=warn";

/// Default filter for a `-v` count, used when `RUST_LOG` is not set.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => DEFAULT_FILTER,
        1 => "logctx=debug,assembler=debug,logparse=info",
        _ => "logctx=trace,assembler=trace,logparse=debug",
    }
}

/// Initialise the tracing / logging subsystem. Output goes to stderr so
/// command output on stdout stays clean.
pub fn init_logging(verbosity: u8) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbosity).into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load configuration from `path` when given, otherwise from the usual
/// lookup (`LOGCTX_CONFIG_FILE`, then `logctx.toml`).
pub fn load_config(path: Option<&Path>) -> Result<AssemblerConfig, ConfigError> {
    let config = match path {
        Some(path) => AssemblerConfig::load_from(path)?,
        None => AssemblerConfig::load()?,
    };
    info!(
        max_log_tokens = config.budget.max_log_tokens,
        max_file_tokens = config.budget.max_file_tokens,
        max_context_tokens = config.budget.max_context_tokens,
        recent_messages = config.budget.recent_messages_to_keep,
        "Loaded configuration"
    );
    Ok(config)
}
