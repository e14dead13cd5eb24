//! Load: config loading from file and environment variables.

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use super::model::AssemblerConfig;
use crate::error::ConfigError;

pub const CONFIG_FILE_ENV: &str = "LOGCTX_CONFIG_FILE";
pub const DEFAULT_CONFIG_FILE: &str = "logctx.toml";

impl AssemblerConfig {
    /// Load configuration from file and environment variables.
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// As [`AssemblerConfig::load`], with an explicit file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// As [`AssemblerConfig::load_from`], reading overrides through `lookup`
    /// instead of the process environment.
    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if path.exists() {
            tracing::info!(path = %path.display(), "Loading configuration");
            Self::from_file(path)?
        } else {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };

        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file. Missing keys take defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `LOGCTX_*` overrides read through `lookup`. Values that do not
    /// parse are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let budget = &mut self.budget;
        override_from(&lookup, "LOGCTX_MAX_LOG_TOKENS", &mut budget.max_log_tokens);
        override_from(&lookup, "LOGCTX_MAX_FILE_TOKENS", &mut budget.max_file_tokens);
        override_from(&lookup, "LOGCTX_MAX_CONTEXT_TOKENS", &mut budget.max_context_tokens);
        override_from(&lookup, "LOGCTX_MAX_OUTPUT_TOKENS", &mut budget.max_output_tokens);
        override_from(&lookup, "LOGCTX_SAFETY_MARGIN", &mut budget.safety_margin);
        override_from(&lookup, "LOGCTX_RECENT_MESSAGES", &mut budget.recent_messages_to_keep);
        override_from(
            &lookup,
            "LOGCTX_SUMMARIZATION_THRESHOLD",
            &mut budget.summarization_threshold,
        );

        let summarizer = &mut self.summarizer;
        override_from(&lookup, "LOGCTX_SUMMARIZER_TIMEOUT_SECS", &mut summarizer.timeout_secs);
        override_from(&lookup, "LOGCTX_SUMMARIZER_ENABLED", &mut summarizer.enabled);
    }
}

fn override_from<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *target = value,
        Err(e) => tracing::warn!(key, value = %raw, error = %e, "ignoring invalid environment override"),
    }
}
