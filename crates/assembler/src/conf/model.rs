//! Model: AssemblerConfig and its sections.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    pub budget: BudgetConfig,
    pub summarizer: SummarizerConfig,
}

/// Token budgets and windowing knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Cumulative cap for all session files
    pub max_log_tokens: usize,
    /// Cap for a single file
    pub max_file_tokens: usize,
    pub max_context_tokens: usize,
    /// Room left for the model's reply
    pub max_output_tokens: usize,
    pub safety_margin: usize,
    pub recent_messages_to_keep: usize,
    /// Share of the conversation budget that triggers summarization
    pub summarization_threshold: f64,
    /// Prompt, files, output and margin reserve assumed by the summarization
    /// trigger, which runs without a system prompt at hand
    pub reserved_tokens: usize,
    /// Share of a file budget issue entries may take
    pub issue_budget_ratio: f64,
    pub detection_sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub enabled: bool,
    pub timeout_secs: u64,
    pub max_output_tokens: usize,
    pub queue_capacity: usize,
    /// Upper bound on tokens sent in one summarization call; defaults to the
    /// conversation budget
    pub max_input_tokens: Option<usize>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_log_tokens: 15_000,
            max_file_tokens: 10_000,
            max_context_tokens: 200_000,
            max_output_tokens: 4096,
            safety_margin: 10_000,
            recent_messages_to_keep: 6,
            summarization_threshold: 0.8,
            reserved_tokens: 30_000,
            issue_budget_ratio: 0.7,
            detection_sample_size: logparse::DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 60,
            max_output_tokens: 2048,
            queue_capacity: 64,
            max_input_tokens: None,
        }
    }
}

impl AssemblerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.budget.validate()?;
        self.summarizer.validate()?;
        Ok(())
    }
}

impl BudgetConfig {
    /// Budget left for conversation history once the reserve is set aside.
    /// Used by the summarization trigger.
    pub fn trigger_budget(&self) -> usize {
        self.max_context_tokens.saturating_sub(self.reserved_tokens)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        for (name, value) in [
            ("budget.max_log_tokens", self.max_log_tokens),
            ("budget.max_file_tokens", self.max_file_tokens),
            ("budget.max_context_tokens", self.max_context_tokens),
            ("budget.max_output_tokens", self.max_output_tokens),
            ("budget.detection_sample_size", self.detection_sample_size),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be > 0", name)));
            }
        }
        if self.max_file_tokens > self.max_log_tokens {
            return invalid("budget.max_file_tokens must not exceed budget.max_log_tokens");
        }
        if self.recent_messages_to_keep == 0 {
            return invalid("budget.recent_messages_to_keep must be > 0");
        }
        if !in_unit_interval(self.summarization_threshold) {
            return invalid("budget.summarization_threshold must be in (0, 1]");
        }
        if !in_unit_interval(self.issue_budget_ratio) {
            return invalid("budget.issue_budget_ratio must be in (0, 1]");
        }
        if self.max_output_tokens.saturating_add(self.safety_margin) >= self.max_context_tokens {
            return invalid("budget.max_output_tokens + budget.safety_margin must be < budget.max_context_tokens");
        }
        if self.reserved_tokens >= self.max_context_tokens {
            return invalid("budget.reserved_tokens must be < budget.max_context_tokens");
        }
        Ok(())
    }
}

impl SummarizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("summarizer.timeout_secs must be > 0".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid("summarizer.queue_capacity must be > 0".to_string()));
        }
        if self.max_output_tokens == 0 {
            return Err(ConfigError::Invalid("summarizer.max_output_tokens must be > 0".to_string()));
        }
        if self.max_input_tokens == Some(0) {
            return Err(ConfigError::Invalid("summarizer.max_input_tokens must be > 0 when set".to_string()));
        }
        Ok(())
    }
}

fn in_unit_interval(value: f64) -> bool {
    value > 0.0 && value <= 1.0
}
