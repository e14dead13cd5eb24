//! Conf module: budget and summarizer configuration, file and env loading.

pub mod load;
pub mod model;

pub use load::{CONFIG_FILE_ENV, DEFAULT_CONFIG_FILE};
pub use model::{AssemblerConfig, BudgetConfig, SummarizerConfig};
