pub mod boot;

pub use boot::{init_logging, load_config};
