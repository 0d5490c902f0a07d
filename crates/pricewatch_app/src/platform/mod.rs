//! Terminal host: config, logging, persistence and the dispatch loop
//! around the pure core.
mod app;
mod config;
mod effects;
mod logging;
mod persistence;
mod render;

pub use app::{load_saved_state, run_batch, BatchSource};
pub use config::{load_config, AppConfig};
pub use logging::{initialize as initialize_logging, LogDestination, DEFAULT_LOG_FILE};
pub use render::{highlighted_table, results_table, summary};
