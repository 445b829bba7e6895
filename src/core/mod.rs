// Core Module - Foundational types, config, logging

pub mod config;
pub mod logger;
pub mod types;

// Re-export commonly used items for convenience
pub use config::{ConfigError, FeedConfig, MonitorConfig, SessionConfig};
pub use logger::setup_logging;
pub use types::{ConnectionStatus, TransactionEvent, UpstreamNotice};
