// Structured Logging for the Fraud Monitor
// tracing-based, initialized once per process

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Setup structured logging for the entire application.
/// Safe to call more than once; only the first call takes effect.
pub fn setup_logging(log_level: Option<&str>, json_format: bool) {
    let log_level_str = log_level.unwrap_or("INFO");

    let level = match log_level_str.to_uppercase().as_str() {
        "TRACE" => Level::TRACE,
        "DEBUG" => Level::DEBUG,
        "INFO" => Level::INFO,
        "WARN" | "WARNING" => Level::WARN,
        "ERROR" => Level::ERROR,
        _ => Level::INFO,
    };

    INIT.call_once(|| {
        // Suppress noisy transport libraries
        let filter = EnvFilter::from_default_env()
            .add_directive(level.into())
            .add_directive("tokio_tungstenite=warn".parse().unwrap())
            .add_directive("tungstenite=warn".parse().unwrap());

        if json_format {
            tracing_subscriber::fmt()
                .json()
                .with_target(true)
                .with_env_filter(filter)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_target(true)
                .with_env_filter(filter)
                .init();
        }

        tracing::info!(log_level = %log_level_str, json = json_format, "Logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_is_idempotent() {
        setup_logging(Some("DEBUG"), false);
        setup_logging(Some("INFO"), true);
    }
}
