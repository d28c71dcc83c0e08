//! Structured logging with tracing.

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::WindowConfig;

/// Initialize structured logging.
///
/// Reads log level from RUST_LOG environment variable (defaults to "info").
/// Outputs JSON-formatted logs for production monitoring.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tokenbatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Initialize simple console logging (for the demo driver and debugging).
pub fn init_console_logging() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tokenbatch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

/// Log what the sliding window produced from a token sequence.
///
/// Warns when the text tokenized to fewer tokens than one full window —
/// the dataset is valid but empty, which is almost never what a caller
/// feeding it to a training loop intended.
pub fn log_dataset_summary(n_tokens: usize, n_windows: usize, window: &WindowConfig) {
    info!(
        n_tokens = n_tokens,
        n_windows = n_windows,
        max_length = window.max_length,
        stride = window.stride,
        "Windowed dataset built"
    );

    if n_windows == 0 {
        warn!(
            n_tokens = n_tokens,
            max_length = window.max_length,
            "Token sequence too short for a single window (need max_length + 1 tokens); \
             dataset is empty"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_does_not_panic() {
        // Covers both the populated and the empty-dataset warning paths
        let window = WindowConfig::new(4, 1);
        log_dataset_summary(100, 96, &window);
        log_dataset_summary(3, 0, &window);
    }
}
