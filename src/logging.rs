use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{AppError, Result};

/// Default directives when `RUST_LOG` is not set.
fn default_directives(level: &str) -> String {
    format!("life_trackers={level},tracker_core={level},tower_http={level}")
}

/// Initializes logging with console output and, when a directory is
/// configured, a daily-rolling JSON file.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(&config.level)))
        .map_err(|e| AppError::Config(format!("invalid log filter: {e}")))?;

    let file_layer = match &config.directory {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            // Keep the worker alive for the whole process so logs are flushed on exit
            std::mem::forget(guard);
            Some(fmt::layer().json().with_writer(non_blocking_writer))
        }
        None => None,
    };

    let console_layer = fmt::layer().with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("logging already initialized: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_cover_both_crates() {
        let directives = default_directives("debug");
        assert!(directives.contains("life_trackers=debug"));
        assert!(directives.contains("tracker_core=debug"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }
}
