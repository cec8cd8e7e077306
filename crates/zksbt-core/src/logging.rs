use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    prelude::*,
    EnvFilter,
};
use zksbt_types::{ZksbtError, ZksbtResult};

use crate::config::LoggingConfig;

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &LoggingConfig) -> ZksbtResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let (writer, ansi) = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ZksbtError::Config(format!("Failed to open log file: {}", e)))?;
            (BoxMakeWriter::new(std::sync::Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if config.json {
        let layer = fmt::layer()
            .json()
            .with_writer(writer)
            .with_file(config.source_location)
            .with_line_number(config.source_location);
        if config.timestamps {
            registry.with(layer).try_init()
        } else {
            registry.with(layer.without_time()).try_init()
        }
    } else {
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_file(config.source_location)
            .with_line_number(config.source_location);
        if config.timestamps {
            registry.with(layer).try_init()
        } else {
            registry.with(layer.without_time()).try_init()
        }
    };

    result.map_err(|e| ZksbtError::Config(format!("Failed to initialise logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let config = LoggingConfig::default();
        let _ = init_logging(&config);
        assert!(matches!(init_logging(&config), Err(ZksbtError::Config(_))));
    }
}
