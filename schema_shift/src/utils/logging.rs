//! Logging utilities for SchemaShift
//!
//! This module provides logging setup and configuration.

use std::fs::File;
use std::path::Path;

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Parse a configured level name, falling back to INFO
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize logging based on configuration.
///
/// Without a `[logging]` section a plain stderr subscriber at WARN is
/// installed so validation and snapshot warnings still surface.
pub fn init_logging(config: &Option<LoggingConfig>) -> Result<()> {
    let default_config = LoggingConfig {
        level: "warn".to_string(),
        stdout: false,
        ..LoggingConfig::default()
    };
    let config = config.as_ref().unwrap_or(&default_config);

    let directive = format!("schema_shift={}", parse_level(&config.level))
        .parse()
        .map_err(|e| Error::Config(format!("Invalid log directive: {}", e)))?;
    let env_filter = EnvFilter::from_default_env().add_directive(directive);
    let json = config.format.eq_ignore_ascii_case("json");

    let installed = if let Some(file_path) = &config.file {
        if let Some(parent) = Path::new(file_path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(file_path)?;
        let builder = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file));

        if json {
            tracing::subscriber::set_global_default(builder.json().finish())
        } else {
            tracing::subscriber::set_global_default(builder.finish())
        }
    } else if config.stdout {
        let builder = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stdout);

        if json {
            tracing::subscriber::set_global_default(builder.json().finish())
        } else {
            tracing::subscriber::set_global_default(builder.finish())
        }
    } else {
        let builder = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr);

        if json {
            tracing::subscriber::set_global_default(builder.json().finish())
        } else {
            tracing::subscriber::set_global_default(builder.finish())
        }
    };

    installed.map_err(|e| Error::Config(format!("Failed to install logger: {}", e)))
}
