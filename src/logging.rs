//! Logging setup
//!
//! Installs a `tracing` fmt subscriber. `RUST_LOG` is respected; otherwise
//! the configured level applies to this crate and `warn` to everything else.

use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for this crate's events
    pub level: Level,
    /// Append `file:line` of the caller to each event
    pub include_caller: bool,
    /// Write to this file (appending, no colors) instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            include_caller: true,
            log_file: None,
        }
    }
}

impl LogConfig {
    /// `debug` when verbose, `info` otherwise
    pub fn verbose(verbose: bool) -> Self {
        Self {
            level: if verbose { Level::DEBUG } else { Level::INFO },
            ..Self::default()
        }
    }

    /// Set the log file
    #[must_use]
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Default filter directives when `RUST_LOG` is not set
    pub fn directives(&self) -> String {
        format!("warn,dhis2={}", self.level.as_str().to_lowercase())
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directives()))
    }
}

/// Install the global subscriber
///
/// Fails if a subscriber is already installed or the log file cannot be
/// opened.
pub fn init(config: &LogConfig) -> Result<()> {
    let (writer, ansi) = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .with_file(config.include_caller)
        .with_line_number(config.include_caller)
        .try_init()
        .map_err(|e| Error::Other(format!("failed to initialize logging: {e}")))
}
