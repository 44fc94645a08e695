//! # Logger
//!
//! Installs the global `tracing` subscriber described by the `log` section of a service
//! configuration: console output, and rolling daily files when a directory is set.
//!
//! ```rust,no_run
//! use cachet_logger::{LogConfig, Logger};
//!
//! let config = LogConfig { filter: Some("cachet_session=debug,info".into()), ..LogConfig::default() };
//! let _logger = Logger::init("my-app", &config)?;
//! # Ok::<(), cachet_logger::LoggerError>(())
//! ```

mod config;
mod error;

pub use crate::config::{LogConfig, LogLevel};
pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;

use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::Layer;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const MAX_LOG_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

/// A handle to the initialized logging system.
///
/// Holds the file writer's worker guard; buffered lines are flushed when it drops.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Installs the global subscriber for `config`.
    ///
    /// `name` prefixes the rolling files and is required when `directory` is set.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an unknown level, a malformed filter or
    ///   a missing file prefix.
    /// * [`LoggerError::Io`] / [`LoggerError::Appender`] if the directory is unusable.
    /// * [`LoggerError::Subscriber`] if a global subscriber is already installed.
    pub fn init(name: &str, config: &LogConfig) -> Result<Self, LoggerError> {
        let filter = config.env_filter()?;

        let console = layer().with_ansi(!config.json);
        let mut layers = vec![if config.json { console.json().boxed() } else { console.compact().boxed() }];

        let guard = match &config.directory {
            Some(directory) => {
                if name.trim().is_empty() {
                    return Err(LoggerError::InvalidConfiguration {
                        message: "log file prefix cannot be empty".into(),
                        context: Some(format!("directory {}", directory.display()).into()),
                    });
                }
                fs::create_dir_all(directory)
                    .context(format!("failed to create log directory: {}", directory.display()))?;

                let appender = RollingFileAppender::builder()
                    .rotation(Rotation::DAILY)
                    .filename_prefix(name)
                    .filename_suffix(LOG_FILE_SUFFIX)
                    .max_log_files(MAX_LOG_FILES)
                    .build(directory)?;

                let (writer, guard) = tracing_appender::non_blocking(appender);
                let file = layer().with_writer(writer).with_ansi(false);
                layers.push(if config.json { file.json().boxed() } else { file.boxed() });
                Some(guard)
            }
            None => None,
        };

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;
        tracing::debug!(name, level = %config.level, json = config.json, "logging initialized");

        Ok(Self { guard })
    }

    #[must_use]
    pub const fn guard(&self) -> Option<&WorkerGuard> {
        self.guard.as_ref()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging system shutting down, flushing buffers...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn file_output_needs_a_prefix() {
        let config = LogConfig { directory: Some(PathBuf::from("/tmp/cachet-logs")), ..LogConfig::default() };
        let err = Logger::init("  ", &config).expect_err("empty prefix");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }), "{err}");
    }

    #[test]
    fn malformed_filter_fails_before_install() {
        let config = LogConfig { filter: Some("cachet=loud".into()), ..LogConfig::default() };
        let err = Logger::init("cachet", &config).expect_err("bad directive");
        assert!(err.to_string().contains("cachet=loud"), "{err}");
    }
}
