use crate::error::LoggerError;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use strum::VariantNames;
use strum_macros::{Display, EnumString, VariantNames as DeriveVariantNames};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Logging section of a service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LogConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`, `off`.
    pub level: String,
    pub json: bool,
    /// Rolling log files are written here in addition to the console.
    pub directory: Option<PathBuf>,
    /// Per-target directives such as `cachet_http=debug,hyper=warn`. When set, `RUST_LOG`
    /// is ignored.
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: LogLevel::Info.to_string(), json: false, directory: None, filter: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, DeriveVariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
            LogLevel::Off => Self::OFF,
        }
    }
}

impl LogConfig {
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown level or a malformed
    /// filter.
    pub fn validate(&self) -> Result<(), LoggerError> {
        self.env_filter().map(|_| ())
    }

    /// The configured level, matched case-insensitively.
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] listing the legal levels.
    pub fn level_filter(&self) -> Result<LevelFilter, LoggerError> {
        LogLevel::from_str(self.level.trim()).map(LevelFilter::from).map_err(|_| {
            LoggerError::InvalidConfiguration {
                message: format!(
                    "unexpected log level {:?}, expected one of: {}",
                    self.level,
                    LogLevel::VARIANTS.join(", ")
                )
                .into(),
                context: None,
            }
        })
    }

    /// The level as the default directive, refined by `filter` or else by `RUST_LOG`.
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown level or a directive
    /// that does not parse.
    pub fn env_filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level_filter()?.into());
        match self.filter.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
            Some(filter) => builder.parse(filter).map_err(|e| LoggerError::InvalidConfiguration {
                message: e.to_string().into(),
                context: Some(format!("log filter {filter:?}").into()),
            }),
            None => Ok(builder.from_env_lossy()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_info_on_the_console() {
        let config = LogConfig::default();
        assert_eq!(config.level_filter().expect("info"), LevelFilter::INFO);
        assert!(!config.json);
        assert!(config.directory.is_none());
        assert!(config.filter.is_none());
    }

    #[test]
    fn every_level_maps_to_its_filter() {
        let expected = [
            ("trace", LevelFilter::TRACE),
            ("Debug", LevelFilter::DEBUG),
            ("INFO", LevelFilter::INFO),
            ("warn", LevelFilter::WARN),
            ("error", LevelFilter::ERROR),
            (" off ", LevelFilter::OFF),
        ];
        for (level, filter) in expected {
            let config = LogConfig { level: level.into(), ..LogConfig::default() };
            assert_eq!(config.level_filter().expect(level), filter, "{level}");
        }
    }

    #[test]
    fn parses_the_log_section() {
        let config: LogConfig = serde_json::from_str(
            r#"{ "level": "WARN", "json": true, "directory": "/var/log/app", "filter": "cachet_http=debug" }"#,
        )
        .expect("config");
        assert_eq!(config.level_filter().expect("warn"), LevelFilter::WARN);
        assert!(config.json);
        assert_eq!(config.directory, Some(PathBuf::from("/var/log/app")));
        assert_eq!(config.filter.as_deref(), Some("cachet_http=debug"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_level_lists_legal_values() {
        let config = LogConfig { level: "verbose".into(), ..LogConfig::default() };
        let err = config.validate().expect_err("unknown level");
        assert!(err.to_string().ends_with("expected one of: trace, debug, info, warn, error, off"), "{err}");
    }

    #[test]
    fn malformed_filter_names_the_directive() {
        let config = LogConfig { filter: Some("cachet_session=chatty".into()), ..LogConfig::default() };
        let err = config.validate().expect_err("bad directive");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
        assert!(err.to_string().contains("log filter \"cachet_session=chatty\""), "{err}");
    }

    #[test]
    fn blank_filter_falls_back_to_the_level() {
        let config = LogConfig { level: "error".into(), filter: Some("  ".into()), ..LogConfig::default() };
        assert!(config.env_filter().is_ok());
    }
}
