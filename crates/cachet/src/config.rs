use cachet_csrf::{CsrfConfig, CsrfError};
use cachet_logger::{LogConfig, LoggerError};
use cachet_session::{SessionConfig, SessionError};
use config::{Config, Environment, File};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

pub use config::Map;

/// Prefix of environment overrides, e.g. `CACHET__SESSION__MAX_AGE=1d`.
pub const ENV_PREFIX: &str = "CACHET";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },

    #[error("Invalid log section{}: {source}", format_context(.context))]
    Log { source: LoggerError, context: Option<Cow<'static, str>> },

    #[error("Invalid session section{}: {source}", format_context(.context))]
    Session { source: SessionError, context: Option<Cow<'static, str>> },

    #[error("Invalid csrf section{}: {source}", format_context(.context))]
    Csrf { source: CsrfError, context: Option<Cow<'static, str>> },
}

trait ConfigResultExt<T> {
    fn context(self, context: &'static str) -> Result<T, ConfigError>;
}

impl<T> ConfigResultExt<T> for Result<T, config::ConfigError> {
    #[inline]
    fn context(self, context: &'static str) -> Result<T, ConfigError> {
        self.map_err(|source| ConfigError::Config { source, context: Some(Cow::Borrowed(context)) })
    }
}

impl From<LoggerError> for ConfigError {
    fn from(source: LoggerError) -> Self {
        Self::Log { source, context: None }
    }
}

impl From<SessionError> for ConfigError {
    fn from(source: SessionError) -> Self {
        Self::Session { source, context: None }
    }
}

impl From<CsrfError> for ConfigError {
    fn from(source: CsrfError) -> Self {
        Self::Csrf { source, context: None }
    }
}

/// Top-level configuration of a service using cachet.
///
/// ```toml
/// [log]
/// level = "info"
///
/// [session]
/// max-age = "7d"
/// container = { key-file = "/run/secrets/session.key" }
///
/// [csrf]
/// key-file = "/run/secrets/csrf.key"
/// ttl = "6h"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CachetConfig {
    pub log: LogConfig,
    pub session: SessionConfig,
    pub csrf: CsrfConfig,
}

impl CachetConfig {
    /// Loads and validates the configuration; see [`load_config`].
    ///
    /// # Errors
    /// Returns [`ConfigError`] for unreadable sources or invalid sections.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section without touching key material.
    ///
    /// # Errors
    /// Returns the first invalid section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log.validate()?;
        self.session.validate()?;
        self.csrf.validate()?;
        Ok(())
    }
}

/// Layered configuration: a required file (format picked by extension) overlaid with
/// `CACHET__` environment variables, `__` separating nested sections.
///
/// # Errors
/// Returns [`ConfigError::Config`] if the file is missing or the merged values do not
/// match `T`.
pub fn load_config<T>(path: impl AsRef<Path>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_with_env(path.as_ref(), None)
}

/// [`load_config`] reading overrides from `env` instead of the process environment.
///
/// # Errors
/// See [`load_config`].
pub fn load_config_from<T>(path: impl AsRef<Path>, env: Map<String, String>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_with_env(path.as_ref(), Some(env))
}

fn load_with_env<T>(path: &Path, env: Option<Map<String, String>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    info!("Loading config from {}", path.display());

    Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .convert_case(config::Case::Kebab)
                .try_parsing(true)
                .source(env),
        )
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
