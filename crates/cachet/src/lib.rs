//! Facade crate for cachet: stateless sealed tokens for sessions and CSRF protection.
//! Re-exports the engine crates and wires configuration and logging together.
//! Keep this crate thin: it should compose other crates, not implement token logic.
//!
//! ## Usage
//! - Load a [`CachetConfig`] with [`CachetConfig::load`].
//! - Install logging with [`init_logger`] and keep the returned handle alive.
//! - Build [`Sessions`](session::Sessions) and [`Csrf`](csrf::Csrf) from the sections, or
//!   enable the `http` feature for the axum middleware.
//!
//! ```rust,no_run
//! use cachet::CachetConfig;
//! use cachet::container::OsRandom;
//! use cachet::csrf::Csrf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CachetConfig::load("cachet.toml")?;
//! let _logger = cachet::init_logger("my-app", &config)?;
//! let csrf = Csrf::new(&config.csrf, OsRandom::shared())?;
//! # Ok(())
//! # }
//! ```

pub mod config;

pub use cachet_container as container;
pub use cachet_csrf as csrf;
#[cfg(feature = "http")]
pub use cachet_http as http;
pub use cachet_logger as logger;
pub use cachet_session as session;

pub use crate::config::{CachetConfig, ConfigError, load_config};

/// Build-time enabled features (by Cargo feature).
pub const ENABLED: &[&str] = &[
    "container",
    "session",
    "csrf",
    #[cfg(feature = "http")]
    "http",
];

#[must_use]
pub fn is_enabled(name: &str) -> bool {
    ENABLED.contains(&name)
}

/// Installs the global subscriber described by the `log` section.
///
/// # Errors
/// See [`logger::Logger::init`].
pub fn init_logger(name: &str, config: &CachetConfig) -> Result<logger::Logger, logger::LoggerError> {
    logger::Logger::init(name, &config.log)
}
