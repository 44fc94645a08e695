//! # Session
//!
//! Stateless sessions: all state lives in a sealed or signed container that travels with
//! the client, either as a cookie or in an authorization-style header.
//!
//! A [`Sessions`] handle creates sessions; a [`SessionStore`] chosen by [`select_store`]
//! loads one from the request and writes it back to the response when its nonce advanced.
//!
//! ```rust
//! use cachet_container::{ContainerConfig, OsRandom};
//! use cachet_session::{SessionConfig, Sessions};
//!
//! # fn main() -> Result<(), cachet_session::SessionError> {
//! let config = SessionConfig {
//!     container: ContainerConfig::with_key("0123456789abcdef0123456789abcdef"),
//!     ..SessionConfig::default()
//! };
//! let sessions = Sessions::from_config(&config, OsRandom::shared())?;
//!
//! let session = sessions.create()?;
//! session.set_string(1, "user-42")?;
//! assert_eq!(session.header().nonce, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
mod session;
pub mod store;

pub use config::{CookieConfig, SameSitePolicy, SessionConfig};
pub use error::{SessionError, SessionErrorExt};
pub use session::{Session, SessionOption, Sessions, Validator, with_payload, with_validator};
pub use store::{CookieStore, Exchange, HeaderStore, SessionStore, select_store};
