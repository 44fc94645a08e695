//! # CSRF
//!
//! Stateless anti-forgery tokens. A token binds a caller (`source`, usually the client
//! address) to a target (`subject`, usually the request path and query) for a limited time.
//! No server-side ledger is kept, so a token can be replayed by the same caller against the
//! same target until it expires.
//!
//! ```rust
//! use cachet_container::OsRandom;
//! use cachet_csrf::{Csrf, CsrfConfig};
//!
//! # fn main() -> Result<(), cachet_csrf::CsrfError> {
//! let csrf = Csrf::new(&CsrfConfig::with_key("0123456789abcdef0123456789abcdef"), OsRandom::shared())?;
//!
//! let action = csrf.sign_url_str("203.0.113.7", "/orders/42/cancel?reason=late")?;
//! csrf.validate_url("203.0.113.7", &action.parse::<http::Uri>()?)?;
//! # Ok(())
//! # }
//! ```

mod client;
pub mod config;
mod csrf;
mod error;
mod target;

pub use client::real_ip;
pub use config::CsrfConfig;
pub use csrf::{Csrf, SOURCE_KEY, SUBJECT_KEY, checksum};
pub use error::{CsrfError, CsrfErrorExt};
