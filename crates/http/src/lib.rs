//! # HTTP integration
//!
//! Axum middleware for [`cachet_session`] and [`cachet_csrf`]:
//!
//! * [`session_layer`] loads the request session from a cookie or header, replaces broken
//!   or expired ones, and writes it back when a handler changed it.
//! * [`csrf_layer`] validates tokens on protected methods.
//!
//! Both are plain `from_fn_with_state` middleware:
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/checkout", post(checkout))
//!     .layer(from_fn_with_state(csrf, csrf_layer))
//!     .layer(from_fn_with_state(sessions, session_layer));
//! ```

mod csrf;
mod error;
mod session;

pub use cachet_csrf::real_ip;
pub use csrf::{CsrfSigner, csrf_layer, peer};
pub use error::{CSRF_REJECTED, HttpError};
pub use session::{CurrentSession, SessionState, SessionStateInner, session_layer};
