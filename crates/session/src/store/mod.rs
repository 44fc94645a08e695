//! Per-request adapters binding a [`Session`] to its transport.
//!
//! The transport is an [`Exchange`]: the request headers going in and the cookies to
//! append to the response coming out. The HTTP layer builds one per request and turns
//! its pending cookies into `Set-Cookie` headers.

mod cookie;
mod header;

pub use self::cookie::CookieStore;
pub use self::header::HeaderStore;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::session::Session;
use ::cookie::Cookie;
use http::header::{COOKIE, HOST};
use http::{HeaderMap, HeaderName};
use std::sync::Arc;

/// Loads a session from, and writes it back to, one transport.
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Decodes the session carried by the request.
    ///
    /// Returns `Ok(false)` when the transport carries no token; the session stays fresh.
    ///
    /// # Errors
    /// Propagates decoding failures from the container.
    fn load(&self, exchange: &Exchange) -> Result<bool, SessionError>;

    /// Writes the current session to the response side of the exchange.
    ///
    /// # Errors
    /// Propagates encoding failures from the container.
    fn save(&self, exchange: &mut Exchange) -> Result<(), SessionError>;

    /// Tells the client to forget the session.
    ///
    /// # Errors
    /// Returns [`SessionError::Internal`] if the removal cannot be expressed.
    fn discard(&self, exchange: &mut Exchange) -> Result<(), SessionError>;

    fn session(&self) -> &Arc<Session>;
}

/// Request side inputs and response side cookies of one HTTP exchange.
#[derive(Debug, Clone, Default)]
pub struct Exchange {
    headers: HeaderMap,
    host: Option<String>,
    cookies: Vec<Cookie<'static>>,
}

impl Exchange {
    /// Takes the host from the `Host` header.
    #[must_use]
    pub fn new(headers: HeaderMap) -> Self {
        let host = headers.get(HOST).and_then(|v| v.to_str().ok()).map(str::to_owned);
        Self { headers, host, cookies: Vec::new() }
    }

    /// Takes the host from an absolute request URI, falling back to the `Host` header.
    #[must_use]
    pub fn from_parts(parts: &http::request::Parts) -> Self {
        let mut exchange = Self::new(parts.headers.clone());
        if let Some(authority) = parts.uri.authority() {
            exchange.host = Some(authority.as_str().to_owned());
        }
        exchange
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value as text; non-ASCII values count as absent.
    #[must_use]
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The request host, possibly including a port.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// The first request cookie called `name`.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(Cookie::split_parse_encoded)
            .filter_map(Result::ok)
            .find(|c| c.name() == name)
            .map(Cookie::into_owned)
    }

    /// Queues a cookie for the response.
    pub fn set_cookie(&mut self, cookie: Cookie<'static>) {
        self.cookies.push(cookie);
    }

    #[must_use]
    pub fn pending_cookies(&self) -> &[Cookie<'static>] {
        &self.cookies
    }

    pub fn take_cookies(&mut self) -> Vec<Cookie<'static>> {
        std::mem::take(&mut self.cookies)
    }
}

/// Picks the header transport when the request carries the configured header, the
/// cookie transport otherwise.
///
/// # Errors
/// Returns [`SessionError::Configuration`] for an invalid header name or same-site value.
pub fn select_store(
    config: &SessionConfig,
    exchange: &Exchange,
    session: Arc<Session>,
) -> Result<Box<dyn SessionStore>, SessionError> {
    let header = HeaderName::try_from(config.header.trim()).map_err(|e| {
        SessionError::Configuration {
            message: e.to_string().into(),
            context: Some(format!("session header {:?}", config.header).into()),
        }
    })?;

    if exchange.header(&header).is_some_and(|v| !v.trim().is_empty()) {
        return Ok(Box::new(HeaderStore::new(header, config.header_scheme.clone(), session)));
    }
    Ok(Box::new(CookieStore::new(config.cookie.clone(), session)?))
}
