use super::{Exchange, SessionStore};
use crate::error::{SessionError, SessionErrorExt};
use crate::session::Session;
use http::HeaderName;
use std::sync::Arc;

/// Reads the session from a request header such as `Authorization: Bearer <token>`.
///
/// API clients resend the token themselves, so saving and discarding are no-ops.
#[derive(Debug)]
pub struct HeaderStore {
    name: HeaderName,
    scheme: Option<String>,
    session: Arc<Session>,
}

impl HeaderStore {
    /// With `scheme` set only `<scheme> <token>` values are accepted; without it, anything
    /// before the first space is dropped.
    #[must_use]
    pub fn new(name: HeaderName, scheme: Option<String>, session: Arc<Session>) -> Self {
        let scheme = scheme.filter(|s| !s.trim().is_empty());
        Self { name, scheme, session }
    }

    fn token<'a>(&self, value: &'a str) -> Option<&'a str> {
        let value = value.trim();
        let token = match (&self.scheme, value.split_once(' ')) {
            (Some(scheme), Some((given, token))) if given.eq_ignore_ascii_case(scheme.trim()) => token,
            (Some(_), _) => return None,
            (None, Some((_, token))) => token,
            (None, None) => value,
        };
        Some(token.trim()).filter(|t| !t.is_empty())
    }
}

impl SessionStore for HeaderStore {
    fn load(&self, exchange: &Exchange) -> Result<bool, SessionError> {
        let Some(token) = exchange.header(&self.name).and_then(|v| self.token(v)) else {
            return Ok(false);
        };
        self.session.load(token.as_bytes()).context(format!("{} header", self.name))?;
        Ok(true)
    }

    fn save(&self, _exchange: &mut Exchange) -> Result<(), SessionError> {
        Ok(())
    }

    fn discard(&self, _exchange: &mut Exchange) -> Result<(), SessionError> {
        Ok(())
    }

    fn session(&self) -> &Arc<Session> {
        &self.session
    }
}
