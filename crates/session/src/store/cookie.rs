use super::{Exchange, SessionStore};
use crate::config::{CookieConfig, SameSitePolicy};
use crate::error::{SessionError, SessionErrorExt};
use crate::session::Session;
use ::cookie::Cookie;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use time::OffsetDateTime;

/// Keeps the session in a named cookie.
#[derive(Debug)]
pub struct CookieStore {
    config: CookieConfig,
    same_site: SameSitePolicy,
    session: Arc<Session>,
}

impl CookieStore {
    /// # Errors
    /// Returns [`SessionError::Configuration`] for an unknown same-site value.
    pub fn new(config: CookieConfig, session: Arc<Session>) -> Result<Self, SessionError> {
        let same_site = config.same_site_policy()?;
        Ok(Self { config, same_site, session })
    }

    fn cookie(
        &self,
        exchange: &Exchange,
        value: String,
        max_age: time::Duration,
        expires: OffsetDateTime,
    ) -> Cookie<'static> {
        let mut builder = Cookie::build((self.config.name.clone(), value))
            .path(self.config.path.clone())
            .max_age(max_age)
            .expires(expires)
            .secure(self.config.secure)
            .http_only(self.config.http_only);

        let domain = if self.config.domain.is_empty() {
            exchange.host().map(strip_port).unwrap_or_default()
        } else {
            strip_port(&self.config.domain)
        };
        if !domain.is_empty() {
            builder = builder.domain(domain.to_owned());
        }
        if let Some(same_site) = self.same_site.attribute() {
            builder = builder.same_site(same_site);
        }
        builder.build()
    }
}

impl SessionStore for CookieStore {
    fn load(&self, exchange: &Exchange) -> Result<bool, SessionError> {
        let Some(cookie) = exchange.cookie(&self.config.name) else {
            return Ok(false);
        };
        self.session.load(cookie.value().as_bytes()).context("cookie")?;
        Ok(true)
    }

    fn save(&self, exchange: &mut Exchange) -> Result<(), SessionError> {
        let token = self.session.save()?;
        let value = String::from_utf8(token).map_err(|_| SessionError::Internal {
            message: "session token is not text, configure a text representer".into(),
            context: Some("cookie".into()),
        })?;

        let header = self.session.header();
        let max_age = time::Duration::seconds((header.valid_before - header.valid_after).num_seconds());
        let cookie = self.cookie(exchange, value, max_age, to_offset(header.valid_before)?);
        exchange.set_cookie(cookie);
        Ok(())
    }

    fn discard(&self, exchange: &mut Exchange) -> Result<(), SessionError> {
        let cookie =
            self.cookie(exchange, String::new(), time::Duration::ZERO, OffsetDateTime::UNIX_EPOCH);
        exchange.set_cookie(cookie);
        Ok(())
    }

    fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

fn to_offset(at: DateTime<Utc>) -> Result<OffsetDateTime, SessionError> {
    OffsetDateTime::from_unix_timestamp(at.timestamp()).map_err(|e| SessionError::Internal {
        message: e.to_string().into(),
        context: Some("cookie expiry".into()),
    })
}

/// Cookie domains never carry a port.
fn strip_port(host: &str) -> &str {
    if let Some(end) = host.strip_prefix('[').and_then(|rest| rest.find(']')) {
        return &host[..end + 2];
    }
    host.split_once(':').map_or(host, |(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ports_are_stripped() {
        assert_eq!(strip_port("app.localhost:4180"), "app.localhost");
        assert_eq!(strip_port("example.com"), "example.com");
        assert_eq!(strip_port("[::1]:8080"), "[::1]");
    }
}
