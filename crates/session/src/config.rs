use crate::error::SessionError;
use cachet_container::ContainerConfig;
use cachet_container::config::duration;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use strum::VariantNames;
use strum_macros::{Display, EnumString, VariantNames as DeriveVariantNames};

pub const DEFAULT_COOKIE_NAME: &str = "_cachet";
pub const DEFAULT_HEADER: &str = "Authorization";

const DEFAULT_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const DEFAULT_REFRESH: Duration = Duration::from_secs(3 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionConfig {
    pub container: ContainerConfig,
    /// Lifetime of a freshly issued or refreshed session.
    #[serde(with = "duration")]
    pub max_age: Duration,
    /// Age after which a valid session gets a new window.
    #[serde(with = "duration")]
    pub refresh: Duration,
    pub cookie: CookieConfig,
    /// Request header that selects the header transport when present.
    pub header: String,
    /// Expected scheme in front of the token, e.g. `Bearer`.
    pub header_scheme: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            container: ContainerConfig::default(),
            max_age: DEFAULT_MAX_AGE,
            refresh: DEFAULT_REFRESH,
            cookie: CookieConfig::default(),
            header: DEFAULT_HEADER.to_owned(),
            header_scheme: None,
        }
    }
}

impl SessionConfig {
    /// # Errors
    /// Returns [`SessionError::Configuration`] for zero durations, an unknown same-site
    /// policy, empty transport names or a container that does not emit text.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.max_age.is_zero() {
            return Err(configuration("max-age must be greater than zero"));
        }
        if self.refresh.is_zero() {
            return Err(configuration("refresh must be greater than zero"));
        }
        if let Err(e) = http::HeaderName::try_from(self.header.trim()) {
            return Err(SessionError::Configuration {
                message: e.to_string().into(),
                context: Some(format!("session header {:?}", self.header).into()),
            });
        }
        if !self.container.resolve_stages()?.emits_text() {
            return Err(configuration(
                "session tokens travel in cookies and headers, the container representer cannot be nop",
            ));
        }
        self.cookie.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CookieConfig {
    pub name: String,
    pub path: String,
    /// Empty means the request host without its port.
    pub domain: String,
    pub secure: bool,
    #[serde(alias = "httponly")]
    pub http_only: bool,
    pub same_site: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_owned(),
            path: "/".to_owned(),
            domain: String::new(),
            secure: true,
            http_only: true,
            same_site: SameSitePolicy::Default.to_string(),
        }
    }
}

impl CookieConfig {
    /// # Errors
    /// Returns [`SessionError::Configuration`] for an empty name or unknown same-site value.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.name.trim().is_empty() {
            return Err(configuration("cookie name cannot be empty"));
        }
        self.same_site_policy().map(|_| ())
    }

    /// Resolves `same-site` case-insensitively.
    ///
    /// # Errors
    /// Returns [`SessionError::Configuration`] listing the legal values.
    pub fn same_site_policy(&self) -> Result<SameSitePolicy, SessionError> {
        SameSitePolicy::from_str(self.same_site.trim()).map_err(|_| {
            let mut legal = SameSitePolicy::VARIANTS.to_vec();
            legal.sort_unstable();
            configuration(format!(
                "unexpected same-site value {:?}, expected one of: {}",
                self.same_site,
                legal.join(", ")
            ))
        })
    }
}

/// `SameSite` cookie attribute; `default` leaves it to the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, DeriveVariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SameSitePolicy {
    #[default]
    Default,
    Lax,
    Strict,
    None,
}

impl SameSitePolicy {
    #[must_use]
    pub const fn attribute(self) -> Option<cookie::SameSite> {
        match self {
            Self::Default => None,
            Self::Lax => Some(cookie::SameSite::Lax),
            Self::Strict => Some(cookie::SameSite::Strict),
            Self::None => Some(cookie::SameSite::None),
        }
    }
}

fn configuration(message: impl Into<std::borrow::Cow<'static, str>>) -> SessionError {
    SessionError::Configuration { message: message.into(), context: None }
}
