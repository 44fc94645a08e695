use crate::error::CsrfError;
use cachet_container::config::duration;
use cachet_container::{ContainerConfig, ContainerSettings};
use http::Method;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PARAMETER: &str = "csrf";
const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CsrfConfig {
    pub key: Option<String>,
    pub key_file: Option<PathBuf>,
    #[serde(with = "duration")]
    pub ttl: Duration,
    /// Query parameter carrying the token.
    pub parameter_name: String,
    /// Request methods that must carry a valid token.
    pub methods: Vec<String>,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            key: None,
            key_file: None,
            ttl: DEFAULT_TTL,
            parameter_name: DEFAULT_PARAMETER.to_owned(),
            methods: vec![Method::POST.to_string(), Method::PUT.to_string()],
        }
    }
}

impl CsrfConfig {
    #[must_use]
    pub fn with_key(key: impl Into<String>) -> Self {
        Self { key: Some(key.into()), ..Self::default() }
    }

    /// Loads the key once into the default sealed stack.
    ///
    /// # Errors
    /// Returns [`CsrfError::Container`] for missing, duplicated or unreadable key material.
    pub fn settings(&self) -> Result<ContainerSettings, CsrfError> {
        let container = ContainerConfig {
            key: self.key.clone(),
            key_file: self.key_file.clone(),
            ..ContainerConfig::default()
        };
        Ok(container.expand()?)
    }

    /// Parses `methods`, upper-casing each name.
    ///
    /// # Errors
    /// Returns [`CsrfError::Configuration`] for a name that is not an HTTP method.
    pub fn methods(&self) -> Result<Vec<Method>, CsrfError> {
        self.methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes()).map_err(|e| {
                    CsrfError::Configuration {
                        message: e.to_string().into(),
                        context: Some(format!("method {m:?}").into()),
                    }
                })
            })
            .collect()
    }

    /// # Errors
    /// Returns [`CsrfError::Configuration`] for a zero ttl, an empty parameter name or a bad
    /// method.
    pub fn validate(&self) -> Result<(), CsrfError> {
        if self.ttl.is_zero() {
            return Err(CsrfError::Configuration {
                message: "ttl must be greater than zero".into(),
                context: None,
            });
        }
        if self.parameter_name.trim().is_empty() {
            return Err(CsrfError::Configuration {
                message: "parameter-name cannot be empty".into(),
                context: None,
            });
        }
        self.methods().map(|_| ())
    }
}
