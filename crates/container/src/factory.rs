use crate::codec::Codec;
use crate::config::{ContainerConfig, ContainerSettings};
use crate::container::Container;
use crate::error::ContainerError;
use crate::jwt::{self, JwtContainer, Signer};
use crate::kinds::ContainerKind;
use crate::model::Payload;
use crate::random::SharedRandom;
use crate::secretbox::SecretBoxContainer;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Builds containers of one configured kind.
///
/// The pipeline or signer is constructed once here; [`ContainerFactory::create`] is cheap.
/// Clones share the same backend.
#[derive(Debug, Clone)]
pub struct ContainerFactory {
    settings: Arc<ContainerSettings>,
    backend: Backend,
}

#[derive(Debug, Clone)]
enum Backend {
    SecretBox(Codec),
    Jwt(Arc<Signer>),
}

impl ContainerFactory {
    /// # Errors
    /// Returns [`ContainerError::Configuration`] if the settings, key or algorithm are unusable.
    pub fn new(settings: ContainerSettings, rand: SharedRandom) -> Result<Self, ContainerError> {
        settings.validate()?;
        let backend = match settings.kind {
            ContainerKind::SecretBox => Backend::SecretBox(Codec::new(&settings, rand)?),
            ContainerKind::Jwt => {
                Backend::Jwt(jwt::signer(settings.algorithm, settings.key.as_bytes())?)
            },
        };

        info!(
            kind = %settings.kind,
            serializer = %settings.serializer,
            compressor = %settings.compressor,
            sealer = %settings.sealer,
            representer = %settings.representer,
            algorithm = %settings.algorithm,
            "Container factory initialized"
        );

        Ok(Self { settings: Arc::new(settings), backend })
    }

    /// Expands `config` and builds the factory.
    ///
    /// # Errors
    /// See [`ContainerConfig::expand`] and [`ContainerFactory::new`].
    pub fn from_config(config: &ContainerConfig, rand: SharedRandom) -> Result<Self, ContainerError> {
        Self::new(config.expand()?, rand)
    }

    #[must_use]
    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    #[must_use]
    pub fn kind(&self) -> ContainerKind {
        self.settings.kind
    }

    /// A fresh container valid from `valid_after` for `ttl`, nonce zero.
    ///
    /// # Errors
    /// Returns [`ContainerError::Configuration`] if `ttl` is out of range.
    pub fn create(
        &self,
        valid_after: DateTime<Utc>,
        ttl: Duration,
        payload: Payload,
    ) -> Result<Box<dyn Container>, ContainerError> {
        Ok(match &self.backend {
            Backend::SecretBox(codec) => {
                Box::new(SecretBoxContainer::new(codec.clone(), valid_after, ttl, payload)?)
            },
            Backend::Jwt(signer) => {
                Box::new(JwtContainer::new(Arc::clone(signer), valid_after, ttl, payload)?)
            },
        })
    }
}
