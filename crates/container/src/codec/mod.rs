//! The four-stage encoding pipeline.
//!
//! ```text
//! encode: serialize -> compress -> seal -> represent
//! decode: represent⁻¹ -> open -> decompress -> deserialize
//! ```
//!
//! Compression runs before sealing, so ciphertext length reveals how well the payload
//! compressed. Avoid the `lz4` stage when an attacker can both influence payload values
//! and observe token sizes.

mod compressor;
mod representer;
mod sealer;
mod serializer;

pub use sealer::{KEY_LEN, SecretBoxSealer, Sealer};

use crate::config::ContainerSettings;
use crate::error::ContainerError;
use crate::kinds::{CompressorKind, RepresenterKind, SerializerKind};
use crate::random::SharedRandom;
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone)]
pub struct Codec {
    serializer: SerializerKind,
    compressor: CompressorKind,
    sealer: Sealer,
    representer: RepresenterKind,
}

impl Codec {
    /// Builds the pipeline selected by `settings`.
    ///
    /// # Errors
    /// Returns [`ContainerError::Configuration`] if the sealer rejects the key.
    pub fn new(settings: &ContainerSettings, rand: SharedRandom) -> Result<Self, ContainerError> {
        Ok(Self {
            serializer: settings.serializer,
            compressor: settings.compressor,
            sealer: Sealer::new(settings.sealer, settings.key.as_bytes(), rand)?,
            representer: settings.representer,
        })
    }

    #[must_use]
    pub const fn serializer(&self) -> SerializerKind {
        self.serializer
    }

    /// # Errors
    /// Returns [`ContainerError::Internal`] if serialization or sealing fails.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ContainerError> {
        let serialized = self.serializer.marshal(value)?;
        let compressed = self.compressor.compress(&serialized);
        let sealed = self.sealer.seal(&compressed)?;
        Ok(self.representer.encode(sealed))
    }

    /// # Errors
    /// * [`ContainerError::Format`] if any stage finds malformed input.
    /// * [`ContainerError::Decrypt`] if the sealed box fails authentication.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, ContainerError> {
        let sealed = self.representer.decode(bytes)?;
        let compressed = self.sealer.open(&sealed)?;
        let serialized = self.compressor.decompress(&compressed)?;
        self.serializer.unmarshal(&serialized)
    }
}
