use crate::error::ContainerError;
use crate::kinds::SealerKind;
use crate::random::SharedRandom;
use aead::inout::InOutBuf;
use aead::{AeadInOut, KeyInit, Nonce, Tag};
use chacha20poly1305::XChaCha20Poly1305;
use std::fmt;
use std::sync::Arc;

/// Key length required by the secretbox sealer.
pub const KEY_LEN: usize = 32;

/// XChaCha20 nonce length (192-bit).
pub(crate) const NONCE_LEN: usize = 24;

/// Poly1305 tag length (128-bit).
pub(crate) const TAG_LEN: usize = 16;

/// The authenticate/encrypt stage.
#[derive(Debug, Clone)]
pub enum Sealer {
    Nop,
    SecretBox(SecretBoxSealer),
}

impl Sealer {
    /// Builds the stage selected by `kind`.
    ///
    /// # Errors
    /// Returns [`ContainerError::Configuration`] if the secretbox key is not [`KEY_LEN`] bytes.
    pub fn new(kind: SealerKind, key: &[u8], rand: SharedRandom) -> Result<Self, ContainerError> {
        match kind {
            SealerKind::Nop => Ok(Self::Nop),
            SealerKind::SecretBox => SecretBoxSealer::new(key, rand).map(Self::SecretBox),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> SealerKind {
        match self {
            Self::Nop => SealerKind::Nop,
            Self::SecretBox(_) => SealerKind::SecretBox,
        }
    }

    /// # Errors
    /// Returns [`ContainerError::Internal`] if the random source or the cipher fails.
    pub fn seal(&self, data: &[u8]) -> Result<Vec<u8>, ContainerError> {
        match self {
            Self::Nop => Ok(data.to_vec()),
            Self::SecretBox(sealer) => sealer.seal(data),
        }
    }

    /// # Errors
    /// Returns [`ContainerError::Decrypt`] on any corruption or key mismatch.
    pub fn open(&self, data: &[u8]) -> Result<Vec<u8>, ContainerError> {
        match self {
            Self::Nop => Ok(data.to_vec()),
            Self::SecretBox(sealer) => sealer.open(data),
        }
    }
}

/// XChaCha20-Poly1305 box laid out as `[NONCE(24)][CIPHERTEXT(N)][TAG(16)]`.
///
/// Every seal draws a fresh random nonce, so the output never repeats for equal input.
#[derive(Clone)]
pub struct SecretBoxSealer {
    cipher: Arc<XChaCha20Poly1305>,
    rand: SharedRandom,
}

impl fmt::Debug for SecretBoxSealer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretBoxSealer").field("rand", &self.rand).finish_non_exhaustive()
    }
}

impl SecretBoxSealer {
    /// # Errors
    /// Returns [`ContainerError::Configuration`] if `key` is not [`KEY_LEN`] bytes.
    pub fn new(key: &[u8], rand: SharedRandom) -> Result<Self, ContainerError> {
        if key.len() != KEY_LEN {
            return Err(ContainerError::configuration(format!(
                "invalid encryption key length, want {KEY_LEN}, got {}",
                key.len()
            )));
        }
        let cipher = XChaCha20Poly1305::new_from_slice(key)
            .map_err(|_| ContainerError::configuration("invalid encryption key"))?;
        Ok(Self { cipher: Arc::new(cipher), rand })
    }

    fn seal(&self, data: &[u8]) -> Result<Vec<u8>, ContainerError> {
        let mut nonce = Nonce::<XChaCha20Poly1305>::default();
        self.rand.fill(&mut nonce)?;

        let mut buf = Vec::with_capacity(NONCE_LEN + data.len() + TAG_LEN);
        buf.extend_from_slice(&nonce);
        buf.extend_from_slice(data);

        let (_nonce_part, data_part) = buf.split_at_mut(NONCE_LEN);
        let tag = self
            .cipher
            .encrypt_inout_detached(&nonce, &[], InOutBuf::from(data_part))
            .map_err(|_| ContainerError::Internal {
                message: "Encryption failed".into(),
                context: Some("AEAD encryption failed".into()),
            })?;

        buf.extend_from_slice(tag.as_slice());
        Ok(buf)
    }

    fn open(&self, blob: &[u8]) -> Result<Vec<u8>, ContainerError> {
        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(ContainerError::Decrypt {
                message: format!(
                    "Sealed box too short ({} bytes). Expected at least {} bytes",
                    blob.len(),
                    NONCE_LEN + TAG_LEN
                )
                .into(),
                context: None,
            });
        }

        let (nonce_slice, rest) = blob.split_at(NONCE_LEN);
        let (ciphertext, tag_slice) = rest.split_at(rest.len() - TAG_LEN);

        let nonce: Nonce<XChaCha20Poly1305> =
            nonce_slice.try_into().map_err(|_| ContainerError::decrypt("Invalid nonce length"))?;
        let tag: Tag<XChaCha20Poly1305> =
            tag_slice.try_into().map_err(|_| ContainerError::decrypt("Invalid tag length"))?;

        let mut buf = ciphertext.to_vec();
        self.cipher
            .decrypt_inout_detached(&nonce, &[], InOutBuf::from(&mut buf[..]), &tag)
            .map_err(|_| ContainerError::Decrypt {
                message: "Decryption failed".into(),
                context: Some("AEAD authentication failed".into()),
            })?;

        Ok(buf)
    }
}
