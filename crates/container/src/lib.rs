//! Stateless, cryptographically sealed token containers.
//!
//! A container is a versioned header (`version`, `nonce`, validity window) plus an opaque
//! key-to-bytes payload. Two backends share one [`Container`] contract:
//!
//! * **secretbox**: the whole header and payload run through a four-stage [`Codec`]
//!   (serialize, compress, seal, represent). The default stack is postcard, LZ4,
//!   XChaCha20-Poly1305 and URL-safe base64.
//! * **jwt**: the header maps onto registered claims and the token is a signed JWS.
//!   HMAC, RSA, RSA-PSS, ECDSA (P-256/384/521) and Ed25519 are supported.
//!
//! ## Sealed Wire Format
//!
//! ```text
//! base64url( [NONCE(24)][CIPHERTEXT(N)][TAG(16)] )
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cachet_container::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), ContainerError> {
//! let factory = ContainerFactory::from_config(
//!     &ContainerConfig::with_key("0123456789abcdef0123456789abcdef"),
//!     OsRandom::shared(),
//! )?;
//!
//! let issued = factory.create(chrono::Utc::now(), Duration::from_secs(60), Payload::new())?;
//! issued.set(1, b"user-42".to_vec());
//! let token = issued.save()?;
//!
//! let restored = factory.create(chrono::Utc::now(), Duration::from_secs(60), Payload::new())?;
//! restored.load(&token)?;
//! assert_eq!(restored.get(1).as_deref(), Some(b"user-42".as_slice()));
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
mod container;
mod error;
mod factory;
pub mod jwt;
pub mod kinds;
mod model;
mod random;
mod secretbox;

pub use codec::Codec;
pub use config::{ContainerConfig, ContainerSettings, JwtConfig, Key};
pub use container::Container;
pub use error::{ContainerError, ContainerErrorExt};
pub use factory::ContainerFactory;
pub use jwt::JwtContainer;
pub use kinds::{
    CompressorKind, ContainerKind, RepresenterKind, SealerKind, SerializerKind, SignatureAlgorithm,
};
pub use model::{Data, Header, Nonce, Payload, PayloadKey, VERSION, window_end};
pub use random::{OsRandom, SecureRandom, SharedRandom};
pub use secretbox::SecretBoxContainer;

pub mod prelude {
    pub use crate::config::{ContainerConfig, ContainerSettings};
    pub use crate::container::Container;
    pub use crate::error::{ContainerError, ContainerErrorExt};
    pub use crate::factory::ContainerFactory;
    pub use crate::kinds::{ContainerKind, SignatureAlgorithm};
    pub use crate::model::{Data, Header, Payload, PayloadKey};
    pub use crate::random::{OsRandom, SecureRandom, SharedRandom};
}
