#![allow(dead_code, unreachable_pub)]

use cachet_container::prelude::*;
use cachet_container::{CompressorKind, RepresenterKind, SealerKind, SerializerKind};
use chrono::{DateTime, TimeZone, Utc};

pub const SECRET_KEY: &[u8; 32] = b"0123456789abcdef0123456789abcdef";

pub const RSA_PEM: &str = include_str!("keys/rsa.pem");
pub const P256_PEM: &str = include_str!("keys/p256.pem");
pub const P384_PEM: &str = include_str!("keys/p384.pem");
pub const P521_PEM: &str = include_str!("keys/p521.pem");
pub const ED25519_PEM: &str = include_str!("keys/ed25519.pem");

/// A fixed point in time with whole seconds, so both backends agree on the window.
#[must_use]
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
}

/// Key material suitable for `algorithm`.
#[must_use]
pub fn key_for(algorithm: SignatureAlgorithm) -> Vec<u8> {
    use SignatureAlgorithm as S;
    match algorithm {
        S::Hs256 | S::Hs384 | S::Hs512 => b"hmac-test-key".to_vec(),
        S::Rs256 | S::Rs384 | S::Rs512 | S::Ps256 | S::Ps384 | S::Ps512 => RSA_PEM.into(),
        S::Es256 => P256_PEM.into(),
        S::Es384 => P384_PEM.into(),
        S::Es512 => P521_PEM.into(),
        S::EdDsa => ED25519_PEM.into(),
    }
}

/// Every legal secretbox stage combination.
#[must_use]
pub fn secretbox_stacks() -> Vec<ContainerSettings> {
    let mut stacks = Vec::new();
    for serializer in [SerializerKind::Postcard, SerializerKind::Json] {
        for compressor in [CompressorKind::Nop, CompressorKind::Lz4] {
            for sealer in [SealerKind::Nop, SealerKind::SecretBox] {
                for representer in [RepresenterKind::Nop, RepresenterKind::Base64] {
                    let mut settings = ContainerSettings::secret_box(SECRET_KEY.as_slice());
                    settings.serializer = serializer;
                    settings.compressor = compressor;
                    settings.sealer = sealer;
                    settings.representer = representer;
                    stacks.push(settings);
                }
            }
        }
    }
    stacks
}

/// Initializes a factory over the default sealed stack.
/// # Panics
/// * If the factory cannot be built.
#[must_use]
pub fn setup_secretbox() -> ContainerFactory {
    ContainerFactory::new(ContainerSettings::secret_box(SECRET_KEY.as_slice()), OsRandom::shared())
        .expect("secretbox factory setup failed")
}

/// Initializes a signed-claims factory.
/// # Panics
/// * If the key does not suit the algorithm.
#[must_use]
pub fn setup_jwt(algorithm: SignatureAlgorithm) -> ContainerFactory {
    ContainerFactory::new(ContainerSettings::jwt(algorithm, key_for(algorithm)), OsRandom::shared())
        .expect("jwt factory setup failed")
}
