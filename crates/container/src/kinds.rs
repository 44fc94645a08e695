//! Closed registries of container types, pipeline stages and signature algorithms.
//!
//! Names are matched case-insensitively. A failed lookup produces a configuration error
//! that lists every legal name in sorted order.

use crate::error::ContainerError;
use std::str::FromStr;
use strum::VariantNames;
use strum_macros::{Display, EnumString, VariantNames as DeriveVariantNames};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, DeriveVariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ContainerKind {
    #[default]
    SecretBox,
    Jwt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, DeriveVariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SerializerKind {
    /// Compact binary encoding.
    Postcard,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, DeriveVariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CompressorKind {
    Nop,
    Lz4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, DeriveVariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SealerKind {
    Nop,
    /// XChaCha20-Poly1305 with an embedded random nonce.
    SecretBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, DeriveVariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RepresenterKind {
    Nop,
    /// URL-safe base64 with padding.
    Base64,
}

/// JWS algorithms accepted by the signed-claims container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, DeriveVariantNames)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum SignatureAlgorithm {
    #[default]
    Hs256,
    Hs384,
    Hs512,
    Rs256,
    Rs384,
    Rs512,
    Ps256,
    Ps384,
    Ps512,
    Es256,
    Es384,
    Es512,
    #[strum(serialize = "EdDSA")]
    EdDsa,
}

impl SignatureAlgorithm {
    /// HMAC algorithms take the raw key; all others need a PEM private key.
    #[must_use]
    pub const fn is_symmetric(self) -> bool {
        matches!(self, Self::Hs256 | Self::Hs384 | Self::Hs512)
    }
}

/// Resolves a registry name, enumerating the legal names on failure.
///
/// # Errors
/// Returns [`ContainerError::Configuration`] if `name` is not a member of `T`.
pub fn parse_kind<T>(entity: &str, name: &str) -> Result<T, ContainerError>
where
    T: FromStr + VariantNames,
{
    name.trim().parse::<T>().map_err(|_| {
        let mut legal = T::VARIANTS.to_vec();
        legal.sort_unstable();
        ContainerError::configuration(format!(
            "unexpected container {entity} {name:?}, expected one of: {}",
            legal.join(", ")
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        let alg: SignatureAlgorithm = parse_kind("algorithm", "eddsa").expect("eddsa");
        assert_eq!(alg, SignatureAlgorithm::EdDsa);
        assert_eq!(alg.to_string(), "EdDSA");

        let kind: ContainerKind = parse_kind("type", "SecretBox").expect("secretbox");
        assert_eq!(kind.to_string(), "secretbox");
    }

    #[test]
    fn unknown_names_list_sorted_alternatives() {
        let err = parse_kind::<CompressorKind>("compressor", "zstd").expect_err("unknown");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: unexpected container compressor \"zstd\", expected one of: lz4, nop"
        );
    }

    #[test]
    fn algorithm_registry_is_complete() {
        assert_eq!(SignatureAlgorithm::VARIANTS.len(), 13);
        assert!(SignatureAlgorithm::Hs512.is_symmetric());
        assert!(!SignatureAlgorithm::Ps256.is_symmetric());
    }
}
