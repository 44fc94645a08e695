use crate::error::{ContainerError, ContainerErrorExt};
use crate::kinds::{
    CompressorKind, ContainerKind, RepresenterKind, SealerKind, SerializerKind, SignatureAlgorithm,
    parse_kind,
};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Container configuration as written in the configuration file.
///
/// Stage names stay strings here; [`ContainerConfig::expand`] resolves them against the
/// closed registries and loads the key once. Stage names left empty take the defaults of
/// the selected `type`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ContainerConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub serializer: String,
    pub compressor: String,
    pub sealer: String,
    pub representer: String,
    pub key: Option<String>,
    pub key_file: Option<PathBuf>,
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct JwtConfig {
    #[serde(alias = "algo")]
    pub algorithm: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self { algorithm: SignatureAlgorithm::default().to_string() }
    }
}

/// Raw key bytes, wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Key(Vec<u8>);

impl Key {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Key {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Key {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key(<{} bytes>)", self.0.len())
    }
}

/// Validated, immutable container settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSettings {
    pub kind: ContainerKind,
    pub serializer: SerializerKind,
    pub compressor: CompressorKind,
    pub sealer: SealerKind,
    pub representer: RepresenterKind,
    pub algorithm: SignatureAlgorithm,
    pub key: Key,
}

impl ContainerSettings {
    /// The default sealed stack (postcard, lz4, secretbox, base64) over `key`.
    #[must_use]
    pub fn secret_box(key: impl Into<Key>) -> Self {
        Self {
            kind: ContainerKind::SecretBox,
            serializer: SerializerKind::Postcard,
            compressor: CompressorKind::Lz4,
            sealer: SealerKind::SecretBox,
            representer: RepresenterKind::Base64,
            algorithm: SignatureAlgorithm::default(),
            key: key.into(),
        }
    }

    /// The only legal stack for signed claims, with the given algorithm.
    #[must_use]
    pub fn jwt(algorithm: SignatureAlgorithm, key: impl Into<Key>) -> Self {
        Self {
            kind: ContainerKind::Jwt,
            serializer: SerializerKind::Json,
            compressor: CompressorKind::Nop,
            sealer: SealerKind::Nop,
            representer: RepresenterKind::Nop,
            algorithm,
            key: key.into(),
        }
    }

    /// Whether tokens come out as printable text, as cookies and headers require.
    #[must_use]
    pub fn emits_text(&self) -> bool {
        self.kind == ContainerKind::Jwt || self.representer != RepresenterKind::Nop
    }

    /// Rejects stage combinations the container type cannot carry.
    ///
    /// # Errors
    /// Returns [`ContainerError::Configuration`] naming the expected stage.
    pub fn validate(&self) -> Result<(), ContainerError> {
        if self.key.as_bytes().is_empty() {
            return Err(ContainerError::configuration("key length should be greater than zero"));
        }
        if self.kind != ContainerKind::Jwt {
            return Ok(());
        }

        let mismatch = |stage: &str, got: &dyn fmt::Display, want: &dyn fmt::Display, why: &str| {
            ContainerError::configuration(format!(
                "unexpected {stage} \"{got}\" for \"{}\", expected \"{want}\", {why}",
                ContainerKind::Jwt
            ))
        };
        if self.serializer != SerializerKind::Json {
            return Err(mismatch(
                "serializer",
                &self.serializer,
                &SerializerKind::Json,
                "claims are always json",
            ));
        }
        if self.compressor != CompressorKind::Nop {
            return Err(mismatch(
                "compressor",
                &self.compressor,
                &CompressorKind::Nop,
                "there is no compression in jwt",
            ));
        }
        if self.sealer != SealerKind::Nop {
            return Err(mismatch(
                "sealer",
                &self.sealer,
                &SealerKind::Nop,
                "sealing is handled by the signature",
            ));
        }
        if self.representer != RepresenterKind::Nop {
            return Err(mismatch(
                "representer",
                &self.representer,
                &RepresenterKind::Nop,
                "representation is handled by the token format",
            ));
        }
        Ok(())
    }
}

impl ContainerConfig {
    /// Sealed container over an inline key with default stages.
    #[must_use]
    pub fn with_key(key: impl Into<String>) -> Self {
        Self { key: Some(key.into()), ..Self::default() }
    }

    /// Resolves every name, loads the key exactly once and validates the combination.
    ///
    /// # Errors
    /// * [`ContainerError::Configuration`] for unknown names, illegal combinations or bad
    ///   key material.
    /// * [`ContainerError::Io`] if `key-file` cannot be read.
    pub fn expand(&self) -> Result<ContainerSettings, ContainerError> {
        let mut settings = self.resolve_stages()?;
        settings.key = self.load_key()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Resolves the type and stage names without touching the key, which is left empty.
    ///
    /// # Errors
    /// Returns [`ContainerError::Configuration`] for unknown names.
    pub fn resolve_stages(&self) -> Result<ContainerSettings, ContainerError> {
        let kind = if self.kind.trim().is_empty() {
            ContainerKind::default()
        } else {
            parse_kind::<ContainerKind>("type", &self.kind)?
        };
        let mut settings = match kind {
            ContainerKind::SecretBox => ContainerSettings::secret_box(Vec::new()),
            ContainerKind::Jwt => ContainerSettings::jwt(SignatureAlgorithm::default(), Vec::new()),
        };

        if !self.serializer.trim().is_empty() {
            settings.serializer = parse_kind("serializer", &self.serializer)?;
        }
        if !self.compressor.trim().is_empty() {
            settings.compressor = parse_kind("compressor", &self.compressor)?;
        }
        if !self.sealer.trim().is_empty() {
            settings.sealer = parse_kind("sealer", &self.sealer)?;
        }
        if !self.representer.trim().is_empty() {
            settings.representer = parse_kind("representer", &self.representer)?;
        }
        if !self.jwt.algorithm.trim().is_empty() {
            settings.algorithm = parse_kind("algorithm", &self.jwt.algorithm)?;
        }
        Ok(settings)
    }

    fn load_key(&self) -> Result<Key, ContainerError> {
        let inline = self.key.as_deref().filter(|k| !k.is_empty());
        let file = self.key_file.as_ref().filter(|p| !p.as_os_str().is_empty());

        match (inline, file) {
            (Some(_), Some(_)) => Err(ContainerError::configuration(
                "either key or key-file must be defined, not both",
            )),
            (None, None) => Err(ContainerError::configuration("either key or key-file must be defined")),
            (Some(key), None) => Ok(Key::from(key.as_bytes())),
            (None, Some(path)) => std::fs::read(path)
                .map(Key::from)
                .context(format!("failed to load key-file: {}", path.display())),
        }
    }
}

/// Serde adapter for human-readable durations such as `"7d"` or `"90s"`.
pub mod duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serializes a duration in `humantime` form.
    ///
    /// # Errors
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&humantime::format_duration(*value))
    }

    /// Deserializes a `humantime` duration string.
    ///
    /// # Errors
    /// Fails on strings `humantime` cannot parse.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_container_type() {
        let settings = ContainerConfig::with_key("k").expand().expect("secretbox defaults");
        assert_eq!(settings.serializer, SerializerKind::Postcard);
        assert_eq!(settings.compressor, CompressorKind::Lz4);
        assert_eq!(settings.sealer, SealerKind::SecretBox);
        assert_eq!(settings.representer, RepresenterKind::Base64);

        let jwt = ContainerConfig { kind: "JWT".into(), ..ContainerConfig::with_key("k") }
            .expand()
            .expect("jwt defaults");
        assert_eq!(jwt.serializer, SerializerKind::Json);
        assert_eq!(jwt.representer, RepresenterKind::Nop);
        assert_eq!(jwt.algorithm, SignatureAlgorithm::Hs256);
    }

    #[test]
    fn key_rules_are_enforced() {
        let none = ContainerConfig::default().expand().expect_err("no key");
        assert!(none.to_string().contains("either key or key-file must be defined"));

        let both = ContainerConfig {
            key_file: Some(PathBuf::from("/tmp/key")),
            ..ContainerConfig::with_key("k")
        }
        .expand()
        .expect_err("both keys");
        assert!(both.to_string().contains("not both"));
    }

    #[test]
    fn missing_key_file_is_io_error() {
        let cfg = ContainerConfig {
            key_file: Some(PathBuf::from("/definitely/not/here.key")),
            ..ContainerConfig::default()
        };
        assert!(matches!(cfg.expand(), Err(ContainerError::Io { .. })));
    }

    #[test]
    fn stages_resolve_without_a_key() {
        let raw = ContainerConfig { representer: "NOP".into(), ..ContainerConfig::default() };
        let stages = raw.resolve_stages().expect("no key needed");
        assert!(stages.key.as_bytes().is_empty());
        assert!(!stages.emits_text());

        let jwt = ContainerConfig { kind: "jwt".into(), ..ContainerConfig::default() };
        assert!(jwt.resolve_stages().expect("jwt").emits_text());
        assert!(ContainerConfig::default().resolve_stages().expect("defaults").emits_text());
    }

    #[test]
    fn key_debug_never_prints_bytes() {
        let key = Key::from(b"super-secret".as_slice());
        assert_eq!(format!("{key:?}"), "Key(<12 bytes>)");
    }
}
