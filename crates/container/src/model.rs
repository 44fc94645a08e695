use crate::error::ContainerError;
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, TimeDelta, Utc};
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Current container format version. Tokens carrying any other version are incompatible.
pub const VERSION: u32 = 2;

pub type Nonce = u64;
pub type PayloadKey = u32;

/// Version, nonce and validity window attached to every container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub version: u32,
    pub nonce: Nonce,
    pub valid_after: DateTime<Utc>,
    pub valid_before: DateTime<Utc>,
}

impl Header {
    /// A version-current header with nonce zero, valid from `valid_after` for `ttl`.
    ///
    /// # Errors
    /// Returns [`ContainerError::Configuration`] if `ttl` does not fit the calendar.
    pub fn new(valid_after: DateTime<Utc>, ttl: Duration) -> Result<Self, ContainerError> {
        Ok(Self {
            version: VERSION,
            nonce: 0,
            valid_after,
            valid_before: window_end(valid_after, ttl)?,
        })
    }

    /// Checks the version, then `valid_after < now < valid_before`.
    ///
    /// # Errors
    /// * [`ContainerError::Incompatible`] on a version mismatch.
    /// * [`ContainerError::NotYetValid`] if `now <= valid_after`.
    /// * [`ContainerError::Expired`] if `now >= valid_before`.
    pub fn validate_at(&self, now: DateTime<Utc>) -> Result<(), ContainerError> {
        if self.version != VERSION {
            return Err(ContainerError::Incompatible {
                found: self.version,
                expected: VERSION,
                context: None,
            });
        }
        if now <= self.valid_after {
            return Err(ContainerError::NotYetValid { valid_after: self.valid_after, context: None });
        }
        if now >= self.valid_before {
            return Err(ContainerError::Expired { valid_before: self.valid_before, context: None });
        }
        Ok(())
    }

    /// Increments the nonce when `nonce == 0`, otherwise sets it.
    pub const fn touch(&mut self, nonce: Nonce) {
        if nonce == 0 {
            self.nonce = self.nonce.wrapping_add(1);
        } else {
            self.nonce = nonce;
        }
    }

    pub const fn refresh(&mut self, valid_after: DateTime<Utc>, valid_before: DateTime<Utc>) {
        self.nonce = self.nonce.wrapping_add(1);
        self.valid_after = valid_after;
        self.valid_before = valid_before;
    }
}

/// Computes `start + ttl`.
///
/// # Errors
/// Returns [`ContainerError::Configuration`] if the sum overflows the calendar.
pub fn window_end(start: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, ContainerError> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| start.checked_add_signed(delta))
        .ok_or_else(|| ContainerError::configuration(format!("ttl {ttl:?} is out of range")))
}

/// Opaque key to bytes mapping carried inside a container.
///
/// Values serialize as raw bytes in binary formats and as base64 strings in text formats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload(BTreeMap<PayloadKey, Vec<u8>>);

impl Payload {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    #[must_use]
    pub fn get(&self, key: PayloadKey) -> Option<&[u8]> {
        self.0.get(&key).map(Vec::as_slice)
    }

    pub fn insert(&mut self, key: PayloadKey, value: impl Into<Vec<u8>>) -> Option<Vec<u8>> {
        self.0.insert(key, value.into())
    }

    pub fn remove(&mut self, key: PayloadKey) -> Option<Vec<u8>> {
        self.0.remove(&key)
    }

    #[must_use]
    pub fn contains_key(&self, key: PayloadKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PayloadKey, &[u8])> {
        self.0.iter().map(|(k, v)| (*k, v.as_slice()))
    }
}

impl From<BTreeMap<PayloadKey, Vec<u8>>> for Payload {
    fn from(map: BTreeMap<PayloadKey, Vec<u8>>) -> Self {
        Self(map)
    }
}

impl FromIterator<(PayloadKey, Vec<u8>)> for Payload {
    fn from_iter<I: IntoIterator<Item = (PayloadKey, Vec<u8>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Payload {
    type Item = (PayloadKey, Vec<u8>);
    type IntoIter = std::collections::btree_map::IntoIter<PayloadKey, Vec<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Header and payload snapshot; the unit a sealed container serializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    pub header: Header,
    pub payload: Payload,
}

// --- Serde ---

struct BytesRef<'a>(&'a [u8]);

impl Serialize for BytesRef<'_> {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.serialize_str(&general_purpose::STANDARD.encode(self.0))
        } else {
            s.serialize_bytes(self.0)
        }
    }
}

struct BytesBuf(Vec<u8>);

impl<'de> Deserialize<'de> for BytesBuf {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        if d.is_human_readable() {
            let text = String::deserialize(d)?;
            general_purpose::STANDARD
                .decode(text)
                .map(BytesBuf)
                .map_err(|e| de::Error::custom(format!("Invalid Base64: {e}")))
        } else {
            d.deserialize_byte_buf(BytesVisitor)
        }
    }
}

struct BytesVisitor;

impl<'de> Visitor<'de> for BytesVisitor {
    type Value = BytesBuf;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a byte array")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        Ok(BytesBuf(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
        Ok(BytesBuf(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut buf = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(byte) = seq.next_element::<u8>()? {
            buf.push(byte);
        }
        Ok(BytesBuf(buf))
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_map(self.0.iter().map(|(k, v)| (k, BytesRef(v))))
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<PayloadKey, BytesBuf>::deserialize(d)?;
        Ok(Self(raw.into_iter().map(|(k, v)| (k, v.0)).collect()))
    }
}
