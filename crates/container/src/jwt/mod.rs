//! Signed-claims container.
//!
//! The header maps onto registered claims: `nbf` and `iat` carry `valid_after`, `exp`
//! carries `valid_before`. Version, nonce and payload travel as custom claims. Claim
//! timestamps are whole seconds, so windows are truncated to seconds on creation and
//! refresh to keep the in-memory header identical to what a reload yields.

mod cache;
mod signer;

pub use cache::signer;
pub use signer::Signer;

use crate::container::{Container, DataCell};
use crate::error::ContainerError;
use crate::kinds::ContainerKind;
use crate::model::{Data, Header, Nonce, Payload, PayloadKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub nbf: i64,
    pub iat: i64,
    pub exp: i64,
    pub version: u32,
    pub nonce: Nonce,
    #[serde(default, skip_serializing_if = "Payload::is_empty")]
    pub payload: Payload,
}

impl Claims {
    fn from_data(data: &Data) -> Self {
        Self {
            nbf: data.header.valid_after.timestamp(),
            iat: data.header.valid_after.timestamp(),
            exp: data.header.valid_before.timestamp(),
            version: data.header.version,
            nonce: data.header.nonce,
            payload: data.payload.clone(),
        }
    }

    fn into_data(self) -> Result<Data, ContainerError> {
        let at = |secs: i64, claim: &str| {
            DateTime::from_timestamp(secs, 0).ok_or_else(|| ContainerError::Format {
                message: format!("claim {claim:?} is out of range").into(),
                context: Some("JWT".into()),
            })
        };
        Ok(Data {
            header: Header {
                version: self.version,
                nonce: self.nonce,
                valid_after: at(self.iat, "iat")?,
                valid_before: at(self.exp, "exp")?,
            },
            payload: self.payload,
        })
    }
}

fn whole_seconds(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at)
}

/// Header and payload carried as signed JWT claims.
#[derive(Debug)]
pub struct JwtContainer {
    signer: Arc<Signer>,
    cell: DataCell,
}

impl JwtContainer {
    /// # Errors
    /// Returns [`ContainerError::Configuration`] if `ttl` is out of range.
    pub fn new(
        signer: Arc<Signer>,
        valid_after: DateTime<Utc>,
        ttl: Duration,
        payload: Payload,
    ) -> Result<Self, ContainerError> {
        let mut header = Header::new(valid_after, ttl)?;
        header.valid_after = whole_seconds(header.valid_after);
        header.valid_before = whole_seconds(header.valid_before);
        Ok(Self { signer, cell: DataCell::new(Data { header, payload }) })
    }

    #[must_use]
    pub fn signer(&self) -> &Signer {
        &self.signer
    }
}

impl Container for JwtContainer {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Jwt
    }

    fn header(&self) -> Header {
        self.cell.header()
    }

    fn payload(&self) -> Payload {
        self.cell.payload()
    }

    fn data(&self) -> Data {
        self.cell.data()
    }

    fn clean(&self) {
        self.cell.clean();
    }

    fn touch(&self, nonce: Nonce) {
        self.cell.touch(nonce);
    }

    fn validate_at(&self, now: DateTime<Utc>) -> Result<(), ContainerError> {
        self.cell.validate_at(now)
    }

    fn refresh(&self, valid_after: DateTime<Utc>, valid_before: DateTime<Utc>) {
        self.cell.refresh(whole_seconds(valid_after), whole_seconds(valid_before));
    }

    fn get(&self, key: PayloadKey) -> Option<Vec<u8>> {
        self.cell.get(key)
    }

    fn set(&self, key: PayloadKey, value: Vec<u8>) {
        self.cell.set(key, value);
    }

    fn del(&self, key: PayloadKey) -> bool {
        self.cell.del(key)
    }

    fn save(&self) -> Result<Vec<u8>, ContainerError> {
        self.cell.exclusive(|data| self.signer.sign(&Claims::from_data(data)).map(String::into_bytes))
    }

    fn load(&self, bytes: &[u8]) -> Result<(), ContainerError> {
        let token = std::str::from_utf8(bytes)
            .map_err(|_| ContainerError::format("JWT is not valid UTF-8"))?;
        self.cell.exclusive(|data| {
            *data = self.signer.verify(token.trim())?.into_data()?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::SignatureAlgorithm;
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

    fn container(key: &[u8]) -> JwtContainer {
        let signer = signer(SignatureAlgorithm::Hs256, key).expect("signer");
        let payload: Payload = [(1, b"bob".to_vec())].into_iter().collect();
        JwtContainer::new(signer, Utc::now(), Duration::from_secs(600), payload).expect("jwt")
    }

    #[test]
    fn claims_carry_the_header_mapping() {
        let c = container(b"jwt-unit-key");
        c.touch(5);
        let token = String::from_utf8(c.save().expect("save")).expect("utf8");

        let body = token.split('.').nth(1).expect("claims segment");
        let json: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(body).expect("b64")).expect("json");
        let header = c.header();

        assert_eq!(json["nbf"], header.valid_after.timestamp());
        assert_eq!(json["iat"], header.valid_after.timestamp());
        assert_eq!(json["exp"], header.valid_before.timestamp());
        assert_eq!(json["version"], 2);
        assert_eq!(json["nonce"], 5);
        assert_eq!(json["payload"]["1"], "Ym9i");
    }

    #[test]
    fn empty_payload_is_omitted() {
        let signer = signer(SignatureAlgorithm::Hs256, b"jwt-unit-key").expect("signer");
        let c = JwtContainer::new(signer, Utc::now(), Duration::from_secs(60), Payload::new())
            .expect("jwt");
        let token = String::from_utf8(c.save().expect("save")).expect("utf8");
        let body = token.split('.').nth(1).expect("claims segment");
        let json: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(body).expect("b64")).expect("json");

        assert!(json.get("payload").is_none());
    }

    #[test]
    fn windows_are_whole_seconds() {
        let c = container(b"jwt-unit-key");
        assert_eq!(c.header().valid_after.timestamp_subsec_nanos(), 0);
        assert_eq!(c.header().valid_before.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn foreign_key_is_a_decrypt_error() {
        let token = container(b"jwt-unit-key").save().expect("save");
        let err = container(b"another-key").load(&token).expect_err("wrong key");
        assert!(matches!(err, ContainerError::Decrypt { .. }));
    }
}
