use crate::codec::Codec;
use crate::container::{Container, DataCell};
use crate::error::ContainerError;
use crate::kinds::ContainerKind;
use crate::model::{Data, Header, Nonce, Payload, PayloadKey};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Header and payload encrypted as one unit through a [`Codec`].
#[derive(Debug)]
pub struct SecretBoxContainer {
    codec: Codec,
    cell: DataCell,
}

impl SecretBoxContainer {
    /// # Errors
    /// Returns [`ContainerError::Configuration`] if `ttl` is out of range.
    pub fn new(
        codec: Codec,
        valid_after: DateTime<Utc>,
        ttl: Duration,
        payload: Payload,
    ) -> Result<Self, ContainerError> {
        let header = Header::new(valid_after, ttl)?;
        Ok(Self { codec, cell: DataCell::new(Data { header, payload }) })
    }
}

impl Container for SecretBoxContainer {
    fn kind(&self) -> ContainerKind {
        ContainerKind::SecretBox
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
        self.cell.refresh(valid_after, valid_before);
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
        self.cell.exclusive(|data| self.codec.encode(&*data))
    }

    fn load(&self, bytes: &[u8]) -> Result<(), ContainerError> {
        self.cell.exclusive(|data| {
            *data = self.codec.decode::<Data>(bytes)?;
            Ok(())
        })
    }
}
