use crate::error::ContainerError;
use crate::kinds::ContainerKind;
use crate::model::{Data, Header, Nonce, Payload, PayloadKey};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::fmt::Debug;

/// A versioned, time-bounded, integrity-protected header and payload.
///
/// All methods take `&self`: every instance guards its state with one reader-writer
/// lock. Reads return owned copies; mutations and `save`/`load` take the write lock.
pub trait Container: Send + Sync + Debug {
    fn kind(&self) -> ContainerKind;

    fn header(&self) -> Header;

    fn payload(&self) -> Payload;

    fn data(&self) -> Data;

    /// Removes every payload entry.
    fn clean(&self);

    /// Increments the nonce when `nonce == 0`, otherwise sets it.
    fn touch(&self, nonce: Nonce);

    /// Checks version and `valid_after < now < valid_before`.
    ///
    /// # Errors
    /// [`ContainerError::Incompatible`], [`ContainerError::NotYetValid`] or
    /// [`ContainerError::Expired`].
    fn validate_at(&self, now: DateTime<Utc>) -> Result<(), ContainerError>;

    /// [`Container::validate_at`] against the system clock.
    ///
    /// # Errors
    /// See [`Container::validate_at`].
    fn validate(&self) -> Result<(), ContainerError> {
        self.validate_at(Utc::now())
    }

    /// Increments the nonce and replaces the validity window.
    fn refresh(&self, valid_after: DateTime<Utc>, valid_before: DateTime<Utc>);

    fn get(&self, key: PayloadKey) -> Option<Vec<u8>>;

    fn set(&self, key: PayloadKey, value: Vec<u8>);

    /// Removes `key`, returning whether it was present.
    fn del(&self, key: PayloadKey) -> bool;

    /// Encodes the container into its wire form.
    ///
    /// # Errors
    /// Returns [`ContainerError::Internal`] if encoding, sealing or signing fails.
    fn save(&self) -> Result<Vec<u8>, ContainerError>;

    /// Replaces the state with the decoded `bytes`.
    ///
    /// The state is left untouched on failure.
    ///
    /// # Errors
    /// [`ContainerError::Format`] or [`ContainerError::Decrypt`] for unreadable or forged input.
    fn load(&self, bytes: &[u8]) -> Result<(), ContainerError>;
}

/// Lock-guarded [`Data`] shared by both container backends.
#[derive(Debug)]
pub(crate) struct DataCell(RwLock<Data>);

impl DataCell {
    pub(crate) const fn new(data: Data) -> Self {
        Self(RwLock::new(data))
    }

    pub(crate) fn header(&self) -> Header {
        self.0.read().header
    }

    pub(crate) fn payload(&self) -> Payload {
        self.0.read().payload.clone()
    }

    pub(crate) fn data(&self) -> Data {
        self.0.read().clone()
    }

    pub(crate) fn clean(&self) {
        self.0.write().payload.clear();
    }

    pub(crate) fn touch(&self, nonce: Nonce) {
        self.0.write().header.touch(nonce);
    }

    pub(crate) fn validate_at(&self, now: DateTime<Utc>) -> Result<(), ContainerError> {
        self.0.read().header.validate_at(now)
    }

    pub(crate) fn refresh(&self, valid_after: DateTime<Utc>, valid_before: DateTime<Utc>) {
        self.0.write().header.refresh(valid_after, valid_before);
    }

    pub(crate) fn get(&self, key: PayloadKey) -> Option<Vec<u8>> {
        self.0.read().payload.get(key).map(<[u8]>::to_vec)
    }

    pub(crate) fn set(&self, key: PayloadKey, value: Vec<u8>) {
        self.0.write().payload.insert(key, value);
    }

    pub(crate) fn del(&self, key: PayloadKey) -> bool {
        self.0.write().payload.remove(key).is_some()
    }

    /// Runs `f` under the write lock.
    pub(crate) fn exclusive<R>(&self, f: impl FnOnce(&mut Data) -> R) -> R {
        f(&mut self.0.write())
    }
}
