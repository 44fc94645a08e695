//! # Container Errors
//!
//! This module defines the [`ContainerError`] enum used throughout the container crate.
//! Every pipeline stage reports exactly one kind, so callers can branch on the kind
//! instead of inspecting message text.

use chrono::{DateTime, Utc};
use std::borrow::Cow;

/// A specialized error enum for container construction, encoding and validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Unknown algorithm name, illegal stage combination or bad key material.
    ///
    /// Raised while building a container from configuration, never while handling a token.
    #[error("Invalid configuration{}: {message}", format_context(.context))]
    Configuration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Malformed, truncated or otherwise undecodable token bytes.
    #[error("Malformed token{}: {message}", format_context(.context))]
    Format { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Authentication failed: wrong key, tampered ciphertext or signature mismatch.
    #[error("Decryption error{}: {message}", format_context(.context))]
    Decrypt { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The token was produced by an incompatible container version.
    #[error("Incompatible container{}: version {found}, expected {expected}", format_context(.context))]
    Incompatible { found: u32, expected: u32, context: Option<Cow<'static, str>> },

    /// The validity window has not started yet.
    #[error("Container is not yet valid{}: valid after {valid_after}", format_context(.context))]
    NotYetValid { valid_after: DateTime<Utc>, context: Option<Cow<'static, str>> },

    /// The validity window is over.
    #[error("Container expired{}: valid before {valid_before}", format_context(.context))]
    Expired { valid_before: DateTime<Utc>, context: Option<Cow<'static, str>> },

    /// Key material could not be read from disk.
    #[error("Key file error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal container error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ContainerError {
    pub(crate) fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Configuration { message: message.into(), context: None }
    }

    pub(crate) fn format(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Format { message: message.into(), context: None }
    }

    pub(crate) fn decrypt(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Decrypt { message: message.into(), context: None }
    }

    /// The token bytes are unreadable or forged.
    #[must_use]
    pub const fn is_format_or_decrypt(&self) -> bool {
        matches!(self, Self::Format { .. } | Self::Decrypt { .. })
    }

    /// The token decoded fine but is outside its window or from another version.
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        matches!(self, Self::Incompatible { .. } | Self::NotYetValid { .. } | Self::Expired { .. })
    }

    /// Callers should treat the token as absent and issue a new one.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        self.is_format_or_decrypt() || self.is_invalid()
    }

    fn context_mut(&mut self) -> &mut Option<Cow<'static, str>> {
        match self {
            Self::Configuration { context, .. }
            | Self::Format { context, .. }
            | Self::Decrypt { context, .. }
            | Self::Incompatible { context, .. }
            | Self::NotYetValid { context, .. }
            | Self::Expired { context, .. }
            | Self::Io { context, .. }
            | Self::Internal { context, .. } => context,
        }
    }
}

/// Attaches a human-readable context to container results.
pub trait ContainerErrorExt<T> {
    /// Sets the context of the error, if any.
    ///
    /// # Errors
    /// Returns the original error with the context attached.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ContainerError>;
}

impl<T> ContainerErrorExt<T> for Result<T, ContainerError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            *e.context_mut() = Some(context.into());
            e
        })
    }
}

impl<T> ContainerErrorExt<T> for Result<T, std::io::Error> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ContainerError> {
        self.map_err(|source| ContainerError::Io { source, context: Some(context.into()) })
    }
}

impl From<std::io::Error> for ContainerError {
    #[inline]
    fn from(source: std::io::Error) -> Self {
        Self::Io { source, context: None }
    }
}

impl From<&'static str> for ContainerError {
    #[inline]
    fn from(s: &'static str) -> Self {
        Self::Internal { message: Cow::Borrowed(s), context: None }
    }
}

impl From<String> for ContainerError {
    #[inline]
    fn from(s: String) -> Self {
        Self::Internal { message: Cow::Owned(s), context: None }
    }
}

pub(crate) fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
