use crate::error::ContainerError;
use crate::kinds::RepresenterKind;
use base64::{Engine as _, engine::general_purpose};

impl RepresenterKind {
    #[must_use]
    pub fn encode(self, data: Vec<u8>) -> Vec<u8> {
        match self {
            Self::Nop => data,
            Self::Base64 => general_purpose::URL_SAFE.encode(data).into_bytes(),
        }
    }

    /// Maps transport text back to bytes.
    ///
    /// # Errors
    /// Returns [`ContainerError::Format`] for invalid base64.
    pub fn decode(self, data: &[u8]) -> Result<Vec<u8>, ContainerError> {
        match self {
            Self::Nop => Ok(data.to_vec()),
            Self::Base64 => general_purpose::URL_SAFE.decode(data).map_err(|e| ContainerError::Format {
                message: e.to_string().into(),
                context: Some("Invalid Base64".into()),
            }),
        }
    }
}
