use crate::error::ContainerError;
use crate::kinds::SerializerKind;
use serde::Serialize;
use serde::de::DeserializeOwned;

impl SerializerKind {
    /// Encodes `value` in this format.
    ///
    /// # Errors
    /// Returns [`ContainerError::Internal`] if the value cannot be represented.
    pub fn marshal<T: Serialize>(self, value: &T) -> Result<Vec<u8>, ContainerError> {
        let encoded = match self {
            Self::Postcard => postcard::to_stdvec(value).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_vec(value).map_err(|e| e.to_string()),
        };
        encoded.map_err(|message| ContainerError::Internal {
            message: message.into(),
            context: Some(format!("{self} encoding failed").into()),
        })
    }

    /// Decodes a value previously produced by [`SerializerKind::marshal`].
    ///
    /// # Errors
    /// Returns [`ContainerError::Format`] if `bytes` are not a valid encoding of `T`.
    pub fn unmarshal<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T, ContainerError> {
        let decoded = match self {
            Self::Postcard => postcard::from_bytes(bytes).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
        };
        decoded.map_err(|message| ContainerError::Format {
            message: message.into(),
            context: Some(format!("{self} decoding failed").into()),
        })
    }
}
