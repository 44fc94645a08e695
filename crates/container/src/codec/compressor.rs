use crate::error::ContainerError;
use crate::kinds::CompressorKind;

/// Upper bound for the size header of a compressed block.
const MAX_DECOMPRESSED_LEN: usize = 1 << 20;

impl CompressorKind {
    #[must_use]
    pub fn compress(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Nop => data.to_vec(),
            Self::Lz4 => lz4_flex::compress_prepend_size(data),
        }
    }

    /// Reverses [`CompressorKind::compress`].
    ///
    /// # Errors
    /// Returns [`ContainerError::Format`] if the stream is corrupt or claims an oversized block.
    pub fn decompress(self, data: &[u8]) -> Result<Vec<u8>, ContainerError> {
        match self {
            Self::Nop => Ok(data.to_vec()),
            Self::Lz4 => {
                let claimed = data
                    .get(..4)
                    .and_then(|size| size.try_into().ok())
                    .map(u32::from_le_bytes)
                    .ok_or_else(|| ContainerError::format("LZ4 stream too short"))?;
                if usize::try_from(claimed).map_or(true, |len| len > MAX_DECOMPRESSED_LEN) {
                    return Err(ContainerError::Format {
                        message: "LZ4 block too large".into(),
                        context: Some(format!("claimed={claimed}").into()),
                    });
                }
                lz4_flex::decompress_size_prepended(data).map_err(|e| ContainerError::Format {
                    message: e.to_string().into(),
                    context: Some("LZ4 stream invalid".into()),
                })
            },
        }
    }
}
