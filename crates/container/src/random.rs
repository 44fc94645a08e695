use crate::error::ContainerError;
use std::fmt::Debug;
use std::sync::Arc;

/// A cryptographically secure source of random bytes.
///
/// Sealing and CSRF signing draw from it on every call, so implementations must be
/// safe to share between concurrent requests.
pub trait SecureRandom: Send + Sync + Debug {
    /// Fills `dest` entirely with random bytes.
    ///
    /// # Errors
    /// Returns [`ContainerError::Internal`] if the source is unavailable.
    fn fill(&self, dest: &mut [u8]) -> Result<(), ContainerError>;
}

/// Shared handle to a random source.
pub type SharedRandom = Arc<dyn SecureRandom>;

/// The operating system RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl OsRandom {
    /// Returns the OS RNG behind a shareable handle.
    #[must_use]
    pub fn shared() -> SharedRandom {
        Arc::new(Self)
    }
}

impl SecureRandom for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<(), ContainerError> {
        getrandom::fill(dest).map_err(|e| ContainerError::Internal {
            message: e.to_string().into(),
            context: Some("System RNG unavailable".into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_random_fills_buffer() {
        let rand = OsRandom::shared();
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        rand.fill(&mut a).expect("fill a");
        rand.fill(&mut b).expect("fill b");

        assert_ne!(a, b, "two draws of 256 bits should never collide");
    }
}
