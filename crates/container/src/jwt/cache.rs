use crate::error::ContainerError;
use crate::jwt::Signer;
use crate::kinds::SignatureAlgorithm;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// Identifies a signer by algorithm and a digest of the key contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    algorithm: SignatureAlgorithm,
    digest: [u8; 32],
}

impl CacheKey {
    fn new(algorithm: SignatureAlgorithm, key: &[u8]) -> Self {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Sha256::digest(key));
        Self { algorithm, digest }
    }
}

static SIGNERS: LazyLock<RwLock<FxHashMap<CacheKey, Arc<Signer>>>> =
    LazyLock::new(|| RwLock::new(FxHashMap::default()));

/// Returns the process-wide signer for `algorithm` and `key`, building it on first use.
///
/// Concurrent first use of the same key builds exactly one signer: the lookup is
/// repeated under the write lock before constructing.
///
/// # Errors
/// Returns [`ContainerError::Configuration`] if the key does not suit the algorithm.
pub fn signer(algorithm: SignatureAlgorithm, key: &[u8]) -> Result<Arc<Signer>, ContainerError> {
    let cache_key = CacheKey::new(algorithm, key);

    if let Some(signer) = SIGNERS.read().get(&cache_key) {
        return Ok(Arc::clone(signer));
    }

    let mut signers = SIGNERS.write();
    if let Some(signer) = signers.get(&cache_key) {
        return Ok(Arc::clone(signer));
    }

    let signer = Arc::new(Signer::new(algorithm, key)?);
    debug!(%algorithm, key_digest = %hex::encode(&cache_key.digest[..8]), "Built JWT signer");
    signers.insert(cache_key, Arc::clone(&signer));

    Ok(signer)
}
