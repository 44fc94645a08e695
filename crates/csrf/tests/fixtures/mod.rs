#![allow(dead_code, unreachable_pub)]

use cachet_container::{ContainerError, SecureRandom, SharedRandom};
use cachet_csrf::{Csrf, CsrfConfig};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

pub const SECRET_KEY: &str = "0123456789abcdef0123456789abcdef";

/// Fills every buffer with one counter byte, advancing per call.
#[derive(Debug, Default)]
pub struct CountingRandom(AtomicU8);

impl SecureRandom for CountingRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<(), ContainerError> {
        let byte = self.0.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        dest.fill(byte);
        Ok(())
    }
}

#[must_use]
pub fn counting_random() -> SharedRandom {
    Arc::new(CountingRandom::default())
}

#[must_use]
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
}

/// Initializes CSRF protection with the given ttl over a deterministic random source.
/// # Panics
/// * If the configuration is rejected.
#[must_use]
pub fn setup_csrf(ttl: Duration) -> Csrf {
    let config = CsrfConfig { ttl, ..CsrfConfig::with_key(SECRET_KEY) };
    Csrf::new(&config, counting_random()).expect("csrf setup failed")
}
