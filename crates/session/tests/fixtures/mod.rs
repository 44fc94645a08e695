#![allow(dead_code, unreachable_pub)]

use cachet_container::{ContainerConfig, OsRandom};
use cachet_session::{Exchange, SessionConfig, Sessions};
use chrono::{DateTime, TimeZone, Utc};
use http::{HeaderMap, HeaderValue, header};

pub const SECRET_KEY: &str = "0123456789abcdef0123456789abcdef";

#[must_use]
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
}

#[must_use]
pub fn config() -> SessionConfig {
    SessionConfig { container: ContainerConfig::with_key(SECRET_KEY), ..SessionConfig::default() }
}

/// Initializes a session handle over the default sealed stack.
/// # Panics
/// * If the configuration is rejected.
#[must_use]
pub fn setup_sessions(config: &SessionConfig) -> Sessions {
    Sessions::from_config(config, OsRandom::shared()).expect("sessions setup failed")
}

/// An exchange for `host` carrying the given request headers.
#[must_use]
pub fn exchange(host: &str, headers: &[(header::HeaderName, String)]) -> Exchange {
    let mut map = HeaderMap::new();
    map.insert(header::HOST, HeaderValue::from_str(host).expect("host"));
    for (name, value) in headers {
        map.append(name.clone(), HeaderValue::from_str(value).expect("header value"));
    }
    Exchange::new(map)
}
