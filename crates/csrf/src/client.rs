use http::HeaderMap;
use std::net::IpAddr;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// The caller address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the socket peer.
///
/// Forwarding headers are only trustworthy behind a proxy that overwrites them.
#[must_use]
pub fn real_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    header(X_FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .and_then(|hop| hop.trim().parse().ok())
        .or_else(|| header(X_REAL_IP).and_then(|v| v.trim().parse().ok()))
        .or(peer)
}
