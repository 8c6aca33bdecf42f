//! Client IP extraction from proxy headers
//!
//! Resolution order, first match wins:
//! 1. `X-Forwarded-For`: first entry of the comma-separated list
//! 2. `X-Real-IP`: used verbatim
//! 3. The socket peer address with any trailing `:port` removed
//! 4. The `"unknown"` sentinel
//!
//! Header values are trusted as-is and never validated as IP syntax. The
//! service expects a reverse proxy in front of it that sets them honestly.

use axum::http::HeaderMap;

use crate::models::UNKNOWN;

/// Sentinel returned when no source yields an address
pub const UNKNOWN_IP: &str = UNKNOWN;

/// Resolve the client IP for a request
///
/// # Arguments
/// * `headers` - HTTP request headers
/// * `peer_addr` - Raw socket peer address (e.g. `9.9.9.9:54321`), if known
pub fn resolve_client_ip(headers: &HeaderMap, peer_addr: Option<&str>) -> String {
    if let Some(ip) = forwarded_for(headers) {
        return ip;
    }

    if let Some(ip) = header_str(headers, "x-real-ip") {
        return ip.to_string();
    }

    match peer_addr.filter(|addr| !addr.is_empty()) {
        Some(addr) => strip_port(addr).to_string(),
        None => UNKNOWN_IP.to_string(),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
}

/// First entry of the X-Forwarded-For chain, trimmed
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let xff = header_str(headers, "x-forwarded-for")?;
    xff.split(',').next().map(|ip| ip.trim().to_string())
}

/// Drop everything from the last colon onwards
fn strip_port(addr: &str) -> &str {
    match addr.rfind(':') {
        Some(idx) => &addr[..idx],
        None => addr,
    }
}
