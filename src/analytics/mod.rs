//! Visitor IP resolution and geolocation
//!
//! Resolves the client address behind proxies and enriches events with
//! location data from an external lookup service.

pub mod geoip;
pub mod ip_extractor;
pub mod models;

pub use geoip::{GeoLocator, GeoLookupError, IpInfoLocator};
pub use ip_extractor::{resolve_client_ip, UNKNOWN_IP};
pub use models::GeoInfo;
