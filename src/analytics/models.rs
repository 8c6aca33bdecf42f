//! Data models for geolocation lookups

use serde::{Deserialize, Serialize};

use crate::models::event::null_as_empty;

/// Location data returned by the lookup service for one IP
///
/// Only `country`, `region` and `city` are merged into stored events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoInfo {
    #[serde(deserialize_with = "null_as_empty")]
    pub ip: String,

    #[serde(deserialize_with = "null_as_empty")]
    pub city: String,

    /// Region/state/province
    #[serde(deserialize_with = "null_as_empty")]
    pub region: String,

    /// Country as reported by the service (ipinfo uses ISO alpha-2 codes)
    #[serde(deserialize_with = "null_as_empty")]
    pub country: String,

    /// IANA time zone name
    #[serde(deserialize_with = "null_as_empty")]
    pub timezone: String,

    /// Approximate coordinates as `"lat,lon"`
    #[serde(deserialize_with = "null_as_empty")]
    pub loc: String,
}
