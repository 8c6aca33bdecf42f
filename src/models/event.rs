use serde::{Deserialize, Deserializer, Serialize};

use crate::analytics::GeoInfo;

/// Marker for "no real value available"; treated like an empty field.
pub const UNKNOWN: &str = "unknown";

/// One client-reported telemetry entry, stored as a single JSON line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventRecord {
    #[serde(deserialize_with = "null_as_empty")]
    pub link_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub timestamp: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_empty")]
    pub ip_address: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_empty")]
    pub country: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_empty")]
    pub country_code: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_empty")]
    pub region: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_empty")]
    pub city: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_empty")]
    pub user_agent: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_empty")]
    pub referrer: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_empty")]
    pub screen_resolution: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_empty")]
    pub language: String,
}

/// JSON `null` reads as an empty string, like an absent field.
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_blank(value: &str) -> bool {
    value.is_empty() || value == UNKNOWN
}

fn fill_if_blank(field: &mut String, value: &str) {
    if is_blank(field) {
        *field = value.to_string();
    }
}

impl EventRecord {
    /// Decode a submitted event body.
    ///
    /// Only the first JSON value is read; anything after it is ignored. A
    /// literal `null` yields an empty record and a repeated key keeps its
    /// last value. An empty body is an error.
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value = serde_json::Deserializer::from_slice(body)
            .into_iter::<serde_json::Value>()
            .next()
            .ok_or_else(|| <serde_json::Error as serde::de::Error>::custom("empty request body"))??;

        Ok(serde_json::from_value::<Option<Self>>(value)?.unwrap_or_default())
    }

    /// True when the record carries an address worth geolocating
    pub fn has_known_ip(&self) -> bool {
        !is_blank(&self.ip_address)
    }

    /// Merge lookup results into fields that are empty or "unknown".
    ///
    /// Values supplied by the client are never replaced. `country_code` is
    /// filled from the lookup's `country`, which ipinfo reports as an
    /// ISO 3166-1 alpha-2 code.
    pub fn merge_geo(&mut self, geo: &GeoInfo) {
        fill_if_blank(&mut self.country, &geo.country);
        fill_if_blank(&mut self.country_code, &geo.country);
        fill_if_blank(&mut self.region, &geo.region);
        fill_if_blank(&mut self.city, &geo.city);
    }
}
