//! IP geolocation through an ipinfo-compatible HTTP API
//!
//! Lookups are best-effort: every failure comes back as a
//! [`GeoLookupError`] and the caller decides whether to carry on without
//! location data.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

use crate::analytics::models::GeoInfo;
use crate::config::GeoConfig;

#[derive(Debug, Error)]
pub enum GeoLookupError {
    #[error("geolocation lookup timed out")]
    Timeout,
    #[error("geolocation service returned status {0}")]
    Status(StatusCode),
    #[error("malformed geolocation response: {0}")]
    Decode(String),
    #[error("geolocation request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for GeoLookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeoLookupError::Timeout
        } else if err.is_decode() {
            GeoLookupError::Decode(err.to_string())
        } else {
            GeoLookupError::Transport(err.to_string())
        }
    }
}

#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// Look up the location of `ip`
    async fn locate(&self, ip: &str) -> Result<GeoInfo, GeoLookupError>;
}

/// Geolocation client for ipinfo.io (or any service with the same API)
#[derive(Clone)]
pub struct IpInfoLocator {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl IpInfoLocator {
    pub fn from_config(config: &GeoConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("clicklog/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client for geolocation")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Lookup URL for `ip`: `<base>/<ip>/json[?token=<token>]`
    pub fn lookup_url(&self, ip: &str) -> String {
        match &self.token {
            Some(token) => format!("{}/{}/json?token={}", self.base_url, ip, token),
            None => format!("{}/{}/json", self.base_url, ip),
        }
    }
}

#[async_trait]
impl GeoLocator for IpInfoLocator {
    async fn locate(&self, ip: &str) -> Result<GeoInfo, GeoLookupError> {
        let response = self.client.get(self.lookup_url(ip)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoLookupError::Status(status));
        }

        let body = response.bytes().await?;
        serde_json::from_slice::<GeoInfo>(&body).map_err(|e| GeoLookupError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator(token: Option<&str>) -> IpInfoLocator {
        let config = GeoConfig {
            base_url: "https://ipinfo.io/".to_string(),
            token: token.map(str::to_string),
            ..Default::default()
        };
        IpInfoLocator::from_config(&config).unwrap()
    }

    #[test]
    fn test_lookup_url_without_token() {
        assert_eq!(
            locator(None).lookup_url("8.8.8.8"),
            "https://ipinfo.io/8.8.8.8/json"
        );
    }

    #[test]
    fn test_lookup_url_with_token() {
        assert_eq!(
            locator(Some("secret")).lookup_url("8.8.8.8"),
            "https://ipinfo.io/8.8.8.8/json?token=secret"
        );
    }

    #[test]
    fn test_empty_token_is_ignored() {
        assert_eq!(
            locator(Some("")).lookup_url("1.1.1.1"),
            "https://ipinfo.io/1.1.1.1/json"
        );
    }
}
