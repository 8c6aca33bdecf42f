use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub geo: GeoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON Lines event log, relative to the working directory
    pub log_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    pub enabled: bool,
    /// Base URL of the lookup service; requests go to `<base_url>/<ip>/json`
    pub base_url: String,
    /// Access token appended as `?token=`; unauthenticated when None
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "GeoConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl StorageConfig {
    /// Only `LOG_FILE`; does not touch the server or geo settings.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            log_path: env_var("LOG_FILE").unwrap_or_else(|| "logs.json".to_string()),
        }
    }
}

impl GeoConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://ipinfo.io";

    pub const fn default_timeout_secs() -> u64 {
        5
    }
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

/// Read an environment variable, treating an empty value as unset.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.to_lowercase().as_str(), "false" | "0" | "no" | "off")
}

fn parse_timeout(value: Option<String>) -> u64 {
    match value {
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                tracing::warn!(
                    "Invalid GEO_TIMEOUT_SECS '{raw}', falling back to {}s",
                    GeoConfig::default_timeout_secs()
                );
                GeoConfig::default_timeout_secs()
            }
        },
        None => GeoConfig::default_timeout_secs(),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = env_var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port_str = env_var("PORT").unwrap_or_else(|| "3002".to_string());
        let port = port_str
            .parse::<u16>()
            .with_context(|| format!("PORT must be a valid port number, got '{port_str}'"))?;

        let geo = GeoConfig {
            enabled: env_var("GEO_ENABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            base_url: env_var("GEO_LOOKUP_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| GeoConfig::DEFAULT_BASE_URL.to_string()),
            token: env_var("IPINFO_TOKEN"),
            timeout_secs: parse_timeout(env_var("GEO_TIMEOUT_SECS")),
        };

        Ok(Config {
            server: ServerConfig { host, port },
            storage: StorageConfig::from_env(),
            geo,
        })
    }
}
