use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::search::Category;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory with the built web UI, served as a fallback when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
    /// Origins allowed to call the API from a browser.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    6969
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

/// Aggregation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchSettings {
    /// Upper bound on a single provider search, in seconds.
    #[serde(default = "default_timeout")]
    pub provider_timeout_secs: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            provider_timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u32 {
    20
}

/// A JSON feed provider registered for one category
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Provider name, used in logs and metrics.
    pub name: String,
    pub category: Category,
    /// Search URL with a `{query}` placeholder (e.g., "https://feed.example/search?q={query}")
    pub url_template: String,
    /// Per-provider timeout override in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u32>,
}

/// Sanitized config for API responses (provider URLs reduced to their host)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: SanitizedServerConfig,
    pub search: SearchSettings,
    pub providers: Vec<SanitizedProviderConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedServerConfig {
    pub port: u16,
    pub serves_ui: bool,
}

/// Sanitized provider entry (template may embed API keys)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProviderConfig {
    pub name: String,
    pub category: Category,
    pub host: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: SanitizedServerConfig {
                port: config.server.port,
                serves_ui: config.server.static_dir.is_some(),
            },
            search: config.search.clone(),
            providers: config
                .providers
                .iter()
                .map(|p| SanitizedProviderConfig {
                    name: p.name.clone(),
                    category: p.category,
                    host: url::Url::parse(&p.url_template)
                        .ok()
                        .and_then(|u| u.host_str().map(str::to_string))
                        .unwrap_or_else(|| "unknown".to_string()),
                })
                .collect(),
        }
    }
}
