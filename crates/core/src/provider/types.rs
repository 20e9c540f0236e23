//! Types for search providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw, provider-shaped search hit.
///
/// Only the fields the normalizer reads are modelled; anything else a
/// provider sends is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderHit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// URL of the hit's page on the provider's site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    /// Category/subtype tag as reported by the provider.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Raw link strings (magnet URIs, .torrent URLs, redirect pages).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
}

/// Errors a single provider can fail with.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Provider API error: {0}")]
    ApiError(String),

    #[error("Failed to parse provider response: {0}")]
    Parse(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A source capable of searching one category.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Search the provider for `query`, returning hits in the provider's order.
    async fn search(&self, query: &str) -> Result<Vec<ProviderHit>, ProviderError>;
}
