//! Transport to the search endpoint.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tordemand_core::{CanonicalResult, SearchQuery};
use tracing::debug;
use url::Url;

/// Path of the results endpoint, relative to the server root.
pub const RESULTS_PATH: &str = "/api/results";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Server responded with HTTP {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

/// Something that can run a search against the aggregator.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CanonicalResult>, TransportError>;
}

/// [`SearchBackend`] talking to a TorDemand server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSearchBackend {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpSearchBackend {
    /// Create a backend for the server rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let endpoint = Url::parse(base_url)
            .and_then(|base| base.join(RESULTS_PATH))
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    /// Create a backend for a server on this machine.
    pub fn localhost(port: u16) -> Result<Self, TransportError> {
        Self::new(&format!("http://localhost:{}", port))
    }

    /// Bound every request, on top of the controller's own timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, TransportError> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        Ok(self)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CanonicalResult>, TransportError> {
        debug!(
            endpoint = %self.endpoint,
            category = %query.category(),
            query = %query.text(),
            "Requesting results"
        );

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("type", query.category().as_str()), ("q", query.text())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        response
            .json::<Vec<CanonicalResult>>()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }
}
