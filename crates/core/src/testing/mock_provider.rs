//! Mock provider for testing.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use crate::provider::{Provider, ProviderError, ProviderHit};

/// Mock implementation of the [`Provider`] trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable hits
/// - Record queries for assertions
/// - Simulate failures, delays and panics
pub struct MockProvider {
    name: String,
    hits: Mutex<Vec<ProviderHit>>,
    /// If set, every search fails with this message.
    failure: Mutex<Option<String>>,
    panics: bool,
    delay: Option<Duration>,
    queries: Mutex<Vec<String>>,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("name", &self.name)
            .field("panics", &self.panics)
            .field("delay", &self.delay)
            .finish()
    }
}

impl MockProvider {
    /// Create a mock provider that returns no hits.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            hits: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            panics: false,
            delay: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock provider with predefined hits.
    pub fn with_hits(name: &str, hits: Vec<ProviderHit>) -> Self {
        let provider = Self::new(name);
        provider.set_hits(hits);
        provider
    }

    /// Create a mock provider whose searches always fail.
    pub fn failing(name: &str, message: &str) -> Self {
        let provider = Self::new(name);
        provider.set_failure(message);
        provider
    }

    /// Create a mock provider whose searches panic.
    pub fn panicking(name: &str) -> Self {
        Self {
            panics: true,
            ..Self::new(name)
        }
    }

    /// Delay every search by `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set the hits to return for subsequent searches.
    pub fn set_hits(&self, hits: Vec<ProviderHit>) {
        *self.hits.lock().unwrap() = hits;
    }

    /// Make subsequent searches fail with `message`.
    pub fn set_failure(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    /// Clear any configured failure.
    pub fn clear_failure(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Queries received so far, oldest first.
    pub fn recorded_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    /// Number of searches performed.
    pub fn search_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str) -> Result<Vec<ProviderHit>, ProviderError> {
        self.queries.lock().unwrap().push(query.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.panics {
            panic!("mock provider '{}' panicked", self.name);
        }

        let failure = self.failure.lock().unwrap().clone();
        if let Some(message) = failure {
            return Err(ProviderError::ApiError(message));
        }

        Ok(self.hits.lock().unwrap().clone())
    }
}
