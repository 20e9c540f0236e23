//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock providers injected, enabling E2E testing of the results
//! endpoint without real provider sites.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use tordemand_core::{Category, Config, Provider, ProviderRegistry};

/// Re-export mocks and fixtures for test convenience
pub use tordemand_core::testing::{fixtures, MockProvider};

/// Test fixture for E2E testing with mock providers.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_search() {
///     let fixture = TestFixture::builder()
///         .provider(Category::Games, MockProvider::with_hits("a", vec![/* hits */]))
///         .build();
///
///     let response = fixture.get("/api/results?q=zelda&type=games").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Registered mock providers, in registration order
    pub providers: Vec<Arc<MockProvider>>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub headers: axum::http::HeaderMap,
}

impl TestFixture {
    /// Create a fixture with no providers registered.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> TestFixtureBuilder {
        TestFixtureBuilder::default()
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into_owned()))
        };

        TestResponse {
            status,
            body,
            headers,
        }
    }
}

/// Builder registering mock providers before the router is created.
#[derive(Default)]
pub struct TestFixtureBuilder {
    config: Config,
    registrations: Vec<(Category, Arc<MockProvider>)>,
}

impl TestFixtureBuilder {
    /// Register a mock provider for a category.
    pub fn provider(mut self, category: Category, provider: MockProvider) -> Self {
        self.registrations.push((category, Arc::new(provider)));
        self
    }

    /// Override the configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> TestFixture {
        let mut registry = ProviderRegistry::new();
        for (category, provider) in &self.registrations {
            registry.register(*category, Arc::clone(provider) as Arc<dyn Provider>);
        }

        let state = Arc::new(tordemand_server::state::AppState::new(
            self.config,
            Arc::new(registry),
        ));

        TestFixture {
            router: tordemand_server::api::create_router(state),
            providers: self.registrations.into_iter().map(|(_, p)| p).collect(),
        }
    }
}
