//! Generic JSON feed provider.
//!
//! Queries a configured URL template and expects either a JSON array of
//! hits or an object wrapping them in a `results` array.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{Provider, ProviderError, ProviderHit};

/// Placeholder replaced by the url-encoded query text.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Provider backed by an HTTP endpoint returning JSON hits.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    name: String,
    url_template: String,
    client: Client,
}

impl HttpProvider {
    /// Create a provider that queries `url_template` with the given timeout.
    pub fn new(
        name: impl Into<String>,
        url_template: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            name: name.into(),
            url_template: url_template.into(),
            client,
        })
    }

    /// Build the request URL for a query.
    fn build_search_url(&self, query: &str) -> String {
        self.url_template
            .replace(QUERY_PLACEHOLDER, &urlencoding::encode(query))
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str) -> Result<Vec<ProviderHit>, ProviderError> {
        let url = self.build_search_url(query);
        debug!(provider = %self.name, "Querying provider");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else if e.is_connect() {
                ProviderError::ConnectionFailed(e.to_string())
            } else {
                ProviderError::ApiError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body: FeedResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::Parse(e.to_string())
            }
        })?;

        let hits = body.into_hits();
        debug!(provider = %self.name, hits = hits.len(), "Provider search complete");
        Ok(hits)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedResponse {
    Hits(Vec<ProviderHit>),
    Wrapped { results: Vec<ProviderHit> },
}

impl FeedResponse {
    fn into_hits(self) -> Vec<ProviderHit> {
        match self {
            FeedResponse::Hits(hits) => hits,
            FeedResponse::Wrapped { results } => results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn echo_hits(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        let q = params.get("q").cloned().unwrap_or_default();
        Json(json!([
            { "title": q, "page": "https://a.example/p", "type": "game", "links": ["magnet:?xt=1"] },
            { "type": "game" }
        ]))
    }

    #[test]
    fn test_build_search_url_encodes_query() {
        let provider = HttpProvider::new(
            "feed",
            "https://a.example/search?q={query}&page=1",
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(
            provider.build_search_url("zelda breath & wild"),
            "https://a.example/search?q=zelda%20breath%20%26%20wild&page=1"
        );
    }

    #[tokio::test]
    async fn test_search_parses_hit_array() {
        let base = serve(Router::new().route("/search", get(echo_hits))).await;
        let provider = HttpProvider::new(
            "feed",
            format!("{}/search?q={{query}}", base),
            Duration::from_secs(5),
        )
        .unwrap();

        let hits = provider.search("zelda tears").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title.as_deref(), Some("zelda tears"));
        assert_eq!(hits[0].links, Some(vec!["magnet:?xt=1".to_string()]));
        assert!(hits[1].title.is_none());
    }

    #[tokio::test]
    async fn test_search_parses_wrapped_results() {
        let router = Router::new().route(
            "/search",
            get(|| async { Json(json!({ "results": [{ "title": "Doom", "type": "game" }] })) }),
        );
        let base = serve(router).await;
        let provider = HttpProvider::new(
            "feed",
            format!("{}/search?q={{query}}", base),
            Duration::from_secs(5),
        )
        .unwrap();

        let hits = provider.search("doom").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title.as_deref(), Some("Doom"));
    }

    #[tokio::test]
    async fn test_search_non_success_status_is_api_error() {
        let router = Router::new().route(
            "/search",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base = serve(router).await;
        let provider = HttpProvider::new(
            "feed",
            format!("{}/search?q={{query}}", base),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = provider.search("doom").await.unwrap_err();
        match err {
            ProviderError::ApiError(msg) => {
                assert!(msg.contains("502"));
                assert!(msg.contains("upstream down"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_search_malformed_body_is_parse_error() {
        let router = Router::new().route("/search", get(|| async { "<html>nope</html>" }));
        let base = serve(router).await;
        let provider = HttpProvider::new(
            "feed",
            format!("{}/search?q={{query}}", base),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = provider.search("doom").await.unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
    }

    #[tokio::test]
    async fn test_search_connection_refused() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let provider = HttpProvider::new(
            "feed",
            format!("http://127.0.0.1:{}/search?q={{query}}", port),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = provider.search("doom").await.unwrap_err();
        assert!(matches!(err, ProviderError::ConnectionFailed(_)));
    }
}
