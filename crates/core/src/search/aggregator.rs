//! Concurrent fan-out of a query to every provider of a category.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tracing::{debug, warn};

use crate::metrics::{PROVIDER_DURATION, PROVIDER_REQUESTS, SEARCH_RESULTS};
use crate::provider::{Provider, ProviderError, ProviderHit, ProviderRegistry};

use super::normalize::normalize;
use super::{CanonicalResult, SearchError};

/// A provider that failed during an aggregated search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: String,
}

/// Outcome of fanning a query out to a category's providers.
#[derive(Debug, Clone, Default)]
pub struct AggregateOutcome {
    /// Hits in provider-registration order, each provider's own order kept.
    pub hits: Vec<ProviderHit>,
    /// Providers that failed, in registration order.
    pub provider_errors: Vec<ProviderFailure>,
    pub duration_ms: u64,
}

/// Fans queries out to registered providers and joins their outcomes.
#[derive(Debug, Clone)]
pub struct Aggregator {
    registry: Arc<ProviderRegistry>,
    provider_timeout: Duration,
}

impl Aggregator {
    pub fn new(registry: Arc<ProviderRegistry>, provider_timeout: Duration) -> Self {
        Self {
            registry,
            provider_timeout,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Search every provider registered for `category` concurrently.
    ///
    /// A failing, hanging or panicking provider contributes zero hits and is
    /// recorded in [`AggregateOutcome::provider_errors`]. Only a malformed
    /// registry fails the call as a whole.
    pub async fn search(&self, category: &str, text: &str) -> Result<AggregateOutcome, SearchError> {
        let start = Instant::now();
        let providers = self.registry.providers_for_tag(category);
        check_unique_names(category, providers)?;

        debug!(
            category = %category,
            providers = providers.len(),
            "Starting parallel provider search"
        );

        let searches = providers
            .iter()
            .map(|provider| self.search_provider(provider.as_ref(), text));
        let outcomes = futures::future::join_all(searches).await;

        let mut outcome = AggregateOutcome::default();
        for (provider, result) in providers.iter().zip(outcomes) {
            match result {
                Ok(mut hits) => outcome.hits.append(&mut hits),
                Err(e) => {
                    warn!(provider = %provider.name(), error = %e, "Provider search failed");
                    outcome.provider_errors.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        outcome.duration_ms = start.elapsed().as_millis() as u64;
        debug!(
            category = %category,
            hits = outcome.hits.len(),
            failed = outcome.provider_errors.len(),
            duration_ms = outcome.duration_ms,
            "Provider search complete"
        );

        Ok(outcome)
    }

    /// Aggregate and normalize in one step.
    pub async fn search_normalized(
        &self,
        category: &str,
        text: &str,
    ) -> Result<Vec<CanonicalResult>, SearchError> {
        let outcome = self.search(category, text).await?;
        let results: Vec<CanonicalResult> = outcome.hits.iter().map(normalize).collect();

        SEARCH_RESULTS
            .with_label_values(&[metric_category(category)])
            .observe(results.len() as f64);

        Ok(results)
    }

    /// Run one provider with a bounded wait, capturing panics as failures.
    async fn search_provider(
        &self,
        provider: &dyn Provider,
        text: &str,
    ) -> Result<Vec<ProviderHit>, ProviderError> {
        let start = Instant::now();
        let guarded = tokio::time::timeout(self.provider_timeout, provider.search(text));

        let (result, label) = match AssertUnwindSafe(guarded).catch_unwind().await {
            Ok(Ok(Ok(hits))) => (Ok(hits), "success"),
            Ok(Ok(Err(e))) => (Err(e), "error"),
            Ok(Err(_elapsed)) => (Err(ProviderError::Timeout), "timeout"),
            Err(_panic) => (
                Err(ProviderError::Internal("provider panicked".to_string())),
                "panic",
            ),
        };

        PROVIDER_REQUESTS
            .with_label_values(&[provider.name(), label])
            .inc();
        PROVIDER_DURATION
            .with_label_values(&[provider.name()])
            .observe(start.elapsed().as_secs_f64());

        result
    }
}

/// A category's providers must be distinguishable in logs and failures.
fn check_unique_names(category: &str, providers: &[Arc<dyn Provider>]) -> Result<(), SearchError> {
    let mut seen = HashSet::new();
    for provider in providers {
        if !seen.insert(provider.name()) {
            return Err(SearchError::Aggregation(format!(
                "provider '{}' registered twice for category '{}'",
                provider.name(),
                category
            )));
        }
    }
    Ok(())
}

/// Keep metric label cardinality bounded to known categories.
fn metric_category(category: &str) -> &str {
    match super::Category::parse(category) {
        Some(c) => c.as_str(),
        None => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{Category, LinkKind};
    use crate::testing::{fixtures, MockProvider};

    fn aggregator(registry: ProviderRegistry) -> Aggregator {
        Aggregator::new(Arc::new(registry), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_hits_concatenated_in_registration_order() {
        let a = MockProvider::with_hits(
            "a",
            vec![fixtures::hit("A1", "https://a.example/1"), fixtures::hit("A2", "https://a.example/2")],
        );
        let b = MockProvider::with_hits("b", vec![fixtures::hit("B1", "https://b.example/1")]);
        let registry = ProviderRegistry::new()
            .with_provider(Category::Games, Arc::new(a))
            .with_provider(Category::Games, Arc::new(b));

        let outcome = aggregator(registry).search("games", "zelda").await.unwrap();
        let titles: Vec<_> = outcome.hits.iter().map(|h| h.title.clone().unwrap()).collect();
        assert_eq!(titles, vec!["A1", "A2", "B1"]);
        assert!(outcome.provider_errors.is_empty());
    }

    #[tokio::test]
    async fn test_order_is_registration_order_not_completion_order() {
        let slow = MockProvider::with_hits("slow", vec![fixtures::hit("S", "https://s.example/")])
            .with_delay(Duration::from_millis(50));
        let fast = MockProvider::with_hits("fast", vec![fixtures::hit("F", "https://f.example/")]);
        let registry = ProviderRegistry::new()
            .with_provider(Category::Games, Arc::new(slow))
            .with_provider(Category::Games, Arc::new(fast));

        let outcome = aggregator(registry).search("games", "q").await.unwrap();
        let titles: Vec<_> = outcome.hits.iter().map(|h| h.title.clone().unwrap()).collect();
        assert_eq!(titles, vec!["S", "F"]);
    }

    #[tokio::test]
    async fn test_failing_provider_is_isolated() {
        let a = MockProvider::with_hits("a", vec![fixtures::hit("A1", "https://a.example/1")]);
        let b = MockProvider::failing("b", "scraper broke");
        let c = MockProvider::with_hits("c", vec![fixtures::hit("C1", "https://c.example/1")]);
        let registry = ProviderRegistry::new()
            .with_provider(Category::Games, Arc::new(a))
            .with_provider(Category::Games, Arc::new(b))
            .with_provider(Category::Games, Arc::new(c));

        let outcome = aggregator(registry).search("games", "q").await.unwrap();
        assert_eq!(outcome.hits.len(), 2);
        assert_eq!(outcome.provider_errors.len(), 1);
        assert_eq!(outcome.provider_errors[0].provider, "b");
        assert!(outcome.provider_errors[0].error.contains("scraper broke"));
    }

    #[tokio::test]
    async fn test_all_providers_failing_is_still_ok() {
        let registry = ProviderRegistry::new()
            .with_provider(Category::Games, Arc::new(MockProvider::failing("a", "down")))
            .with_provider(Category::Games, Arc::new(MockProvider::failing("b", "down")));

        let outcome = aggregator(registry).search("games", "q").await.unwrap();
        assert!(outcome.hits.is_empty());
        assert_eq!(outcome.provider_errors.len(), 2);
    }

    #[tokio::test]
    async fn test_hanging_provider_times_out() {
        let hanging = MockProvider::with_hits("hang", vec![fixtures::hit("H", "https://h.example/")])
            .with_delay(Duration::from_secs(60));
        let ok = MockProvider::with_hits("ok", vec![fixtures::hit("O", "https://o.example/")]);
        let registry = ProviderRegistry::new()
            .with_provider(Category::Games, Arc::new(hanging))
            .with_provider(Category::Games, Arc::new(ok));

        let aggregator = Aggregator::new(Arc::new(registry), Duration::from_millis(50));
        let outcome = aggregator.search("games", "q").await.unwrap();

        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].title.as_deref(), Some("O"));
        assert_eq!(outcome.provider_errors[0].provider, "hang");
        assert_eq!(outcome.provider_errors[0].error, "Request timeout");
    }

    #[tokio::test]
    async fn test_panicking_provider_is_isolated() {
        let registry = ProviderRegistry::new()
            .with_provider(Category::Games, Arc::new(MockProvider::panicking("boom")))
            .with_provider(
                Category::Games,
                Arc::new(MockProvider::with_hits("ok", vec![fixtures::hit("O", "https://o.example/")])),
            );

        let outcome = aggregator(registry).search("games", "q").await.unwrap();
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.provider_errors[0].provider, "boom");
    }

    #[tokio::test]
    async fn test_providers_run_concurrently() {
        let mut registry = ProviderRegistry::new();
        for name in ["a", "b", "c", "d"] {
            registry.register(
                Category::Games,
                Arc::new(MockProvider::new(name).with_delay(Duration::from_millis(200))),
            );
        }

        let start = Instant::now();
        aggregator(registry).search("games", "q").await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(700));
    }

    #[tokio::test]
    async fn test_unknown_category_yields_nothing() {
        let provider = Arc::new(MockProvider::with_hits("a", vec![fixtures::hit("A", "https://a.example/")]));
        let registry = ProviderRegistry::new().with_provider(Category::Games, provider.clone());

        let outcome = aggregator(registry).search("music", "q").await.unwrap();
        assert!(outcome.hits.is_empty());
        assert!(outcome.provider_errors.is_empty());
        assert_eq!(provider.search_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_provider_names_are_an_aggregation_error() {
        let registry = ProviderRegistry::new()
            .with_provider(Category::Games, Arc::new(MockProvider::new("a")))
            .with_provider(Category::Games, Arc::new(MockProvider::new("a")));

        let err = aggregator(registry).search("games", "q").await.unwrap_err();
        assert!(matches!(err, SearchError::Aggregation(_)));
    }

    #[tokio::test]
    async fn test_each_provider_receives_the_query() {
        let a = Arc::new(MockProvider::new("a"));
        let b = Arc::new(MockProvider::new("b"));
        let registry = ProviderRegistry::new()
            .with_provider(Category::Movies, a.clone())
            .with_provider(Category::Movies, b.clone());

        aggregator(registry).search("movies", "alien").await.unwrap();
        assert_eq!(a.recorded_queries(), vec!["alien"]);
        assert_eq!(b.recorded_queries(), vec!["alien"]);
    }

    #[tokio::test]
    async fn test_search_normalized_end_to_end() {
        let a = MockProvider::with_hits(
            "a",
            vec![fixtures::hit_with_links(
                "Zelda",
                "https://a.example/p",
                &["magnet:?xt=1"],
            )],
        );
        let registry = ProviderRegistry::new()
            .with_provider(Category::Games, Arc::new(a))
            .with_provider(Category::Games, Arc::new(MockProvider::failing("b", "down")));

        let results = aggregator(registry)
            .search_normalized("games", "zelda")
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Zelda");
        assert_eq!(results[0].provider, "a.example");
        assert_eq!(results[0].page, "https://a.example/p");
        assert_eq!(results[0].kind, "game");
        assert_eq!(results[0].links[0].url(), "magnet:?xt=1");
        assert_eq!(results[0].links[0].kind(), LinkKind::Magnet);
    }
}
