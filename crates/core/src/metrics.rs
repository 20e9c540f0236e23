//! Prometheus metrics for the search pipeline.
//!
//! Registered into the server's registry via [`all_metrics`].

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Providers
// =============================================================================

/// Provider searches total by provider and result.
pub static PROVIDER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tordemand_provider_requests_total",
            "Total provider searches",
        ),
        &["provider", "result"], // "success", "error", "timeout", "panic"
    )
    .unwrap()
});

/// Provider search duration in seconds.
pub static PROVIDER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tordemand_provider_duration_seconds",
            "Duration of a single provider search",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["provider"],
    )
    .unwrap()
});

// =============================================================================
// Aggregation
// =============================================================================

/// Normalized results returned per aggregated search.
pub static SEARCH_RESULTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tordemand_search_results",
            "Number of results returned per aggregated search",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
        &["category"],
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(PROVIDER_REQUESTS.clone()),
        Box::new(PROVIDER_DURATION.clone()),
        Box::new(SEARCH_RESULTS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register_cleanly() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        PROVIDER_REQUESTS
            .with_label_values(&["metrics-test", "success"])
            .inc();
        let names: Vec<_> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"tordemand_provider_requests_total".to_string()));
    }
}
