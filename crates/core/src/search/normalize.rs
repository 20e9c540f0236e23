//! Mapping of raw provider hits into the canonical result schema.

use url::Url;

use crate::provider::ProviderHit;

use super::{CanonicalResult, Link};

/// Title used when a hit has none.
pub const NO_TITLE: &str = "No title";

/// Provider name used when a hit's page is not a URL with a host.
pub const UNKNOWN_PROVIDER: &str = "unknown";

/// Map a raw hit into a [`CanonicalResult`]. Pure and total.
pub fn normalize(hit: &ProviderHit) -> CanonicalResult {
    let title = match hit.title.as_deref() {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => NO_TITLE.to_string(),
    };

    let page = hit.page.clone().unwrap_or_default();

    CanonicalResult {
        title,
        provider: provider_host(&page),
        page,
        kind: hit.kind.clone(),
        links: hit
            .links
            .iter()
            .flatten()
            .map(|url| Link::classify(url.as_str()))
            .collect(),
    }
}

/// Hostname of `page`, or [`UNKNOWN_PROVIDER`].
fn provider_host(page: &str) -> String {
    Url::parse(page)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| UNKNOWN_PROVIDER.to_string())
}
