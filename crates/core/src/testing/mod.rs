//! Testing utilities and mock implementations.
//!
//! Lets the aggregator and the HTTP endpoint be exercised without real
//! provider sites.
//!
//! # Example
//!
//! ```rust,ignore
//! use tordemand_core::testing::{fixtures, MockProvider};
//!
//! let provider = MockProvider::with_hits("a", vec![fixtures::hit("Zelda", "https://a.example/p")]);
//! let registry = ProviderRegistry::new().with_provider(Category::Games, Arc::new(provider));
//! ```

mod mock_provider;

pub use mock_provider::MockProvider;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::provider::ProviderHit;

    /// A game hit with a title and page but no links.
    pub fn hit(title: &str, page: &str) -> ProviderHit {
        ProviderHit {
            title: Some(title.to_string()),
            page: Some(page.to_string()),
            kind: "game".to_string(),
            links: None,
        }
    }

    /// A game hit carrying raw link strings.
    pub fn hit_with_links(title: &str, page: &str, links: &[&str]) -> ProviderHit {
        ProviderHit {
            links: Some(links.iter().map(|l| l.to_string()).collect()),
            ..hit(title, page)
        }
    }
}
