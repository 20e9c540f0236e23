//! Explicit category -> provider registration.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::ProviderConfig;
use crate::search::Category;

use super::{HttpProvider, Provider, ProviderError};

/// Static mapping from category to the providers that search it.
///
/// Providers are kept in registration order; that order is the order their
/// hits appear in an aggregated result.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<Category, Vec<Arc<dyn Provider>>>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: HashMap<_, Vec<_>> = self
            .providers
            .iter()
            .map(|(category, providers)| (category, providers.iter().map(|p| p.name()).collect()))
            .collect();
        f.debug_struct("ProviderRegistry")
            .field("providers", &names)
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry of HTTP providers from configuration entries.
    pub fn from_config(
        entries: &[ProviderConfig],
        default_timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let mut registry = Self::new();
        for entry in entries {
            let timeout = entry
                .timeout_secs
                .map(|secs| Duration::from_secs(secs as u64))
                .unwrap_or(default_timeout);
            let provider = HttpProvider::new(&entry.name, &entry.url_template, timeout)?;
            info!(provider = %entry.name, category = %entry.category, "Registered provider");
            registry.register(entry.category, Arc::new(provider));
        }
        Ok(registry)
    }

    /// Register a provider for a category, after any already registered.
    pub fn register(&mut self, category: Category, provider: Arc<dyn Provider>) {
        self.providers.entry(category).or_default().push(provider);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_provider(mut self, category: Category, provider: Arc<dyn Provider>) -> Self {
        self.register(category, provider);
        self
    }

    /// Providers for a category, in registration order.
    pub fn providers_for(&self, category: Category) -> &[Arc<dyn Provider>] {
        self.providers
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Providers for a wire category tag. Unknown tags have no providers.
    pub fn providers_for_tag(&self, tag: &str) -> &[Arc<dyn Provider>] {
        match Category::parse(tag) {
            Some(category) => self.providers_for(category),
            None => &[],
        }
    }

    /// Categories with at least one provider.
    pub fn categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| !self.providers_for(*c).is_empty())
            .collect()
    }

    /// Total number of registered providers across categories.
    pub fn provider_count(&self) -> usize {
        self.providers.values().map(Vec::len).sum()
    }
}
