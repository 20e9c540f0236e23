use std::sync::Arc;
use std::time::Duration;

use tordemand_core::{Aggregator, Config, ProviderRegistry, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    aggregator: Aggregator,
}

impl AppState {
    pub fn new(config: Config, registry: Arc<ProviderRegistry>) -> Self {
        let timeout = Duration::from_secs(config.search.provider_timeout_secs as u64);
        Self {
            aggregator: Aggregator::new(registry, timeout),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }
}
