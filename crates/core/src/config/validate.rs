use std::collections::HashSet;

use crate::provider::QUERY_PLACEHOLDER;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Provider timeouts are not 0
/// - Provider names are non-empty and unique within a category
/// - Provider URL templates carry the query placeholder and parse as URLs
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.search.provider_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "search.provider_timeout_secs cannot be 0".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for provider in &config.providers {
        if provider.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "providers.name cannot be empty".to_string(),
            ));
        }

        if !seen.insert((provider.category, provider.name.as_str())) {
            return Err(ConfigError::ValidationError(format!(
                "provider '{}' is registered twice for category '{}'",
                provider.name, provider.category
            )));
        }

        if provider.timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError(format!(
                "provider '{}': timeout_secs cannot be 0",
                provider.name
            )));
        }

        if !provider.url_template.contains(QUERY_PLACEHOLDER) {
            return Err(ConfigError::ValidationError(format!(
                "provider '{}': url_template must contain {}",
                provider.name, QUERY_PLACEHOLDER
            )));
        }

        let sample = provider.url_template.replace(QUERY_PLACEHOLDER, "test");
        if let Err(e) = url::Url::parse(&sample) {
            return Err(ConfigError::ValidationError(format!(
                "provider '{}': invalid url_template: {}",
                provider.name, e
            )));
        }
    }

    Ok(())
}
