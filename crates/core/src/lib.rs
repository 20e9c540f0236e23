pub mod config;
pub mod metrics;
pub mod provider;
pub mod search;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, ProviderConfig, SanitizedConfig, SearchSettings, ServerConfig,
};
pub use provider::{HttpProvider, Provider, ProviderError, ProviderHit, ProviderRegistry};
pub use search::{
    normalize, AggregateOutcome, Aggregator, CanonicalResult, Category, Link, LinkKind,
    ProviderFailure, SearchError, SearchQuery,
};
