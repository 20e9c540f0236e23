//! Search provider abstraction.
//!
//! A provider searches one category and returns raw, provider-shaped hits.
//! Providers are registered explicitly per category in a [`ProviderRegistry`].

mod http;
mod registry;
mod types;

pub use http::{HttpProvider, QUERY_PLACEHOLDER};
pub use registry::ProviderRegistry;
pub use types::*;
