//! Search aggregation and normalization.
//!
//! The [`Aggregator`] fans a query out to every provider registered for a
//! category and joins their outcomes, isolating per-provider failures.
//! [`normalize`] reshapes each raw hit into a [`CanonicalResult`].

mod aggregator;
mod normalize;
mod types;

pub use aggregator::{AggregateOutcome, Aggregator, ProviderFailure};
pub use normalize::{normalize, NO_TITLE, UNKNOWN_PROVIDER};
pub use types::*;
