//! HTTP surface of the search aggregator.
//!
//! Exposes `GET /api/results` over the core aggregation pipeline, plus
//! health, sanitized config and Prometheus metrics endpoints.

pub mod api;
pub mod metrics;
pub mod state;
