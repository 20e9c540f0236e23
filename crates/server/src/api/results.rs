//! Search results endpoint.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tordemand_core::{CanonicalResult, Category, SearchError, SearchQuery};
use tracing::{debug, error, warn};

use super::ErrorResponse;
use crate::state::AppState;

/// Generic message for failures whose detail stays in the logs.
const SEARCH_ERROR: &str = "Search error";

#[derive(Debug, Deserialize)]
pub struct ResultsParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, rename = "type")]
    pub category: Option<String>,
}

/// GET /api/results?q=...&type=...
///
/// Aggregate and normalize results from every provider registered for the
/// category. An unknown category is "no results", not a bad request.
/// A query string that cannot be parsed counts as a missing query.
pub async fn search_results(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ResultsParams>, QueryRejection>,
) -> Result<Json<Vec<CanonicalResult>>, impl IntoResponse> {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected results query string");
            return Err(missing_query());
        }
    };
    let text = params.q.unwrap_or_default();
    let tag = params.category.unwrap_or_default();

    let Some(category) = Category::parse(&tag) else {
        if text.is_empty() {
            return Err(missing_query());
        }
        debug!(category = %tag, "Unknown category, returning no results");
        return Ok(Json(Vec::new()));
    };

    let query = match SearchQuery::new(text, category) {
        Ok(query) => query,
        Err(_) => return Err(missing_query()),
    };

    match state
        .aggregator()
        .search_normalized(query.category().as_str(), query.text())
        .await
    {
        Ok(results) => Ok(Json(results)),
        Err(e) => {
            error!(category = %category, error = %e, "Error searching");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(SEARCH_ERROR)),
            ))
        }
    }
}

fn missing_query() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(SearchError::MissingQuery.to_string())),
    )
}
