use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::warn;

use super::{handlers, middleware::metrics_middleware, results};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let server = state.config().server.clone();

    // API routes
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/results", get(results::search_results))
        .with_state(state);

    let mut router = Router::new()
        .nest("/api", api_routes)
        .route("/metrics", get(handlers::metrics));

    // Serve the web UI with SPA fallback
    if let Some(dir) = &server.static_dir {
        let serve_dir = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
        router = router.fallback_service(serve_dir);
    }

    router
        .layer(middleware::from_fn(metrics_middleware))
        .layer(cors_layer(&server.cors_origins))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            content_security_policy(server.port),
        ))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
}

const DEFAULT_CSP: &str = "default-src 'self'";

/// CSP for the bundled web UI; the API itself returns JSON only.
fn content_security_policy(port: u16) -> HeaderValue {
    let policy = [
        "default-src 'self'".to_string(),
        "script-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net".to_string(),
        "style-src 'self' 'unsafe-inline' https://fonts.googleapis.com".to_string(),
        "font-src 'self' https://fonts.gstatic.com".to_string(),
        "img-src 'self' data: https:".to_string(),
        "media-src 'self' data:".to_string(),
        format!("connect-src 'self' http://localhost:{}", port),
    ]
    .join("; ");

    HeaderValue::from_str(&policy).unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CSP))
}
