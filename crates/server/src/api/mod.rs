pub mod handlers;
pub mod middleware;
pub mod results;
pub mod routes;

pub use routes::create_router;

use serde::Serialize;

/// Error payload shared by every API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
