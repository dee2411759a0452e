use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::error;
use wagerdesk_agents::{AgentRegistry, RegistryError};

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The agent registry all chat routes resolve against.
    pub registry: Arc<AgentRegistry>,
}

/// Body of every 400 response for an unusable request.
pub const BAD_REQUEST_BODY: &str = "Messages array is required";
/// Body of every 500 response; internals stay in the logs.
pub const INTERNAL_ERROR_BODY: &str = "Failed to generate response";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("agent not found: {0}")]
    AgentNotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Plain-text bodies with fixed wording; clients match on them.
        let (code, body) = match &self {
            ApiError::AgentNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, BAD_REQUEST_BODY.to_string()),
            ApiError::Internal(detail) => {
                error!(%detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_BODY.to_string(),
                )
            }
        };
        (code, body).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::AgentNotFound(id) => ApiError::AgentNotFound(id),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
