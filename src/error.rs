use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No valid clients after normalization ({0} records received)")]
    NoValidClients(usize),

    #[error("Route optimizer error: {0}")]
    RouteOptimizer(String),

    #[error("Path renderer error: {0}")]
    PathRenderer(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

// Convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidRequest(ref e) => (StatusCode::BAD_REQUEST, e.clone()),
            AppError::NoValidClients(_) => {
                tracing::info!("{}", self);
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::RouteOptimizer(ref e) => {
                tracing::error!("Route optimizer error: {}", e);
                (StatusCode::BAD_GATEWAY, "Routing service error".to_string())
            }
            AppError::PathRenderer(ref e) => {
                tracing::error!("Path renderer error: {}", e);
                (StatusCode::BAD_GATEWAY, "Routing service error".to_string())
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Unknown error"),
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
