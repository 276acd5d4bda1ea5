use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::cms::CmsError;

/// Error type for HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The content API failed or returned something unusable
    #[error(transparent)]
    Cms(#[from] CmsError),

    /// A template failed to render
    #[error("Render error: {0}")]
    Render(#[from] anyhow::Error),

    /// Reading a static file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Cms(err) => {
                tracing::error!(error = %err, "Content API error");
                (
                    StatusCode::BAD_GATEWAY,
                    "The content service is unavailable".to_string(),
                )
            }
            AppError::Render(err) => {
                tracing::error!(error = %err, "Render error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Io(err) => {
                tracing::error!(error = %err, "IO error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        (status, message).into_response()
    }
}
