use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chroma_core::ChromaError;
use serde::Serialize;
use thiserror::Error;

/// API Error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Chroma(#[from] ChromaError),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Error response structure
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

fn chroma_status(err: &ChromaError) -> StatusCode {
    match err {
        ChromaError::UnsupportedInputFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ChromaError::EmptyInput
        | ChromaError::MalformedColorSequence { .. }
        | ChromaError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        ChromaError::Audio(_) | ChromaError::Document(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ChromaError::Image(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Chroma(e) => chroma_status(e),
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = self.to_string();
        if status.is_server_error() {
            tracing::error!("{}", error_message);
        } else {
            tracing::warn!("Rejected request ({}): {}", status.as_u16(), error_message);
        }

        let body = Json(ErrorResponse {
            error: error_message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ChromaError::UnsupportedInputFormat("x".into()), 415),
            (ChromaError::EmptyInput, 400),
            (
                ChromaError::MalformedColorSequence {
                    index: 0,
                    reason: "short".into(),
                },
                400,
            ),
            (ChromaError::InvalidParameter("w".into()), 400),
            (ChromaError::Document("broken".into()), 422),
        ];
        for (err, code) in cases {
            assert_eq!(ApiError::from(err).status().as_u16(), code);
        }
        assert_eq!(ApiError::InvalidInput("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
    }
}
