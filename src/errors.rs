use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data (missing file, missing password, bad multipart)
    #[error("{message}")]
    BadRequest { message: String },

    /// Upload exceeded the configured size ceiling
    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// Failed to persist the upload to the data directory
    #[error("failed to stage uploaded file: {source}")]
    Staging {
        #[source]
        source: std::io::Error,
    },

    /// The external encryption tool failed, timed out, or could not be spawned
    #[error("encryption failed: {detail}")]
    Encryption { detail: String },

    /// Generic internal service error
    #[error("failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Staging { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Encryption { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::PayloadTooLarge { message } => message.clone(),
            Error::Staging { .. } => "Failed to store uploaded file".to_string(),
            // qpdf diagnostics are the only clue the caller gets about a bad input
            // document, so they are passed through.
            Error::Encryption { detail } => format!("Encryption failed: {detail}"),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Staging { .. } | Error::Encryption { .. } | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::BadRequest { .. } | Error::PayloadTooLarge { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = json!({ "error": self.user_message() });

        (status, Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
