//! Error types for the server crate.

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use protolane_core::ErrorKind;
use serde::Serialize;

/// Errors that can occur during request handling.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServerError {
    /// An error propagated from the core components.
    #[error(transparent)]
    Core(#[from] protolane_core::Error),

    /// The upload is not an acceptable archive.
    #[error("{0}")]
    InvalidUpload(String),

    /// The request carried no file part.
    #[error("no file received")]
    EmptyUpload,

    /// The uploaded file is larger than the configured limit.
    #[error("upload exceeds {max} bytes")]
    UploadTooLarge {
        /// Configured limit.
        max: usize,
    },

    /// `/send` was called without a destination.
    #[error("missing url query parameter")]
    MissingUrl,

    /// `/send` body is absent or not a binary payload.
    #[error("{0}")]
    InvalidPayload(String),

    /// `/send` header overrides are not a JSON object of scalars.
    #[error("{0}")]
    InvalidHeaders(String),

    /// Blocking worker panicked or was cancelled.
    #[error("worker failed: {0}")]
    Worker(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl ServerError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Core(err) => core_status(err.kind()),
            Self::InvalidUpload(_)
            | Self::EmptyUpload
            | Self::MissingUrl
            | Self::InvalidPayload(_)
            | Self::InvalidHeaders(_) => StatusCode::BAD_REQUEST,
            Self::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code for the response body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Core(err) => err.kind().code(),
            Self::InvalidUpload(_) => "INVALID_ZIP_FILE",
            Self::EmptyUpload => "EMPTY_ZIP_FILE",
            Self::UploadTooLarge { .. } => "UPLOAD_TOO_LARGE",
            Self::MissingUrl => "SEND_INVALID_URL",
            Self::InvalidPayload(_) => "SEND_INVALID_PAYLOAD",
            Self::InvalidHeaders(_) => "SEND_INVALID_HEADER",
            Self::Worker(_) => "INTERNAL_ERROR",
        }
    }
}

const fn core_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidArchive
        | ErrorKind::TooManyEntries
        | ErrorKind::PathTraversal
        | ErrorKind::SizeLimitExceeded
        | ErrorKind::DuplicateEntry
        | ErrorKind::NoSchemaFiles
        | ErrorKind::InvalidOutputName
        | ErrorKind::InvalidUrl
        | ErrorKind::InvalidHeader => StatusCode::BAD_REQUEST,
        ErrorKind::ForbiddenHost => StatusCode::FORBIDDEN,
        ErrorKind::CompilerFailure => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::TransportError => StatusCode::BAD_GATEWAY,
        ErrorKind::Io | ErrorKind::CompilerUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::warn!(code = self.code(), error = %self, "request rejected");
        }
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
