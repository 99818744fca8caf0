use crate::extraction::ExtractionError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

#[derive(ThisError, Debug)]
pub enum Error {
    /// The request carried no `file` part
    #[error("No file uploaded")]
    MissingFile,

    /// Declared content type is neither a PDF nor an image
    #[error("Unsupported file type: {content_type}")]
    UnsupportedContentType { content_type: String },

    /// Upload exceeded the configured maximum size
    #[error("File size exceeds maximum allowed size of {max_bytes} bytes")]
    PayloadTooLarge { max_bytes: u64 },

    /// Malformed multipart data
    #[error("{message}")]
    BadRequest { message: String },

    /// The extraction collaborator failed on the uploaded bytes
    #[error("Failed to extract text from {content_type}")]
    ExtractionFailed {
        content_type: String,
        #[source]
        source: ExtractionError,
    },

    /// Extraction succeeded but produced nothing but whitespace
    #[error("Could not extract text")]
    EmptyContent,
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Machine-checkable error kind, e.g. `unsupported_content_type`
    pub error_kind: String,
    /// Human-readable description
    pub message: String,
    /// Diagnostic detail from the extraction engine, only set for `extraction_failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

const MIB: u64 = 1024 * 1024;

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingFile => StatusCode::BAD_REQUEST,
            Error::UnsupportedContentType { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::ExtractionFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::EmptyContent => StatusCode::BAD_REQUEST,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Error::MissingFile => "missing_file",
            Error::UnsupportedContentType { .. } => "unsupported_content_type",
            Error::PayloadTooLarge { .. } => "payload_too_large",
            Error::BadRequest { .. } => "bad_request",
            Error::ExtractionFailed { .. } => "extraction_failed",
            Error::EmptyContent => "empty_content",
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::ExtractionFailed { .. } => "Server processing failed".to_string(),
            Error::PayloadTooLarge { max_bytes } => {
                let max_bytes = *max_bytes;
                let mib = max_bytes as f64 / (1024.0 * 1024.0);
                match max_bytes {
                    0..MIB => format!("File size exceeds maximum allowed size of {max_bytes} bytes"),
                    _ if max_bytes % MIB == 0 => {
                        format!("File size exceeds maximum allowed size of {max_bytes} bytes ({mib} MB)")
                    }
                    _ => format!("File size exceeds maximum allowed size of {max_bytes} bytes ({mib:.1} MB)"),
                }
            }
            other => other.to_string(),
        }
    }

    /// Engine message surfaced to the client for extraction failures
    fn details(&self) -> Option<String> {
        match self {
            Error::ExtractionFailed { source, .. } => Some(source.to_string()),
            _ => None,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error_kind: self.kind().to_string(),
            message: self.user_message(),
            details: self.details(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::ExtractionFailed { source, .. } => {
                tracing::error!(error = %source, "Server processing failed: {}", self);
            }
            Error::PayloadTooLarge { .. } => {
                tracing::warn!("Upload rejected: {}", self);
            }
            Error::MissingFile
            | Error::UnsupportedContentType { .. }
            | Error::BadRequest { .. }
            | Error::EmptyContent => {
                tracing::debug!("Client error: {}", self);
            }
        }

        (self.status_code(), Json(self.body())).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
