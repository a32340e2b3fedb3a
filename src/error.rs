//! Error types for the drive_export crate.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while exporting documents from Google Drive.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid URL or ID: {0}")]
    InvalidUrlOrId(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JWT encoding error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Token refresh failed: {0}")]
    TokenRefreshError(String),
}

impl DriveError {
    /// HTTP status reported to callers of the export endpoints.
    ///
    /// Provider errors keep the provider's status code. Local I/O failures
    /// and transport failures get their own statuses instead of being
    /// folded into 404.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DriveError::NotFound(_) => StatusCode::NOT_FOUND,
            DriveError::ApiError { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            DriveError::InvalidUrlOrId(_) => StatusCode::BAD_REQUEST,
            DriveError::HttpError(_) => StatusCode::BAD_GATEWAY,
            DriveError::Io(_)
            | DriveError::AuthenticationError(_)
            | DriveError::JsonError(_)
            | DriveError::JwtError(_)
            | DriveError::TokenRefreshError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type alias for DriveError.
pub type Result<T> = std::result::Result<T, DriveError>;
