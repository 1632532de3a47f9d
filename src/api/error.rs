use serde::Deserialize;
use thiserror::Error;

pub const EXPIRED_LINK_MESSAGE: &str = "Download link has expired. Please fetch files again.";

/// Failures are classified only at transport and HTTP status level.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed with status code {status}")]
    Status {
        status: u16,
        reason: String,
        message: Option<String>,
    },

    #[error("{}", EXPIRED_LINK_MESSAGE)]
    LinkExpired,

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Please select at least one file")]
    EmptySelection,

    #[error("Please enter a download code")]
    EmptyCode,

    #[error("An upload is already in progress")]
    UploadInProgress,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ApiError {
    /// Builds a status error, keeping the server's `error` field when the body has one.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|body| body.error)
            .filter(|message| !message.trim().is_empty());

        ApiError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } => Some(message),
            _ => None,
        }
    }

    /// Text for the upload alert.
    pub fn upload_message(&self) -> String {
        match self {
            ApiError::Timeout => {
                "Upload timed out. The server may be unavailable. Please try again.".to_string()
            }
            ApiError::Network(_) => {
                "Cannot connect to server. Please check your internet connection and try again."
                    .to_string()
            }
            ApiError::Status { status: 413, .. } => {
                "File too large. Please select smaller files.".to_string()
            }
            ApiError::Status { status: 500, .. } => {
                "Server error. Please try again later.".to_string()
            }
            other => other
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        }
    }

    /// Text for the inline error box of the code lookup.
    pub fn lookup_message(&self) -> String {
        if let Some(message) = self.server_message() {
            return message.to_string();
        }
        match self {
            ApiError::EmptyCode => self.to_string(),
            ApiError::Status { status: 404, .. } => "No files found for this code".to_string(),
            ApiError::Status { status: 410, .. } => "This code has expired".to_string(),
            _ => "An error occurred while fetching files".to_string(),
        }
    }

    /// Reason shown after "Failed to download {filename}: ".
    pub fn download_reason(&self) -> String {
        match self {
            ApiError::Status { status, reason, .. } => {
                format!("Failed to download: {} {}", status, reason)
                    .trim_end()
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Network(err.to_string())
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
                message: None,
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
