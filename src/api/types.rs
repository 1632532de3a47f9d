use crate::api::error::ApiError;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend file id; the service has sent both strings and numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileId {
    Text(String),
    Number(u64),
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileId::Text(id) => f.write_str(id),
            FileId::Number(id) => write!(f, "{}", id),
        }
    }
}

/// One retrievable file. Links are only valid for the backend's link lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub filename: String,
    #[serde(default, alias = "size")]
    pub file_size: u64,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub id: Option<FileId>,
}

impl FileDescriptor {
    pub fn mime_label(&self) -> &str {
        self.mime_type
            .as_deref()
            .filter(|mime| !mime.is_empty())
            .unwrap_or("application/octet-stream")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub code: String,
    #[serde(rename = "downloadURL", alias = "downloadUrl", default)]
    pub download_url: String,
    #[serde(default)]
    pub qr_code: Option<String>,
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResponse {
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
    #[serde(default)]
    pub files_count: Option<usize>,
    #[serde(default)]
    pub total_size: Option<u64>,
}

impl LookupResponse {
    pub fn count(&self) -> usize {
        self.files_count
            .filter(|count| *count > 0)
            .unwrap_or(self.files.len())
    }

    pub fn total_size(&self) -> u64 {
        self.total_size.unwrap_or(0)
    }
}

/// Body of `/api/download/:id` when it hands out a fresh signed link instead of bytes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedLink {
    #[serde(alias = "url", alias = "downloadURL")]
    pub download_url: String,
}

/// File content, either still on the wire or already read while looking for a
/// signed link.
#[derive(Debug)]
pub enum DownloadBody {
    Streaming(Response),
    Buffered(Bytes),
}

impl DownloadBody {
    pub fn content_length(&self) -> Option<u64> {
        match self {
            Self::Streaming(response) => response.content_length(),
            Self::Buffered(bytes) => Some(bytes.len() as u64),
        }
    }

    /// Storage error documents come back as XML, with or without a content type.
    pub fn is_xml(&self) -> bool {
        match self {
            Self::Streaming(response) => response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.contains("xml"))
                .unwrap_or(false),
            Self::Buffered(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                let text = text.trim_start();
                text.starts_with("<?xml") || text.starts_with("<Error>")
            }
        }
    }

    pub async fn chunk(&mut self) -> Result<Option<Bytes>, ApiError> {
        match self {
            Self::Streaming(response) => Ok(response.chunk().await?),
            Self::Buffered(bytes) => {
                let chunk = std::mem::take(bytes);
                Ok((!chunk.is_empty()).then_some(chunk))
            }
        }
    }

    pub async fn bytes(self) -> Result<Bytes, ApiError> {
        match self {
            Self::Streaming(response) => Ok(response.bytes().await?),
            Self::Buffered(bytes) => Ok(bytes),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HealthReport {
    Reachable { status: u16 },
    Unreachable(String),
}
