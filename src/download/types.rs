use crate::api::{ApiError, LookupResponse};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadStatus {
    Idle,
    Downloading(u8),
    Saved(PathBuf),
    Failed(String),
}

impl Default for DownloadStatus {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    LookupFinished(Result<LookupResponse, ApiError>),
    Started { index: usize },
    Progress { index: usize, percent: u8 },
    Saved { index: usize, path: PathBuf },
    Failed { index: usize, message: String },
    AllFinished,
}
