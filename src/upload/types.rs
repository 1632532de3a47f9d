use crate::api::{ApiError, UploadResponse};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub enum UploadEvent {
    Progress(u8),
    Finished(Result<UploadResponse, ApiError>),
}
