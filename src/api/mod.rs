mod client;
mod error;
mod types;

pub use client::ShareClient;
pub use error::ApiError;
pub use types::{FileDescriptor, HealthReport, LookupResponse, UploadResponse};
