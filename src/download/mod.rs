mod downloader;
mod types;

pub use downloader::FileDownloader;
pub use types::{DownloadEvent, DownloadStatus};
