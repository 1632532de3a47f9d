mod file_processor;
mod types;

pub use file_processor::{FileProcessor, ProgressFn};
pub use types::{SelectedFile, UploadEvent};
