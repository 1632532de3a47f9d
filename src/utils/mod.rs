pub mod file_size;
pub mod logger;
pub mod progress;

pub use file_size::FileSizeUtils;
pub use progress::ProgressTracker;
