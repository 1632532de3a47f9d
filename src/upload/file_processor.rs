use crate::api::ApiError;
use crate::upload::types::SelectedFile;
use crate::utils::ProgressTracker;
use futures_util::TryStreamExt;
use ignore::Walk;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use std::path::Path;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

/// Multipart field name the backend reads files from.
pub const FILES_FIELD: &str = "files";

const CHUNK_SIZE: usize = 64 * 1024;

pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

pub struct FileProcessor;

impl FileProcessor {
    pub fn from_path(path: &Path) -> Result<SelectedFile, ApiError> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(ApiError::Io(format!("{} is not a file", path.display())));
        }

        let name = path
            .file_name()
            .ok_or_else(|| ApiError::Io(format!("{} has no file name", path.display())))?
            .to_string_lossy()
            .to_string();

        Ok(SelectedFile {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
        })
    }

    /// Resolves picker results, logging and skipping entries that vanished or are not files.
    pub fn from_paths<I, P>(paths: I) -> Vec<SelectedFile>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        paths
            .into_iter()
            .filter_map(|path| match Self::from_path(path.as_ref()) {
                Ok(file) => Some(file),
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.as_ref().display(), e);
                    None
                }
            })
            .collect()
    }

    /// Regular files under `root`, skipping hidden and git-ignored entries.
    pub fn collect_folder(root: &Path) -> Vec<SelectedFile> {
        let mut files = Vec::new();
        for entry in Walk::new(root) {
            match entry {
                Ok(entry) if entry.path().is_file() => match Self::from_path(entry.path()) {
                    Ok(file) => files.push(file),
                    Err(e) => log::warn!("Skipping {}: {}", entry.path().display(), e),
                },
                Ok(_) => {}
                Err(e) => log::warn!("Failed to walk {}: {}", root.display(), e),
            }
        }
        log::info!("Collected {} files from {}", files.len(), root.display());
        files
    }

    /// One `files` part per selection, read from disk in chunks as the transport
    /// pulls them. Every chunk advances `tracker`.
    pub async fn build_form(
        files: &[SelectedFile],
        tracker: Arc<ProgressTracker>,
        on_progress: ProgressFn,
    ) -> Result<Form, ApiError> {
        let mut form = Form::new();

        for file in files {
            let reader = tokio::fs::File::open(&file.path)
                .await
                .map_err(|e| ApiError::Io(format!("Failed to read {}: {}", file.name, e)))?;
            let length = reader.metadata().await?.len();

            let tracker = Arc::clone(&tracker);
            let on_progress = Arc::clone(&on_progress);
            let body = ReaderStream::with_capacity(reader, CHUNK_SIZE).inspect_ok(move |chunk| {
                if let Some(percent) = tracker.advance(chunk.len() as u64) {
                    on_progress(percent);
                }
            });

            let part = Part::stream_with_length(Body::wrap_stream(body), length)
                .file_name(file.name.clone());
            form = form.part(FILES_FIELD, part);
        }

        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn from_path_reads_name_and_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.pdf");
        fs::write(&path, vec![0u8; 2048]).unwrap();

        let file = FileProcessor::from_path(&path).unwrap();
        assert_eq!(file.name, "report.pdf");
        assert_eq!(file.size, 2048);
    }

    #[test]
    fn from_path_rejects_directories() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            FileProcessor::from_path(dir.path()),
            Err(ApiError::Io(_))
        ));
    }

    #[test]
    fn from_paths_skips_missing_entries() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("a.txt");
        fs::write(&present, b"hello").unwrap();
        let missing = dir.path().join("gone.txt");

        let files = FileProcessor::from_paths([present, missing]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a.txt");
    }

    #[test]
    fn collect_folder_skips_hidden_files() {
        let dir = tempfile::Builder::new().prefix("dropit").tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("one.txt"), b"1").unwrap();
        fs::write(dir.path().join("nested").join("two.txt"), b"22").unwrap();
        fs::write(dir.path().join(".secret"), b"x").unwrap();

        let mut names: Vec<String> = FileProcessor::collect_folder(dir.path())
            .into_iter()
            .map(|f| f.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["one.txt".to_string(), "two.txt".to_string()]);
    }

    #[tokio::test]
    async fn build_form_fails_for_unreadable_file() {
        let dir = TempDir::new().unwrap();
        let file = SelectedFile {
            path: dir.path().join("missing.bin"),
            name: "missing.bin".to_string(),
            size: 3,
        };
        let tracker = Arc::new(ProgressTracker::new(3));
        let result = FileProcessor::build_form(&[file], tracker, Arc::new(|_: u8| {})).await;
        match result {
            Err(ApiError::Io(message)) => assert!(message.contains("missing.bin")),
            _ => panic!("expected an I/O error"),
        }
    }

    #[tokio::test]
    async fn build_form_reads_nothing_until_sent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        fs::write(&path, vec![7u8; 200_000]).unwrap();
        let file = FileProcessor::from_path(&path).unwrap();

        let tracker = Arc::new(ProgressTracker::new(file.size));
        let _form = FileProcessor::build_form(&[file], Arc::clone(&tracker), Arc::new(|_: u8| {}))
            .await
            .unwrap();
        assert_eq!(tracker.loaded(), 0);
    }
}
