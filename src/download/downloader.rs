use crate::api::{ApiError, FileDescriptor, ShareClient};
use crate::download::types::DownloadEvent;
use crate::utils::ProgressTracker;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

const PARTIAL_SUFFIX: &str = ".part";

/// Saves backend files into one destination directory.
#[derive(Clone)]
pub struct FileDownloader {
    client: ShareClient,
    destination: PathBuf,
}

impl FileDownloader {
    pub fn new(client: ShareClient, destination: PathBuf) -> Self {
        Self {
            client,
            destination,
        }
    }

    /// Downloads one file, reporting through `events`. The error is also reported
    /// as a `Failed` event before it is returned.
    pub async fn download_one(
        &self,
        index: usize,
        file: &FileDescriptor,
        events: &Sender<DownloadEvent>,
    ) -> Result<PathBuf, ApiError> {
        events.send(DownloadEvent::Started { index }).unwrap_or_default();
        log::info!("Downloading {} into {}", file.filename, self.destination.display());

        match self.fetch_to_disk(index, file, events).await {
            Ok(path) => {
                log::info!("Saved {} as {}", file.filename, path.display());
                events
                    .send(DownloadEvent::Saved {
                        index,
                        path: path.clone(),
                    })
                    .unwrap_or_default();
                Ok(path)
            }
            Err(e) => {
                log::error!("Download of {} failed: {}", file.filename, e);
                events
                    .send(DownloadEvent::Failed {
                        index,
                        message: format!(
                            "Failed to download {}: {}",
                            file.filename,
                            e.download_reason()
                        ),
                    })
                    .unwrap_or_default();
                Err(e)
            }
        }
    }

    /// Strictly sequential: one request per file in list order, pausing `delay`
    /// between files. A failed file does not stop the rest.
    pub async fn download_all(
        &self,
        files: &[FileDescriptor],
        delay: Duration,
        events: &Sender<DownloadEvent>,
    ) -> Vec<Result<PathBuf, ApiError>> {
        let mut results = Vec::with_capacity(files.len());

        for (index, file) in files.iter().enumerate() {
            results.push(self.download_one(index, file, events).await);
            if index + 1 < files.len() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        let failed = results.iter().filter(|r| r.is_err()).count();
        log::info!(
            "Download all finished: {} saved, {} failed",
            results.len() - failed,
            failed
        );
        events.send(DownloadEvent::AllFinished).unwrap_or_default();
        results
    }

    async fn fetch_to_disk(
        &self,
        index: usize,
        file: &FileDescriptor,
        events: &Sender<DownloadEvent>,
    ) -> Result<PathBuf, ApiError> {
        let mut body = self.client.open_download(file).await?;

        if body.is_xml() {
            let bytes = body.bytes().await?;
            if String::from_utf8_lossy(&bytes).contains("<Error>") {
                return Err(ApiError::LinkExpired);
            }
            return self.store(file, &bytes).await;
        }

        tokio::fs::create_dir_all(&self.destination).await?;
        let partial_name = format!("{}{}", Self::safe_name(&file.filename), PARTIAL_SUFFIX);
        let partial = Self::unique_path(&self.destination, &partial_name);

        let total = body.content_length().unwrap_or(file.file_size);
        let tracker = ProgressTracker::new(total);

        let mut out = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&partial)
            .await?;

        let written = async {
            while let Some(chunk) = body.chunk().await? {
                out.write_all(&chunk).await?;
                if let Some(percent) = tracker.advance(chunk.len() as u64) {
                    events
                        .send(DownloadEvent::Progress { index, percent })
                        .unwrap_or_default();
                }
            }
            out.flush().await?;
            Ok::<(), ApiError>(())
        }
        .await;

        drop(out);

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }

        log::debug!("Received {} bytes for {}", tracker.loaded(), file.filename);
        let target = Self::unique_path(&self.destination, &file.filename);
        tokio::fs::rename(&partial, &target).await?;
        Ok(target)
    }

    async fn store(&self, file: &FileDescriptor, bytes: &[u8]) -> Result<PathBuf, ApiError> {
        tokio::fs::create_dir_all(&self.destination).await?;
        let target = Self::unique_path(&self.destination, &file.filename);
        tokio::fs::write(&target, bytes).await?;
        Ok(target)
    }

    /// Last path component only; backend names must not escape the destination.
    pub fn safe_name(filename: &str) -> String {
        let name = filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or("")
            .trim();
        if name.is_empty() || name == "." || name == ".." {
            "download".to_string()
        } else {
            name.to_string()
        }
    }

    /// `name.ext`, then `name (1).ext`, `name (2).ext`, ... until the path is free.
    pub fn unique_path(dir: &Path, filename: &str) -> PathBuf {
        let name = Self::safe_name(filename);
        let candidate = dir.join(&name);
        if !candidate.exists() {
            return candidate;
        }

        let (stem, extension) = match name.rfind('.') {
            Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
            _ => (name.as_str(), ""),
        };

        (1..)
            .map(|n| dir.join(format!("{} ({}){}", stem, n, extension)))
            .find(|path| !path.exists())
            .unwrap_or(candidate)
    }
}
