use crate::api::{ApiError, FileDescriptor, HealthReport, LookupResponse, UploadResponse};
use crate::download::{DownloadEvent, DownloadStatus};
use crate::upload::{SelectedFile, UploadEvent};
use crate::utils::FileSizeUtils;
use derivative::Derivative;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;

#[derive(Derivative, Default)]
#[derivative(Debug)]
pub struct UploadState {
    pub selected: Vec<SelectedFile>,
    /// Batch handed to the running upload.
    pub submitted: Vec<SelectedFile>,
    pub code: Option<String>,
    pub download_url: Option<String>,
    pub qr_code: Option<String>,
    pub uploaded_files: Vec<FileDescriptor>,
    pub progress: u8,
    pub is_uploading: bool,
    pub alert: Option<String>,
    #[derivative(Debug = "ignore")]
    pub event_receiver: Option<Receiver<UploadEvent>>,
}

impl UploadState {
    /// A new selection replaces the old one and hides the previous result.
    pub fn select_files(&mut self, files: Vec<SelectedFile>) {
        self.selected = files;
        self.code = None;
        self.download_url = None;
        self.qr_code = None;
        self.uploaded_files.clear();
    }

    pub fn total_size(&self) -> u64 {
        FileSizeUtils::total_size(self.selected.iter().map(|f| f.size))
    }

    pub fn can_submit(&self) -> bool {
        !self.is_uploading && !self.selected.is_empty()
    }

    pub fn has_result(&self) -> bool {
        self.code.is_some() && !self.is_uploading
    }

    /// Returns the files to send. An empty selection only raises the alert.
    pub fn begin(&mut self) -> Result<Vec<SelectedFile>, ApiError> {
        if self.selected.is_empty() {
            self.alert = Some(ApiError::EmptySelection.upload_message());
            return Err(ApiError::EmptySelection);
        }
        if self.is_uploading {
            return Err(ApiError::UploadInProgress);
        }
        self.is_uploading = true;
        self.progress = 0;
        self.alert = None;
        self.submitted = self.selected.clone();
        Ok(self.submitted.clone())
    }

    pub fn apply_progress(&mut self, percent: u8) {
        self.progress = self.progress.max(percent.min(100));
    }

    /// A selection made while the upload ran is kept; only the sent batch is cleared.
    pub fn finish(&mut self, result: Result<UploadResponse, ApiError>) {
        self.is_uploading = false;
        let submitted = std::mem::take(&mut self.submitted);
        match result {
            Ok(response) => {
                self.apply_progress(100);
                self.code = Some(response.code);
                self.download_url = Some(response.download_url).filter(|u| !u.is_empty());
                self.qr_code = response.qr_code;
                self.uploaded_files = response.files;
                if self.selected == submitted {
                    self.selected.clear();
                }
            }
            Err(e) => {
                self.alert = Some(e.upload_message());
            }
        }
    }

    pub fn apply_event(&mut self, event: UploadEvent) {
        match event {
            UploadEvent::Progress(percent) => self.apply_progress(percent),
            UploadEvent::Finished(result) => {
                self.finish(result);
                self.event_receiver = None;
            }
        }
    }

    pub fn submit_label(&self) -> String {
        if self.is_uploading {
            return "Uploading...".to_string();
        }
        let count = self.selected.len();
        format!("Upload {} File{}", count, plural(count))
    }
}

#[derive(Derivative, Default)]
#[derivative(Debug)]
pub struct DownloadState {
    pub code: String,
    pub files: Vec<FileDescriptor>,
    pub statuses: Vec<DownloadStatus>,
    pub files_count: usize,
    pub total_size: u64,
    pub is_loading: bool,
    pub is_downloading_all: bool,
    pub error: Option<String>,
    pub destination: Option<PathBuf>,
    pub alerts: Vec<String>,
    #[derivative(Debug = "ignore")]
    pub event_receiver: Option<Receiver<DownloadEvent>>,
}

impl DownloadState {
    /// Returns the trimmed code, or `EmptyCode` without touching any state.
    pub fn begin_lookup(&mut self) -> Result<String, ApiError> {
        let code = self.code.trim().to_string();
        if code.is_empty() {
            return Err(ApiError::EmptyCode);
        }
        self.is_loading = true;
        self.error = None;
        self.files.clear();
        self.statuses.clear();
        self.files_count = 0;
        self.total_size = 0;
        Ok(code)
    }

    pub fn finish_lookup(&mut self, result: Result<LookupResponse, ApiError>) {
        self.is_loading = false;
        match result {
            Ok(lookup) => {
                self.files_count = lookup.count();
                self.total_size = lookup.total_size();
                self.statuses = vec![DownloadStatus::Idle; lookup.files.len()];
                self.files = lookup.files;
            }
            Err(e) => self.error = Some(e.lookup_message()),
        }
    }

    pub fn apply_event(&mut self, event: DownloadEvent) {
        match event {
            DownloadEvent::LookupFinished(result) => self.finish_lookup(result),
            DownloadEvent::Started { index } => self.set_status(index, DownloadStatus::Downloading(0)),
            DownloadEvent::Progress { index, percent } => {
                if let Some(DownloadStatus::Downloading(current)) = self.statuses.get_mut(index) {
                    *current = (*current).max(percent.min(100));
                }
            }
            DownloadEvent::Saved { index, path } => self.set_status(index, DownloadStatus::Saved(path)),
            DownloadEvent::Failed { index, message } => {
                self.set_status(index, DownloadStatus::Failed(message.clone()));
                self.alerts.push(message);
            }
            DownloadEvent::AllFinished => self.is_downloading_all = false,
        }
    }

    /// Marks `index` as downloading right away. Returns false when the file is
    /// unknown or already in flight.
    pub fn begin_download(&mut self, index: usize) -> bool {
        if self.is_downloading_all || self.is_loading {
            return false;
        }
        match self.statuses.get_mut(index) {
            Some(DownloadStatus::Downloading(_)) | None => false,
            Some(slot) => {
                *slot = DownloadStatus::Downloading(0);
                true
            }
        }
    }

    fn set_status(&mut self, index: usize, status: DownloadStatus) {
        if let Some(slot) = self.statuses.get_mut(index) {
            *slot = status;
        }
    }

    pub fn is_busy(&self) -> bool {
        self.is_downloading_all
            || self
                .statuses
                .iter()
                .any(|s| matches!(s, DownloadStatus::Downloading(_)))
    }

    pub fn can_download_all(&self) -> bool {
        self.files.len() > 1 && !self.is_busy()
    }

    pub fn status_of(&self, index: usize) -> &DownloadStatus {
        static IDLE: DownloadStatus = DownloadStatus::Idle;
        self.statuses.get(index).unwrap_or(&IDLE)
    }

    pub fn error_mentions_expiry(&self) -> bool {
        self.error
            .as_deref()
            .map(|e| e.to_lowercase().contains("expired"))
            .unwrap_or(false)
    }

    pub fn found_label(&self) -> String {
        format!("Found {} File{}", self.files_count, plural(self.files_count))
    }
}

#[derive(Derivative, Default)]
#[derivative(Debug)]
pub struct ConnectionState {
    pub report: Option<HealthReport>,
    pub is_checking: bool,
    #[derivative(Debug = "ignore")]
    pub receiver: Option<Receiver<HealthReport>>,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match (&self.report, self.is_checking) {
            (_, true) => "Checking...",
            (Some(HealthReport::Reachable { .. }), _) => "Online",
            (Some(HealthReport::Unreachable(_)), _) => "Offline",
            (None, false) => "Unknown",
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
