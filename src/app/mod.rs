mod state;
mod ui;

use crate::api::ShareClient;
use crate::download::{DownloadEvent, FileDownloader};
use crate::upload::{FileProcessor, UploadEvent};
use eframe::{egui, App};
pub use state::{ConnectionState, DownloadState, UploadState};
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

const BUSY_REPAINT_INTERVAL: Duration = Duration::from_millis(100);

pub struct DropItApp {
    client: ShareClient,
    runtime: Runtime,
    upload: UploadState,
    download: DownloadState,
    connection: ConnectionState,
    download_sender: std_mpsc::Sender<DownloadEvent>,
}

impl DropItApp {
    pub fn new(cc: &eframe::CreationContext<'_>, client: ShareClient, runtime: Runtime) -> Self {
        log::info!("Initializing DropIt client for {}", client.config().base_url);

        let (download_sender, download_receiver) = std_mpsc::channel();
        let download = DownloadState {
            destination: Some(client.config().resolve_download_dir()),
            event_receiver: Some(download_receiver),
            ..DownloadState::default()
        };

        let mut app = Self {
            client,
            runtime,
            upload: UploadState::default(),
            download,
            connection: ConnectionState::default(),
            download_sender,
        };
        app.check_connection(&cc.egui_ctx);
        app
    }

    pub fn choose_files(&mut self) {
        if let Some(paths) = rfd::FileDialog::new().pick_files() {
            let files = FileProcessor::from_paths(paths);
            log::info!("Selected {} files", files.len());
            self.upload.select_files(files);
        }
    }

    pub fn choose_folder(&mut self) {
        if let Some(folder) = rfd::FileDialog::new().pick_folder() {
            let files = FileProcessor::collect_folder(&folder);
            self.upload.select_files(files);
        }
    }

    pub fn choose_destination(&mut self) {
        let mut dialog = rfd::FileDialog::new();
        if let Some(current) = &self.download.destination {
            dialog = dialog.set_directory(current);
        }
        if let Some(folder) = dialog.pick_folder() {
            log::info!("Saving downloads to {}", folder.display());
            self.download.destination = Some(folder);
        }
    }

    pub fn start_upload(&mut self, ctx: &egui::Context) {
        let files = match self.upload.begin() {
            Ok(files) => files,
            Err(e) => {
                log::warn!("Upload not started: {}", e);
                return;
            }
        };

        log::info!("Starting upload of {} files", files.len());
        let (sender, receiver) = std_mpsc::channel();
        self.upload.event_receiver = Some(receiver);

        let client = self.client.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let progress_sender = sender.clone();
            let progress_ctx = ctx.clone();
            let on_progress = Arc::new(move |percent: u8| {
                log::debug!("Upload progress {}%", percent);
                progress_sender
                    .send(UploadEvent::Progress(percent))
                    .unwrap_or_default();
                progress_ctx.request_repaint();
            });

            let result = client.upload(&files, on_progress).await;
            if let Err(e) = &result {
                log::error!("Upload error: {}", e);
            }
            sender.send(UploadEvent::Finished(result)).unwrap_or_default();
            ctx.request_repaint();
        });
    }

    pub fn start_lookup(&mut self, ctx: &egui::Context) {
        if self.download.is_busy() {
            return;
        }
        let code = match self.download.begin_lookup() {
            Ok(code) => code,
            Err(e) => {
                log::warn!("Lookup not started: {}", e);
                return;
            }
        };

        let client = self.client.clone();
        let sender = self.download_sender.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let result = client.lookup(&code).await;
            if let Err(e) = &result {
                log::error!("Lookup error for {}: {}", code, e);
            }
            sender
                .send(DownloadEvent::LookupFinished(result))
                .unwrap_or_default();
            ctx.request_repaint();
        });
    }

    pub fn start_download(&mut self, ctx: &egui::Context, index: usize) {
        let Some(file) = self.download.files.get(index).cloned() else {
            return;
        };
        if !self.download.begin_download(index) {
            return;
        }

        let downloader = self.downloader();
        let sender = self.download_sender.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let _ = downloader.download_one(index, &file, &sender).await;
            ctx.request_repaint();
        });
    }

    pub fn start_download_all(&mut self, ctx: &egui::Context) {
        if !self.download.can_download_all() {
            return;
        }
        self.download.is_downloading_all = true;

        let files = self.download.files.clone();
        let delay = self.client.config().download_all_delay();
        let downloader = self.downloader();
        let sender = self.download_sender.clone();
        let ctx = ctx.clone();
        log::info!("Downloading all {} files", files.len());
        self.runtime.spawn(async move {
            downloader.download_all(&files, delay, &sender).await;
            ctx.request_repaint();
        });
    }

    pub fn check_connection(&mut self, ctx: &egui::Context) {
        if self.connection.is_checking {
            return;
        }
        self.connection.is_checking = true;

        let (sender, receiver) = std_mpsc::channel();
        self.connection.receiver = Some(receiver);

        let client = self.client.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let report = client.health().await;
            sender.send(report).unwrap_or_default();
            ctx.request_repaint();
        });
    }

    pub fn copy_to_clipboard(ctx: &egui::Context, text: &str) {
        ctx.output_mut(|output| output.copied_text = text.to_string());
    }

    pub fn open_link(url: &str) {
        if let Err(e) = open::that(url) {
            log::error!("Failed to open link {}: {}", url, e);
        }
    }

    fn destination(&self) -> PathBuf {
        self.download
            .destination
            .clone()
            .unwrap_or_else(|| self.client.config().resolve_download_dir())
    }

    fn downloader(&self) -> FileDownloader {
        FileDownloader::new(self.client.clone(), self.destination())
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        if let Some(receiver) = &self.upload.event_receiver {
            let events: Vec<UploadEvent> = receiver.try_iter().collect();
            for event in events {
                self.upload.apply_event(event);
            }
        }

        if let Some(receiver) = &self.download.event_receiver {
            let events: Vec<DownloadEvent> = receiver.try_iter().collect();
            for event in events {
                self.download.apply_event(event);
            }
        }

        if let Some(receiver) = &self.connection.receiver {
            if let Ok(report) = receiver.try_recv() {
                self.connection.report = Some(report);
                self.connection.is_checking = false;
                self.connection.receiver = None;
            }
        }

        if self.upload.is_uploading
            || self.download.is_loading
            || self.download.is_busy()
            || self.connection.is_checking
        {
            ctx.request_repaint_after(BUSY_REPAINT_INTERVAL);
        }
    }
}

impl App for DropItApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}
