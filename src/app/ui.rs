use super::DropItApp;
use crate::api::HealthReport;
use crate::download::DownloadStatus;
use crate::utils::FileSizeUtils;
use eframe::egui::{self, Align, Color32, RichText};

const ACCENT: Color32 = Color32::from_rgb(39, 174, 96);
const LINK_BLUE: Color32 = Color32::from_rgb(59, 130, 246);
const ERROR_RED: Color32 = Color32::from_rgb(220, 50, 50);
const MUTED: Color32 = Color32::from_rgb(127, 140, 141);

enum UiAction {
    ChooseFiles,
    ChooseFolder,
    Upload,
    Lookup,
    ChooseDestination,
    Download(usize),
    DownloadAll,
    CheckConnection,
    DismissAlert,
}

impl DropItApp {
    pub fn render(&mut self, ctx: &egui::Context) {
        let mut actions = Vec::new();

        egui::CentralPanel::default().show(ctx, |ui| {
            let footer_height = 40.0;
            let content_height = ui.available_height() - footer_height;

            egui::ScrollArea::vertical()
                .max_height(content_height)
                .show(ui, |ui| {
                    ui.add_space(10.0);
                    self.render_header(ui, &mut actions);
                    ui.add_space(20.0);
                    self.render_upload(ui, &mut actions);
                    ui.add_space(20.0);
                    ui.separator();
                    ui.add_space(20.0);
                    self.render_download(ui, &mut actions);
                    ui.add_space(20.0);
                });

            ui.with_layout(egui::Layout::bottom_up(Align::Center), |ui| {
                ui.add_space(10.0);
                self.render_footer(ui);
            });
        });

        self.render_alert(ctx, &mut actions);

        for action in actions {
            match action {
                UiAction::ChooseFiles => self.choose_files(),
                UiAction::ChooseFolder => self.choose_folder(),
                UiAction::Upload => self.start_upload(ctx),
                UiAction::Lookup => self.start_lookup(ctx),
                UiAction::ChooseDestination => self.choose_destination(),
                UiAction::Download(index) => self.start_download(ctx, index),
                UiAction::DownloadAll => self.start_download_all(ctx),
                UiAction::CheckConnection => self.check_connection(ctx),
                UiAction::DismissAlert => {
                    if self.upload.alert.take().is_none() && !self.download.alerts.is_empty() {
                        self.download.alerts.remove(0);
                    }
                }
            }
        }
    }

    fn render_header(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.horizontal(|ui| {
            ui.heading("📤 Cross Device File Transfer");
            ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                let color = match &self.connection.report {
                    Some(HealthReport::Reachable { .. }) => ACCENT,
                    Some(HealthReport::Unreachable(_)) => ERROR_RED,
                    None => MUTED,
                };
                let status = self.client.status();
                let mut details = format!(
                    "Backend: {}\nTimeout: {} ms",
                    status.base_url, status.timeout_ms
                );
                for (name, path) in &status.endpoints {
                    details.push_str(&format!("\n{}: {}", name, path));
                }
                if let Some(HealthReport::Unreachable(reason)) = &self.connection.report {
                    details.push_str(&format!("\n\nLast check: {}", reason));
                }
                details.push_str("\n\nClick to check again");

                let label = egui::Label::new(
                    RichText::new(format!("● {}", self.connection.label())).color(color),
                )
                .sense(egui::Sense::click());
                if ui.add(label).on_hover_text(details).clicked() {
                    actions.push(UiAction::CheckConnection);
                }
            });
        });
    }

    fn render_upload(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.vertical_centered(|ui| {
            ui.label(RichText::new("Upload Files").size(24.0));
            ui.label(
                RichText::new("Select files to upload and share with others").color(MUTED),
            );
        });
        ui.add_space(12.0);

        ui.group(|ui| {
            ui.horizontal(|ui| {
                let idle = !self.upload.is_uploading;
                if ui.add_enabled(idle, egui::Button::new("📄 Choose Files")).clicked() {
                    actions.push(UiAction::ChooseFiles);
                }
                if ui.add_enabled(idle, egui::Button::new("📁 Add Folder")).clicked() {
                    actions.push(UiAction::ChooseFolder);
                }
                let count = self.upload.selected.len();
                if count == 0 {
                    ui.label(RichText::new("No files selected").color(MUTED));
                } else {
                    ui.label(format!(
                        "{} file{} selected",
                        count,
                        if count == 1 { "" } else { "s" }
                    ));
                }
            });
        });

        if !self.upload.selected.is_empty() {
            ui.add_space(8.0);
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    ui.strong(format!("Selected Files ({})", self.upload.selected.len()));
                    ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "Total: {}",
                            FileSizeUtils::format_size(self.upload.total_size())
                        ));
                    });
                });
                egui::ScrollArea::vertical()
                    .id_source("selected_files")
                    .max_height(160.0)
                    .show(ui, |ui| {
                        for file in &self.upload.selected {
                            file_row(ui, &file.name, &FileSizeUtils::format_size(file.size));
                        }
                    });
            });
        }

        ui.add_space(12.0);
        ui.vertical_centered(|ui| {
            let button = egui::Button::new(self.upload.submit_label())
                .min_size(egui::vec2(200.0, 36.0));
            if ui.add_enabled(self.upload.can_submit(), button).clicked() {
                actions.push(UiAction::Upload);
            }
        });

        if self.upload.is_uploading {
            ui.add_space(12.0);
            let progress = egui::ProgressBar::new(f32::from(self.upload.progress) / 100.0)
                .text(format!("{}% complete", self.upload.progress))
                .fill(ACCENT);
            ui.add(progress);
        }

        if self.upload.has_result() {
            ui.add_space(16.0);
            self.render_upload_result(ui);
        }
    }

    fn render_upload_result(&self, ui: &mut egui::Ui) {
        let Some(code) = &self.upload.code else {
            return;
        };

        ui.group(|ui| {
            ui.vertical_centered(|ui| {
                ui.label(RichText::new("Upload Successful!").size(20.0).color(ACCENT));
                ui.add_space(8.0);
                ui.label(RichText::new("Share Code").color(MUTED));
                ui.label(RichText::new(code).size(28.0).monospace().strong());
                if ui.button("📋 Copy Code").clicked() {
                    DropItApp::copy_to_clipboard(ui.ctx(), code);
                }

                if let Some(url) = &self.upload.download_url {
                    ui.add_space(8.0);
                    if ui.link(RichText::new(url).color(LINK_BLUE)).clicked() {
                        DropItApp::open_link(url);
                    }
                    if ui.button("🔗 Copy Link").clicked() {
                        DropItApp::copy_to_clipboard(ui.ctx(), url);
                    }
                    ui.label(
                        RichText::new("Open this link on another device to download the files")
                            .color(MUTED),
                    );
                }
            });

            ui.add_space(12.0);
            ui.strong(format!("Uploaded Files ({})", self.upload.uploaded_files.len()));
            for file in &self.upload.uploaded_files {
                file_row(ui, &file.filename, &FileSizeUtils::format_size(file.file_size));
            }
            ui.add_space(6.0);
            ui.label(
                RichText::new("All files are available for download using the share code above")
                    .small()
                    .color(MUTED),
            );
        });
    }

    fn render_download(&mut self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.vertical_centered(|ui| {
            ui.label(RichText::new("Retrieve Files").size(24.0));
            ui.label(
                RichText::new("Enter a download code to fetch files. Links are short-lived.")
                    .color(MUTED),
            );
        });
        ui.add_space(12.0);

        let input = ui.add(
            egui::TextEdit::singleline(&mut self.download.code)
                .hint_text("Enter download code")
                .font(egui::TextStyle::Monospace)
                .desired_width(f32::INFINITY),
        );
        let submitted = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        ui.add_space(6.0);
        let can_lookup = !self.download.is_loading
            && !self.download.is_busy()
            && !self.download.code.trim().is_empty();
        let label = if self.download.is_loading {
            "Fetching Files..."
        } else {
            "Get Files"
        };
        let clicked = ui
            .add_enabled(
                can_lookup,
                egui::Button::new(label).min_size(egui::vec2(ui.available_width(), 32.0)),
            )
            .clicked();
        if clicked || (submitted && can_lookup) {
            actions.push(UiAction::Lookup);
        }

        if self.download.is_loading {
            ui.add_space(6.0);
            ui.add(egui::Spinner::new());
        }

        if let Some(error) = &self.download.error {
            ui.add_space(8.0);
            egui::Frame::group(ui.style())
                .fill(Color32::from_rgba_unmultiplied(128, 0, 0, 40))
                .show(ui, |ui| {
                    ui.colored_label(ERROR_RED, format!("Error: {}", error));
                    if self.download.error_mentions_expiry() {
                        ui.label(
                            "The download links may have expired. Try fetching the files again.",
                        );
                    }
                });
        }

        if !self.download.files.is_empty() {
            ui.add_space(12.0);
            self.render_download_list(ui, actions);
        }
    }

    fn render_download_list(&self, ui: &mut egui::Ui, actions: &mut Vec<UiAction>) {
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.strong(self.download.found_label());
                ui.label(
                    RichText::new(format!(
                        "Total Size: {}",
                        FileSizeUtils::format_size(self.download.total_size)
                    ))
                    .color(MUTED),
                );
            });
            if self.download.files.len() > 1 {
                ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                    let label = if self.download.is_downloading_all {
                        "Downloading..."
                    } else {
                        "Download All"
                    };
                    if ui
                        .add_enabled(self.download.can_download_all(), egui::Button::new(label))
                        .clicked()
                    {
                        actions.push(UiAction::DownloadAll);
                    }
                });
            }
        });

        ui.horizontal(|ui| {
            let destination = self
                .download
                .destination
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "current directory".to_string());
            ui.label(RichText::new(format!("Save to: {}", destination)).small());
            if ui.small_button("Change").clicked() {
                actions.push(UiAction::ChooseDestination);
            }
        });

        ui.add_space(6.0);
        for (index, file) in self.download.files.iter().enumerate() {
            ui.group(|ui| {
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        ui.strong(file.filename.as_str());
                        ui.label(
                            RichText::new(format!(
                                "{} • {}",
                                FileSizeUtils::format_size(file.file_size),
                                file.mime_label()
                            ))
                            .small()
                            .color(MUTED),
                        );
                    });
                    ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                        let status = self.download.status_of(index);
                        let idle = !matches!(status, DownloadStatus::Downloading(_))
                            && !self.download.is_downloading_all;
                        if ui
                            .add_enabled(idle, egui::Button::new("Download"))
                            .clicked()
                        {
                            actions.push(UiAction::Download(index));
                        }
                        render_status(ui, status);
                    });
                });
            });
        }

        ui.add_space(8.0);
        ui.label(
            RichText::new(
                "Note: Download links are generated fresh each time you fetch files. \
                 If a download fails due to expiration, re-fetch to get fresh signed URLs.",
            )
            .small()
            .color(MUTED),
        );
    }

    fn render_alert(&self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        let message = self
            .upload
            .alert
            .as_ref()
            .or_else(|| self.download.alerts.first());
        let Some(message) = message else {
            return;
        };

        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message.as_str());
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        actions.push(UiAction::DismissAlert);
                    }
                });
            });
    }

    fn render_footer(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let footer_width = 260.0;
            ui.add_space(((ui.available_width() - footer_width) / 2.0).max(0.0));
            ui.label("Made with care,");
            ui.colored_label(ACCENT, "♥");
            if ui
                .add(
                    egui::Label::new(RichText::new("DropIt").color(ACCENT))
                        .sense(egui::Sense::click()),
                )
                .on_hover_text(self.client.config().base_url.as_str())
                .clicked()
            {
                DropItApp::open_link(&self.client.config().base_url);
            }
        });
    }
}

fn file_row(ui: &mut egui::Ui, name: &str, size: &str) {
    ui.horizontal(|ui| {
        ui.label(name);
        ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
            ui.label(RichText::new(size).color(MUTED));
        });
    });
}

fn render_status(ui: &mut egui::Ui, status: &DownloadStatus) {
    match status {
        DownloadStatus::Idle => {}
        DownloadStatus::Downloading(percent) => {
            ui.add(
                egui::ProgressBar::new(f32::from(*percent) / 100.0)
                    .desired_width(90.0)
                    .show_percentage(),
            );
        }
        DownloadStatus::Saved(path) => {
            ui.label("✅").on_hover_text(path.display().to_string());
        }
        DownloadStatus::Failed(message) => {
            ui.colored_label(ERROR_RED, "❌").on_hover_text(message.as_str());
        }
    }
}
