use std::{path::Path, time::Duration};

use client_core::{FormController, ResourceRef, SubmissionState, SubmitOutcome};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::{
    domain::{suggested_pdf_filename, CsvFile},
    error::{AnalyzeError, ErrorKind},
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{err_label, human_readable_bytes, UiEvent},
    orchestration::dispatch_backend_command,
};

pub struct ReportApp {
    form: FormController,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    endpoint: String,
    status: String,
    submitted_title: String,
}

impl ReportApp {
    pub fn new(
        form: FormController,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        endpoint: String,
        status: String,
    ) -> Self {
        Self {
            form,
            cmd_tx,
            ui_rx,
            endpoint,
            status,
            submitted_title: String::new(),
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::WorkerFailed(message) => {
                    tracing::error!("{message}");
                    self.status = message;
                }
                UiEvent::AnalyzeFinished { attempt, outcome } => {
                    if !self.form.resolve(attempt, outcome) {
                        tracing::debug!(attempt = %attempt, "ignored stale report result");
                    }
                }
            }
        }
    }

    fn submit(&mut self) {
        match self.form.begin_submit() {
            SubmitOutcome::Dispatched(ticket) => {
                let attempt = ticket.attempt;
                self.submitted_title = ticket.input.title.clone();
                if let Err(reason) =
                    dispatch_backend_command(&self.cmd_tx, BackendCommand::Analyze(ticket))
                {
                    self.status = reason.clone();
                    self.form.resolve(attempt, Err(AnalyzeError::network(reason)));
                }
            }
            SubmitOutcome::Rejected(_) => {}
            SubmitOutcome::IgnoredWhilePending => {
                self.status = "A report is already being generated".to_string();
            }
        }
    }

    fn pick_csv_file(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .pick_file()
        else {
            return;
        };

        match CsvFile::from_path(&path) {
            Ok(file) => {
                self.status = format!("Selected {}", path.display());
                self.form.update_file(file);
            }
            Err(err) => {
                self.status = format!("Failed to read {}: {err}", path.display());
            }
        }
    }

    fn save_report_as(&mut self, resource: &ResourceRef) {
        let suggested = suggested_pdf_filename(&self.submitted_title);
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PDF", &["pdf"])
            .set_file_name(&suggested)
            .save_file()
        else {
            return;
        };

        match self.form.resources().save_as(resource, &path) {
            Ok(_) => self.status = format!("Saved report to {}", path.display()),
            Err(err) => self.status = format!("Failed to save report: {err}"),
        }
    }

    fn open_file_in_external_viewer(&mut self, path: &Path) {
        #[cfg(target_os = "windows")]
        let result = std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.to_string_lossy()])
            .spawn();

        #[cfg(target_os = "macos")]
        let result = std::process::Command::new("open").arg(path).spawn();

        #[cfg(all(unix, not(target_os = "macos")))]
        let result = std::process::Command::new("xdg-open").arg(path).spawn();

        if let Err(err) = result {
            self.status = format!("Failed to open external viewer: {err}");
        }
    }

    fn show_form(&mut self, ui: &mut egui::Ui) {
        let pending = self.form.is_pending();

        ui.label(egui::RichText::new("Report title").strong());
        let mut title = self.form.title().to_string();
        let title_response = ui.add_sized(
            [ui.available_width(), 30.0],
            egui::TextEdit::singleline(&mut title)
                .id_salt("report_title")
                .hint_text("e.g. Q1 Report"),
        );
        if title_response.changed() {
            self.form.update_title(title);
        }

        ui.add_space(10.0);
        ui.label(egui::RichText::new("CSV file").strong());
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!pending, egui::Button::new("Choose CSV…"))
                .clicked()
            {
                self.pick_csv_file();
            }
            let selected = self
                .form
                .file()
                .map(|file| (file.filename.clone(), file.size_bytes()));
            match selected {
                Some((filename, size)) => {
                    ui.label(format!("{filename} ({})", human_readable_bytes(size)));
                    if ui.add_enabled(!pending, egui::Button::new("Clear")).clicked() {
                        self.form.clear_file();
                    }
                }
                None => {
                    ui.label(egui::RichText::new("No file selected").weak());
                }
            }
        });

        ui.add_space(14.0);
        ui.horizontal(|ui| {
            let button = egui::Button::new(egui::RichText::new("Generate report").strong())
                .min_size(egui::vec2(160.0, 34.0));
            let enter_pressed = title_response.lost_focus()
                && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.add_enabled(!pending, button).clicked() || (enter_pressed && !pending) {
                self.submit();
            }
            if pending {
                ui.spinner();
                ui.label("Analyzing…");
            }
        });
    }

    fn show_failure_banner(ui: &mut egui::Ui, kind: ErrorKind, message: &str) {
        egui::Frame::NONE
            .fill(egui::Color32::from_rgb(111, 53, 53))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(
                        egui::RichText::new(format!("{}:", err_label(kind)))
                            .strong()
                            .color(egui::Color32::WHITE),
                    );
                    ui.label(egui::RichText::new(message).color(egui::Color32::WHITE));
                });
            });
    }

    fn show_result(&mut self, ui: &mut egui::Ui) {
        match self.form.state().clone() {
            SubmissionState::Idle | SubmissionState::Pending => {}
            SubmissionState::Failed { kind, message } => {
                Self::show_failure_banner(ui, kind, &message);
            }
            SubmissionState::Success(resource) => {
                egui::Frame::group(ui.style())
                    .corner_radius(8.0)
                    .inner_margin(egui::Margin::symmetric(12, 10))
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new("Report ready").strong().size(16.0));
                        ui.label(format!(
                            "{} · {}",
                            self.submitted_title,
                            human_readable_bytes(resource.size_bytes())
                        ));
                        ui.small(egui::RichText::new(resource.url().as_str()).weak());
                        ui.add_space(6.0);
                        ui.horizontal(|ui| {
                            if ui.button("Open in viewer").clicked() {
                                self.open_file_in_external_viewer(resource.path());
                            }
                            let download_label = format!(
                                "Download {}",
                                suggested_pdf_filename(&self.submitted_title)
                            );
                            if ui.button(download_label).clicked() {
                                self.save_report_as(&resource);
                            }
                        });
                    });
            }
        }
    }
}

impl eframe::App for ReportApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.small("Status:");
                ui.small(egui::RichText::new(&self.status).weak());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.small(egui::RichText::new(&self.endpoint).weak());
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("CSV report generator");
            ui.add_space(12.0);
            self.show_form(ui);
            ui.add_space(16.0);
            self.show_result(ui);
        });

        if self.form.is_pending() {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
