mod backend_bridge;
mod controller;
mod ui;

use std::path::PathBuf;

use clap::Parser;
use client_core::{load_settings, ClientSettings, FormController, HttpAnalyzeClient};
use crossbeam_channel::bounded;
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::ReportApp;

#[derive(Parser, Debug)]
struct Args {
    /// Settings file to read instead of ./report_client.toml.
    #[arg(long, default_value = client_core::config::SETTINGS_FILE)]
    config: PathBuf,
    #[arg(long)]
    server_url: Option<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let (mut settings, mut status) = match load_settings(&args.config) {
        Ok(settings) => (settings, "Backend worker starting...".to_string()),
        Err(err) => {
            tracing::error!("failed to load settings, using defaults: {err:#}");
            (
                ClientSettings::default(),
                format!("Settings error, using defaults: {err:#}"),
            )
        }
    };
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }

    let client = match HttpAnalyzeClient::from_settings(&settings) {
        Ok(client) => client,
        Err(err) => {
            tracing::error!("invalid analyze endpoint, falling back to defaults: {err:#}");
            status = format!("Invalid endpoint ({err:#}); using defaults");
            settings = ClientSettings {
                resubmit_policy: settings.resubmit_policy,
                ..ClientSettings::default()
            };
            match HttpAnalyzeClient::from_settings(&settings) {
                Ok(client) => client,
                Err(err) => {
                    tracing::error!("default analyze endpoint is invalid: {err:#}");
                    return Ok(());
                }
            }
        }
    };
    let endpoint = client.endpoint().to_string();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(16);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(64);
    backend_bridge::runtime::launch(client, cmd_rx, ui_tx);

    let form = FormController::new(settings.resubmit_policy);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("CSV Report Generator")
            .with_inner_size([640.0, 420.0])
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };
    eframe::run_native(
        "CSV Report Generator",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(ReportApp::new(
                form, cmd_tx, ui_rx, endpoint, status,
            )))
        }),
    )
}
