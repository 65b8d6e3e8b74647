use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{
    config::SETTINGS_FILE, env_lookup, load_settings_from, ClientSettings, FormController,
    HttpAnalyzeClient, ResubmitPolicy, SubmissionState,
};
use shared::domain::{suggested_pdf_filename, CsvFile};

/// Upload a CSV file to the analysis service and save the returned PDF report.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    file: Option<PathBuf>,
    /// Where to write the PDF. Defaults to `<title>.pdf` in the current directory.
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, default_value = SETTINGS_FILE)]
    config: PathBuf,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    analyze_path: Option<String>,
    #[arg(long)]
    file_field: Option<String>,
    #[arg(long)]
    title_field: Option<String>,
}

fn resolve_settings(args: &Args, env: impl Fn(&str) -> Option<String>) -> Result<ClientSettings> {
    let mut settings = load_settings_from(&args.config, env)?;
    if let Some(v) = &args.server_url {
        settings.server_url = v.clone();
    }
    if let Some(v) = &args.analyze_path {
        settings.analyze_path = v.clone();
    }
    if let Some(v) = &args.file_field {
        settings.fields.file = v.clone();
    }
    if let Some(v) = &args.title_field {
        settings.fields.title = v.clone();
    }
    Ok(settings)
}

fn output_path(out: Option<&Path>, title: &str) -> PathBuf {
    out.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(suggested_pdf_filename(title)))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let settings = resolve_settings(&args, env_lookup)?;
    let client = HttpAnalyzeClient::from_settings(&settings)?;
    tracing::info!(endpoint = %client.endpoint(), "using analysis endpoint");

    // A one-shot run never resubmits, so the pending policy does not matter here.
    let mut form = FormController::new(ResubmitPolicy::Ignore);
    if let Some(title) = &args.title {
        form.update_title(title.clone());
    }
    if let Some(path) = &args.file {
        let file = CsvFile::from_path(path)
            .with_context(|| format!("failed to read CSV file '{}'", path.display()))?;
        if !file.has_csv_extension() {
            tracing::warn!(file = %path.display(), "selected file does not have a .csv extension");
        }
        form.update_file(file);
    }

    let state = form.submit(&client).await.clone();
    match state {
        SubmissionState::Success(resource) => {
            let out = output_path(args.out.as_deref(), form.title());
            let written = form
                .resources()
                .save_as(&resource, &out)
                .with_context(|| format!("failed to write report to '{}'", out.display()))?;
            println!("Saved report ({written} bytes) to {}", out.display());
            Ok(())
        }
        SubmissionState::Failed { message, .. } => bail!("{message}"),
        other => bail!("unexpected form state after submit: {other:?}"),
    }
}
