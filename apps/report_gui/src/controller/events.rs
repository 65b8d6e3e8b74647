//! Backend-to-UI events and error labelling for the report form.

use client_core::PdfDocument;
use shared::{
    domain::AttemptId,
    error::{AnalyzeError, ErrorKind},
};

pub enum UiEvent {
    Info(String),
    WorkerFailed(String),
    AnalyzeFinished {
        attempt: AttemptId,
        outcome: Result<PdfDocument, AnalyzeError>,
    },
}

pub fn err_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "Missing input",
        ErrorKind::Server => "Analysis failed",
        ErrorKind::Network => "Connection problem",
        ErrorKind::Cancelled => "Cancelled",
        ErrorKind::Resource => "Local storage",
    }
}

pub fn human_readable_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        return format!("{bytes} B");
    }
    if bytes < MB {
        return format_scaled_unit(bytes, KB, "KB");
    }
    if bytes < GB {
        return format_scaled_unit(bytes, MB, "MB");
    }
    format_scaled_unit(bytes, GB, "GB")
}

fn format_scaled_unit(bytes: u64, unit_size: u64, unit_label: &str) -> String {
    let value = bytes as f64 / unit_size as f64;
    let value_text = format!("{value:.1}");
    let compact_value = value_text.strip_suffix(".0").unwrap_or(&value_text);
    format!("{compact_value} {unit_label}")
}
