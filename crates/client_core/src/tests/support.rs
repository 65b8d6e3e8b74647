//! Stand-in analysis backends shared by the unit tests.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use shared::{
    domain::{CsvFile, SubmissionInput},
    error::AnalyzeError,
    protocol::{ErrorBodySchema, FormFields, DEFAULT_ANALYZE_PATH},
};
use tokio::net::TcpListener;
use url::Url;

use crate::{
    cancel::CancelToken,
    transport::{AnalyzeTransport, HttpAnalyzeClient, PdfDocument},
};

pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n%%EOF\n";

pub fn ten_row_csv() -> CsvFile {
    let mut body = String::from("date,calls,sales\n");
    for day in 1..=10 {
        body.push_str(&format!("2024-01-{day:02},{},{}\n", day * 3, day * 100));
    }
    CsvFile::new("q1.csv", body.into_bytes())
}

pub fn pdf_document() -> PdfDocument {
    PdfDocument {
        bytes: PDF_BYTES.to_vec(),
        content_type: Some("application/pdf".to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct ReceivedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

pub type ReceivedUploads = Arc<Mutex<Vec<Vec<ReceivedPart>>>>;

#[derive(Clone)]
pub enum Reply {
    Pdf,
    Status(StatusCode, &'static str),
    /// 2xx with an explicit content type instead of `application/pdf`.
    Typed(StatusCode, &'static str, &'static str),
    Hang,
}

#[derive(Clone)]
struct BackendState {
    uploads: ReceivedUploads,
    reply: Reply,
}

async fn handle_analyze(State(state): State<BackendState>, mut multipart: Multipart) -> Response {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        parts.push(ReceivedPart {
            name,
            file_name,
            content_type,
            data,
        });
    }
    state.uploads.lock().expect("uploads lock").push(parts);

    match state.reply {
        Reply::Pdf => ([(header::CONTENT_TYPE, "application/pdf")], PDF_BYTES).into_response(),
        Reply::Status(status, body) => (status, body).into_response(),
        Reply::Typed(status, content_type, body) => {
            (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            StatusCode::OK.into_response()
        }
    }
}

/// Serves `POST /api/analyze` on an ephemeral port and returns its URL.
pub async fn spawn_backend(reply: Reply) -> (Url, ReceivedUploads) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let uploads: ReceivedUploads = Arc::new(Mutex::new(Vec::new()));
    let state = BackendState {
        uploads: uploads.clone(),
        reply,
    };
    let app = Router::new()
        .route(DEFAULT_ANALYZE_PATH, post(handle_analyze))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    let url = Url::parse(&format!("http://{addr}{DEFAULT_ANALYZE_PATH}")).expect("url");
    (url, uploads)
}

/// An endpoint on a port nothing listens on.
pub async fn unreachable_endpoint() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    Url::parse(&format!("http://{addr}{DEFAULT_ANALYZE_PATH}")).expect("url")
}

/// HTTP client for the loopback backends; ignores any proxy set in the environment.
pub fn loopback_client(endpoint: Url, fields: FormFields) -> HttpAnalyzeClient {
    let http = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("loopback http client");
    HttpAnalyzeClient::with_http(http, endpoint, fields, ErrorBodySchema::default())
}

/// In-memory transport returning a fixed reply and recording every call.
pub struct FakeTransport {
    reply: Result<PdfDocument, AnalyzeError>,
    calls: AtomicUsize,
    inputs: Mutex<Vec<SubmissionInput>>,
}

impl FakeTransport {
    pub fn replying(reply: Result<PdfDocument, AnalyzeError>) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn pdf() -> Self {
        Self::replying(Ok(pdf_document()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<SubmissionInput> {
        self.inputs.lock().expect("inputs lock").clone()
    }
}

#[async_trait]
impl AnalyzeTransport for FakeTransport {
    async fn analyze(
        &self,
        input: &SubmissionInput,
        _cancel: &CancelToken,
    ) -> Result<PdfDocument, AnalyzeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().expect("inputs lock").push(input.clone());
        self.reply.clone()
    }
}
