use std::path::Path;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use cheque_core::ChequeRecord;
use cheque_ocr::{is_supported_image, ChequePipeline, OcrBackend};
use cheque_storage::{render_csv, ChequeLedger, ChequeStore, StoreError, SubmitOutcome};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub const DOWNLOAD_FILENAME: &str = "cheque_data_output.csv";
pub const DOWNLOAD_MIME: &str = "text/csv";

const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

pub type SharedLedger = Mutex<ChequeLedger<Box<dyn ChequeStore>>>;

pub struct AppState<R: OcrBackend> {
    pub pipeline: ChequePipeline<R>,
    /// Single writer: every read-check-append on the table goes through this lock.
    pub ledger: SharedLedger,
}

impl<R: OcrBackend + 'static> AppState<R> {
    pub fn new(pipeline: ChequePipeline<R>, ledger: ChequeLedger<Box<dyn ChequeStore>>) -> Self {
        Self { pipeline, ledger: Mutex::new(ledger) }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(e: impl std::fmt::Display) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: e.to_string() }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::error!("Cheque table error: {e}");
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: e.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub added: Vec<ChequeRecord>,
    pub warnings: Vec<String>,
    pub table: Vec<ChequeRecord>,
}

pub fn router<R: OcrBackend + 'static>(state: Arc<AppState<R>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/cheques", get(list_cheques::<R>).post(upload_cheques::<R>))
        .route("/api/cheques/download", get(download::<R>))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn list_cheques<R: OcrBackend + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<Json<Vec<ChequeRecord>>, ApiError> {
    let rows = state.ledger.lock().await.records()?;
    Ok(Json(rows))
}

/// Accepts one or more image files. Each file is processed on its own: a bad
/// image, an unsupported type or a duplicate becomes a warning and the rest
/// of the upload carries on.
async fn upload_cheques<R: OcrBackend + 'static>(
    State(state): State<Arc<AppState<R>>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut added = Vec::new();
    let mut warnings = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(ApiError::bad_request)? {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if !is_supported_image(Path::new(&name)) {
            warnings.push(format!("Unsupported file type skipped: {name}"));
            continue;
        }
        let data = field.bytes().await.map_err(ApiError::bad_request)?;

        let extraction = match state.pipeline.process_bytes(&name, data.to_vec()).await {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::warn!("Failed to process {name}: {e}");
                warnings.push(format!("Failed to process {name}: {e}"));
                continue;
            }
        };

        match state.ledger.lock().await.submit(&extraction.record)? {
            SubmitOutcome::Appended => added.push(extraction.record),
            SubmitOutcome::Duplicate => warnings.push(format!("Duplicate cheque skipped: {name}")),
        }
    }

    let table = state.ledger.lock().await.records()?;
    Ok(Json(UploadResponse { added, warnings, table }))
}

async fn download<R: OcrBackend + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.ledger.lock().await.records()?;
    let body = render_csv(&rows)?;
    let disposition = format!("attachment; filename=\"{DOWNLOAD_FILENAME}\"");
    Ok((
        [(header::CONTENT_TYPE, DOWNLOAD_MIME.to_string()), (header::CONTENT_DISPOSITION, disposition)],
        body,
    ))
}
