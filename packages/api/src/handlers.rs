use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use lignage_extractor::{
    extract_and_score, generate_gedcom, highlight_html, validate_html_payload, ExtractorError,
    Extraction,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::state::AppState;
use crate::store::{RecordSummary, StoredRecord};

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error response: a status code and a JSON message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn not_found(id: Uuid) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("Record not found: {id}"),
        }
    }
}

impl From<ExtractorError> for ApiError {
    fn from(e: ExtractorError) -> Self {
        let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %e, "request failed");
        }
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

#[derive(Deserialize)]
pub struct ExtractQuery {
    pub source_url: Option<String>,
}

pub async fn health() -> &'static str {
    "OK"
}

/// Validate the raw body and run the extractor off the async workers.
async fn run_extraction(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
    source_url: Option<String>,
) -> Result<Extraction, ApiError> {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let html = validate_html_payload(body, content_type, state.config.max_payload_bytes)?.to_string();

    let mut options = (*state.options).clone();
    if source_url.is_some() {
        options.source_url = source_url;
    }

    tokio::task::spawn_blocking(move || extract_and_score(&html, &options))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "extraction task failed");
            ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Extraction failed".to_string(),
            }
        })
}

pub async fn extract(
    State(state): State<AppState>,
    Query(query): Query<ExtractQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Extraction>, ApiError> {
    let extraction = run_extraction(&state, &headers, &body, query.source_url).await?;
    Ok(Json(extraction))
}

pub async fn create_record(
    State(state): State<AppState>,
    Query(query): Query<ExtractQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<StoredRecord>), ApiError> {
    let extraction = run_extraction(&state, &headers, &body, query.source_url).await?;
    let stored = state.store.insert(extraction).await;
    tracing::info!(id = %stored.id, strategy = ?stored.extraction.record.strategy, "record created");
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn list_records(State(state): State<AppState>) -> Json<Vec<RecordSummary>> {
    Json(state.store.list().await)
}

pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoredRecord>, ApiError> {
    state
        .store
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(id))
}

pub async fn patch_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<Json<StoredRecord>, ApiError> {
    let updated = state
        .store
        .update(id, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found(id))?;
    tracing::info!(%id, fields = patch.len(), "record updated");
    Ok(Json(updated))
}

pub async fn highlight_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, ApiError> {
    let stored = state.store.get(id).await.ok_or_else(|| ApiError::not_found(id))?;
    let record = &stored.extraction.record;
    Ok(Html(highlight_html(&record.source_html, record.provenance.spans())))
}

pub async fn gedcom_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let stored = state.store.get(id).await.ok_or_else(|| ApiError::not_found(id))?;
    let gedcom = generate_gedcom(&stored.extraction.record);
    Ok((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{id}.ged\"")),
        ],
        gedcom,
    )
        .into_response())
}
