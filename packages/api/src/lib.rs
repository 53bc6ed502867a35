//! Lignage API - HTTP service around the extractor.
//!
//! Routes:
//! - `GET /health`
//! - `POST /api/extract`: extract and score without storing
//! - `POST /api/records`, `GET /api/records`
//! - `GET /api/records/{id}`, `PATCH /api/records/{id}`
//! - `GET /api/records/{id}/highlight`, `GET /api/records/{id}/gedcom`
//!
//! HTML is posted as the raw request body; `?source_url=` overrides the
//! detected source URL.

pub mod config;
pub mod handlers;
pub mod state;
pub mod store;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::ApiConfig;
pub use state::AppState;
pub use store::{RecordEvent, RecordStore, RecordSummary, StoredRecord};

/// Build the router over `state`.
pub fn app(state: AppState) -> Router {
    // One byte over the cap still reaches the validator, which answers 413.
    let body_limit = state.config.max_payload_bytes.saturating_add(1);

    let api_routes = Router::new()
        .route("/api/extract", post(handlers::extract))
        .route(
            "/api/records",
            post(handlers::create_record).get(handlers::list_records),
        )
        .route(
            "/api/records/{id}",
            get(handlers::get_record).patch(handlers::patch_record),
        )
        .route("/api/records/{id}/highlight", get(handlers::highlight_record))
        .route("/api/records/{id}/gedcom", get(handlers::gedcom_record))
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
