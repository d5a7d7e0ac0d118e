use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sn_core::{Article, DigestEntry, Error};
use sn_ingest::sources::parse_feed;
use sn_ingest::IngestReport;

use crate::error::ApiError;
use crate::AppState;

/// Default number of articles returned by a selection request.
pub const DEFAULT_LIMIT: i64 = 5;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_articles(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Article>> {
    Ok(Json(state.storage.list_articles().await?))
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: IngestReport,
}

/// A JSON feed in the body is ingested directly; an empty body runs every
/// configured feed.
pub async fn ingest(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<IngestResponse> {
    let report = if body.iter().all(u8::is_ascii_whitespace) {
        state.ingest.ingest_all().await?
    } else {
        let text = std::str::from_utf8(&body).map_err(|e| ApiError::BadBody(e.to_string()))?;
        let items = parse_feed(text).map_err(|e| ApiError::BadBody(e.to_string()))?;
        state.ingest.ingest_raw("request", items).await?
    };
    Ok(Json(IngestResponse {
        message: format!("Successfully ingested {} articles", report.stored_count()),
        report,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct SelectParams {
    pub limit: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl SelectParams {
    /// Fields present in `other` win.
    fn merge(self, other: SelectParams) -> SelectParams {
        SelectParams {
            limit: other.limit.or(self.limit),
            start_date: other.start_date.or(self.start_date),
            end_date: other.end_date.or(self.end_date),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WindowBody {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SelectResponse {
    pub message: String,
    pub window: WindowBody,
    pub candidates: usize,
    pub articles: Vec<Article>,
}

/// Parameters come from the query string or a JSON body.
pub async fn select_articles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SelectParams>,
    body: Bytes,
) -> ApiResult<SelectResponse> {
    let params = if body.iter().all(u8::is_ascii_whitespace) {
        query
    } else {
        let from_body: SelectParams =
            serde_json::from_slice(&body).map_err(|e| ApiError::BadBody(e.to_string()))?;
        query.merge(from_body)
    };

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if limit <= 0 {
        return Err(Error::InvalidParameter(format!("limit must be a positive integer, got {}", limit)).into());
    }
    let limit = usize::try_from(limit).map_err(|e| Error::InvalidParameter(e.to_string()))?;

    let selection = {
        let _guard = state.selection_lock.lock().await;
        state
            .selector
            .select(limit, params.start_date.as_deref(), params.end_date.as_deref())
            .await?
    };

    let message = if selection.is_empty() {
        "No articles found in the requested window".to_string()
    } else {
        "Successfully selected top articles".to_string()
    };
    Ok(Json(SelectResponse {
        message,
        window: WindowBody {
            start: selection.window.start(),
            end: selection.window.end(),
        },
        candidates: selection.candidates,
        articles: selection.articles,
    }))
}

pub async fn selected(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Article>> {
    Ok(Json(state.storage.selected_articles().await?))
}

pub async fn digest(State(state): State<Arc<AppState>>) -> ApiResult<Vec<DigestEntry>> {
    let selected = state.storage.selected_articles().await?;
    Ok(Json(selected.iter().map(DigestEntry::from).collect()))
}
