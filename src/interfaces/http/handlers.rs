//! HTTP Request Handlers
//!
//! Every handler decodes and validates its input completely before touching
//! the repository, so rejected requests have no side effects.

use crate::domain::errors::RepositoryError;
use crate::domain::protocol::{self, Signer, WireMetric, path};
use crate::domain::repositories::MetricRepository;
use crate::domain::types::MetricRecord;
use crate::interfaces::http::error::ApiError;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Html;
use serde_json::{Value, json};
use std::fmt::Write;
use std::sync::Arc;
use tracing::debug;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn MetricRepository>,
    pub signer: Signer,
}

impl AppState {
    pub fn new(repository: Arc<dyn MetricRepository>, signer: Signer) -> Self {
        Self { repository, signer }
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// GET / - HTML listing of every metric, sorted by name
pub async fn index(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let metrics = state.repository.find_all().await?;

    let mut page = String::from(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>Metrics</title>\n</head>\n<body>\n<pre>\n",
    );
    for (name, record) in &metrics {
        let _ = writeln!(page, "{} = {}", escape_html(name), record.value());
    }
    page.push_str("</pre>\n</body>\n</html>\n");

    Ok(Html(page))
}

/// GET /ping - backend liveness
pub async fn ping(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.repository.ping().await?;
    Ok(Json(json!({})))
}

/// POST /update/{kind}/{name}/{value}
pub async fn update_plain(
    State(state): State<AppState>,
    Path((kind, name, raw)): Path<(String, String, String)>,
) -> ApiResult<()> {
    let update = path::parse_update(&kind, &name, &raw)?;
    state.repository.save(&update.name, update.value).await?;

    debug!("Updated {} ({})", update.name, update.value.kind());
    Ok(())
}

/// POST /update - one JSON object, optionally signed
pub async fn update_json(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let update = protocol::decode_one(&body)?.authenticate(&state.signer)?;
    state.repository.save(&update.name, update.value).await?;

    debug!("Updated {} ({})", update.name, update.value.kind());
    Ok(Json(json!({})))
}

/// POST /updates - JSON array applied as one atomic batch
pub async fn update_batch(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let metrics = protocol::decode_batch(&body)?;
    let updates = protocol::authenticate_batch(&metrics, &state.signer)?;
    state.repository.save_all(&updates).await?;

    debug!("Applied batch of {} updates", updates.len());
    Ok(Json(json!({})))
}

/// POST /value - JSON query `{"id": ..., "type": ...}`; signed when a key is set
pub async fn value_json(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<WireMetric>> {
    let query = protocol::decode_one(&body)?;
    let record = find_matching(&state, &query.id, &query.kind).await?;

    Ok(Json(WireMetric::from_record(
        &query.id,
        &record,
        &state.signer,
    )))
}

/// GET /value/{kind}/{name} - plain text magnitude
pub async fn value_plain(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
) -> ApiResult<String> {
    let record = find_matching(&state, &name, &kind).await?;
    Ok(record.value().to_string())
}

async fn find_matching(
    state: &AppState,
    name: &str,
    kind: &str,
) -> ApiResult<MetricRecord> {
    match state.repository.find_by_name(name).await {
        Ok(record) if record.kind.as_str() == kind => Ok(record),
        Ok(_) | Err(RepositoryError::NotFound(_)) => Err(ApiError::MetricNotFound),
        Err(e) => Err(e.into()),
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
