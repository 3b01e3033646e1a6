use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use drift_domain::Provider as ProviderKind;
use drift_engine::AnalysisMode;
use drift_hub::DiscoveryRequest;
use drift_provider::DiscoverOptions;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

// ── Health ────────────────────────────────────────────────────────────────────

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn ready(State(state): State<AppState>) -> StatusCode {
    state.hub.hub_cache().len().await;
    StatusCode::OK
}

// ── Discovery ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DiscoveryBody {
    pub provider: ProviderKind,
    pub regions: Vec<String>,
    #[serde(default)]
    pub resource_types: Vec<String>,
}

pub async fn post_discovery(State(state): State<AppState>, Json(body): Json<DiscoveryBody>) -> Result<Json<Value>, ApiError> {
    let request = DiscoveryRequest {
        provider: body.provider,
        regions: body.regions,
        options: DiscoverOptions { resource_types: body.resource_types, ..DiscoverOptions::default() },
    };
    let job_id = state.hub.start_discovery(request).await?;
    Ok(Json(json!({ "job_id": job_id })))
}

pub async fn get_discovery_job(State(state): State<AppState>, Path(job_id): Path<String>) -> Result<Json<Value>, ApiError> {
    let job = state
        .hub
        .jobs()
        .get(&job_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("job '{}' not found", job_id)))?;
    Ok(Json(json!(job)))
}

pub async fn list_discovery_jobs(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.hub.jobs().list().await))
}

// ── Cache ─────────────────────────────────────────────────────────────────────

pub async fn get_cache(State(state): State<AppState>) -> Json<Value> {
    let now = Utc::now();
    let keys = state.hub.global_cache().keys(now).await;
    Json(json!({ "count": keys.len(), "keys": keys }))
}

pub async fn get_cache_key(State(state): State<AppState>, Path(key): Path<String>) -> Result<Json<Value>, ApiError> {
    let value = state
        .hub
        .global_cache()
        .get(&key, Utc::now())
        .await
        .ok_or_else(|| ApiError::not_found(format!("cache key '{}' not found", key)))?;
    Ok(Json(value))
}

pub async fn delete_cache_key(State(state): State<AppState>, Path(key): Path<String>) -> StatusCode {
    state.hub.global_cache().invalidate(&key).await;
    StatusCode::OK
}

// ── Drift Engine ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeBody {
    pub provider: ProviderKind,
    #[serde(default)]
    pub region: Option<String>,
    pub state_path: String,
    #[serde(default = "default_mode")]
    pub mode: AnalysisMode,
}

fn default_mode() -> AnalysisMode {
    AnalysisMode::Smart
}

pub async fn post_drift_analyze(State(state): State<AppState>, Json(body): Json<AnalyzeBody>) -> Result<Json<Value>, ApiError> {
    let state_body = tokio::fs::read_to_string(&body.state_path)
        .await
        .map_err(|e| ApiError::bad_request(format!("failed to read '{}': {}", body.state_path, e)))?;

    let (job_id, perspective) = state.hub.analyze(body.provider, body.region, state_body, body.mode).await?;
    Ok(Json(json!({ "job_id": job_id, "perspective": perspective })))
}

pub async fn list_drift(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.hub.drift_store().list_all().await))
}

pub async fn get_graph(State(state): State<AppState>) -> impl IntoResponse {
    match state.hub.last_graph().await {
        Some((nodes, edges)) => Json(json!({ "nodes": nodes, "edges": edges })).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
