//! HTTP API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::delegation::{DelegateRequest, DelegationReceipt};
use crate::discovery::{DiscoveryRequest, DiscoveryResult};
use crate::error::Result;
use crate::models::{AgentDescriptor, CallbackPayload, DelegationRecord, RegisterAgentRequest};
use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/agents", get(list_agents).post(register_agent))
        .route("/agents/:name", get(get_agent).delete(delete_agent))
        .route("/agents/:name/heartbeat", post(heartbeat))
        .route("/discover", post(discover))
        .route("/delegate", post(delegate))
        .route("/delegations", get(list_delegations))
        .route("/delegations/:id", get(get_delegation))
        .route("/delegations/:id/callback", post(delegation_callback))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn list_agents(State(state): State<Arc<AppState>>) -> Result<Json<Vec<AgentDescriptor>>> {
    Ok(Json(state.store.list_agents().await?))
}

async fn register_agent(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterAgentRequest>,
) -> Result<(StatusCode, Json<AgentDescriptor>)> {
    let agent = state.store.upsert_agent(request).await?;
    Ok((StatusCode::CREATED, Json(agent)))
}

async fn get_agent(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<AgentDescriptor>> {
    Ok(Json(state.store.get_agent(&name).await?))
}

async fn delete_agent(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode> {
    state.store.delete_agent(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn heartbeat(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<AgentDescriptor>> {
    Ok(Json(state.store.heartbeat(&name).await?))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiscoverResponse {
    pub results: Vec<DiscoveryResult>,
}

async fn discover(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DiscoveryRequest>,
) -> Result<Json<DiscoverResponse>> {
    let results = state.discovery.discover(&request).await?;
    Ok(Json(DiscoverResponse { results }))
}

async fn delegate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DelegateRequest>,
) -> Result<Json<DelegationReceipt>> {
    Ok(Json(state.delegator.delegate(request).await?))
}

#[derive(Debug, Deserialize)]
struct DelegationFilter {
    agent: Option<String>,
}

async fn list_delegations(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<DelegationFilter>,
) -> Result<Json<Vec<DelegationRecord>>> {
    Ok(Json(state.store.list_delegations(filter.agent.as_deref()).await?))
}

async fn get_delegation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DelegationRecord>> {
    Ok(Json(state.store.get_delegation(id).await?))
}

async fn delegation_callback(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CallbackPayload>,
) -> Result<Json<DelegationRecord>> {
    Ok(Json(state.delegator.complete(id, payload).await?))
}
