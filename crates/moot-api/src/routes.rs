//! API routes for debate sessions

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ErrorBody, ErrorResponse};
use crate::sanitize::{sanitize_case, sanitize_judge_input};
use crate::state::AppState;
use moot_core::{CaseMetadata, ChaosArgument, DebateSession, PrecedentArgument, Winner};

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub active_sessions: usize,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        active_sessions: state.service().store().len().await,
    })
}

/// Body of `POST /start`. Every field is optional, as is the body itself.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct StartRequest {
    /// Case to argue; a seed case is drawn when absent
    #[serde(default)]
    pub case: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StartResponse {
    pub session_id: Uuid,
    pub case: String,
    /// Party defended by persona A
    pub persona_a_role: String,
    /// Party represented by persona B
    pub persona_b_role: String,
}

#[utoipa::path(
    post,
    path = "/start",
    request_body = StartRequest,
    responses(
        (status = 200, description = "Debate session opened", body = StartResponse),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 422, description = "Case rejected", body = ErrorResponse)
    )
)]
pub async fn start_session(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<StartResponse>> {
    let request: StartRequest = if body.iter().all(u8::is_ascii_whitespace) {
        StartRequest::default()
    } else {
        serde_json::from_slice(&body)?
    };
    let case = sanitize_case(request.case.as_deref())?;

    let started = state.service().start(case.as_deref()).await?;

    Ok(Json(StartResponse {
        session_id: started.session_id,
        case: started.case,
        persona_a_role: started.persona_a_role,
        persona_b_role: started.persona_b_role,
    }))
}

/// Resolve a client-supplied session id. Anything that is not a UUID names
/// no session.
fn parse_session_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::NotFound(format!("Session not found: {}", raw)))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RunRequest {
    /// Id returned by `/start`
    pub session_id: String,
    /// The judge's ruling or remark for this turn
    pub user_message: String,
    /// Exact-match metadata filters for precedent retrieval
    #[serde(default)]
    pub filters: Option<HashMap<String, String>>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RunResponse {
    pub persona_a_output: Option<PrecedentArgument>,
    pub persona_b_output: Option<ChaosArgument>,
    pub retrieved_context: String,
    pub is_finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
}

#[utoipa::path(
    post,
    path = "/run",
    request_body = RunRequest,
    responses(
        (status = 200, description = "Turn completed", body = RunResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse),
        (status = 503, description = "Persona generation failed", body = ErrorResponse)
    )
)]
pub async fn run_turn(
    State(state): State<AppState>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> ApiResult<Json<RunResponse>> {
    let Json(request) = payload?;
    let session_id = parse_session_id(&request.session_id)?;
    let judge_input = sanitize_judge_input(&request.user_message)?;
    let filters = request.filters.unwrap_or_default();

    let outcome = state
        .service()
        .run_turn(session_id, &judge_input, &filters)
        .await?;

    Ok(Json(RunResponse {
        persona_a_output: outcome.persona_a_output,
        persona_b_output: outcome.persona_b_output,
        retrieved_context: outcome.retrieved_context,
        is_finished: outcome.is_finished,
        winner: outcome.winner,
    }))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(
        ("id" = String, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Last committed session state", body = DebateSession),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DebateSession>> {
    let id = parse_session_id(&id)?;
    Ok(Json(state.service().session(id).await?))
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    params(
        ("id" = String, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session closed, final state returned", body = DebateSession),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DebateSession>> {
    let id = parse_session_id(&id)?;
    Ok(Json(state.service().close(id).await?))
}

#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Prometheus formatted metrics", body = String)
    )
)]
pub async fn get_prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let active = state.service().store().len().await as u64;
    let snapshot = state.metrics().snapshot().with_active_sessions(active);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        snapshot.to_prometheus(),
    )
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Moot debate API"),
    paths(
        health,
        start_session,
        run_turn,
        get_session,
        close_session,
        get_prometheus_metrics
    ),
    components(schemas(
        HealthResponse,
        StartRequest,
        StartResponse,
        RunRequest,
        RunResponse,
        ErrorResponse,
        ErrorBody,
        PrecedentArgument,
        ChaosArgument,
        CaseMetadata,
        Winner,
        DebateSession,
    ))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the API router
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/health", get(health))
        .route("/start", post(start_session))
        .route("/run", post(run_turn))
        .route("/sessions/{id}", get(get_session).delete(close_session))
        .route("/metrics", get(get_prometheus_metrics))
        .fallback(|| async { ApiError::NotFound("No such route".to_string()) })
        .with_state(state)
}
