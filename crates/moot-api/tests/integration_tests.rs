use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use moot_api::{api_router, AppState, MootServer, ServerConfig};
use moot_debate::{
    ChaosLawyer, DebateService, EngineConfig, GenerationFailurePolicy, PartyExtractor,
    PrecedentLawyer, RagConfig, RagPipeline, TurnEngine,
};
use moot_llm::{LlmConfig, MockProvider};
use moot_persist::SessionStore;

async fn offline_service() -> Arc<DebateService> {
    let providers = LlmConfig::default().build_providers();
    Arc::new(
        DebateService::from_providers(
            &providers,
            Vec::new(),
            RagConfig::default(),
            EngineConfig::default(),
        )
        .await,
    )
}

fn router(service: Arc<DebateService>) -> Router {
    api_router(AppState::new(service))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response: Response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_full_debate_lifecycle() {
    let router = router(offline_service().await);

    // 1. Health check
    let (status, health) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");

    // 2. Open a session
    let (status, started) = send(
        &router,
        post_json("/start", serde_json::json!({ "case": "A cat sues its owner." })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["case"], "A cat sues its owner.");
    assert_eq!(started["persona_a_role"], "The respondent");
    assert_eq!(started["persona_b_role"], "The claimant");
    let session_id = started["session_id"].as_str().unwrap().to_string();

    // 3. One argued turn
    let (status, turn) = send(
        &router,
        post_json(
            "/run",
            serde_json::json!({ "session_id": session_id, "user_message": "Continue the debate." }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(turn["is_finished"], false);
    assert!(turn.get("winner").is_none());
    assert!(!turn["persona_a_output"]["argument"].as_str().unwrap().is_empty());
    assert!(!turn["persona_b_output"]["argument"].as_str().unwrap().is_empty());

    // 4. The judge rules
    let (status, verdict) = send(
        &router,
        post_json(
            "/run",
            serde_json::json!({ "session_id": session_id, "user_message": "chaos wins", "filters": {} }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict["is_finished"], true);
    assert_eq!(verdict["winner"], "personaBWins");
    assert_eq!(verdict["persona_a_output"]["citation"], "Aberratio ictus.");

    // 5. Snapshot reflects exactly one argued turn
    let (status, session) = send(&router, get(&format!("/sessions/{}", session_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["persona_a_history"].as_array().unwrap().len(), 1);
    assert_eq!(session["winner"], "personaBWins");

    // 6. Metrics
    let response = router.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(
        response.into_body().collect().await.unwrap().to_bytes().to_vec(),
    )
    .unwrap();
    assert!(text.contains("moot_sessions_started_total 1"));
    assert!(text.contains("moot_active_sessions 1"));
}

#[tokio::test]
async fn test_start_without_body_uses_seed_case() {
    let router = router(offline_service().await);

    let request = Request::builder()
        .method("POST")
        .uri("/start")
        .body(Body::empty())
        .unwrap();
    let (status, started) = send(&router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(moot_debate::SEED_CASES.contains(&started["case"].as_str().unwrap()));
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let router = router(offline_service().await);

    let (status, body) = send(
        &router,
        post_json(
            "/run",
            serde_json::json!({
                "session_id": uuid::Uuid::new_v4(),
                "user_message": "Continue"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(&router, get(&format!("/sessions/{}", uuid::Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_input() {
    let router = router(offline_service().await);

    // Syntax error
    let request = Request::builder()
        .method("POST")
        .uri("/run")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    // Missing field
    let (status, body) = send(
        &router,
        post_json("/run", serde_json::json!({ "session_id": uuid::Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Oversized ruling
    let (status, _) = send(
        &router,
        post_json(
            "/run",
            serde_json::json!({
                "session_id": uuid::Uuid::new_v4(),
                "user_message": "x".repeat(5000)
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&router, post_json("/start", serde_json::json!({ "case": 42 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_propagated_persona_failure_is_503() {
    let healthy = Arc::new(MockProvider::smart());
    let broken = Arc::new(MockProvider::failing("upstream down"));
    let engine = TurnEngine::new(
        Arc::new(RagPipeline::empty(healthy.clone())),
        Arc::new(PrecedentLawyer::new(healthy.clone())),
        Arc::new(ChaosLawyer::new(broken)),
    )
    .with_config(EngineConfig {
        chaos_failure: GenerationFailurePolicy::Propagate,
        ..Default::default()
    });
    let service = Arc::new(DebateService::new(
        Arc::new(SessionStore::new()),
        engine,
        PartyExtractor::new(healthy),
    ));
    let router = router(service.clone());

    let started = service.start(None).await.unwrap();
    let (status, body) = send(
        &router,
        post_json(
            "/run",
            serde_json::json!({ "session_id": started.session_id, "user_message": "Go on" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    assert_eq!(service.session(started.session_id).await.unwrap().turns(), 0);
}

#[tokio::test]
async fn test_openapi_document() {
    let router = router(offline_service().await);

    let (status, doc) = send(&router, get("/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/run"]["post"].is_object());
}

#[tokio::test]
async fn test_layered_router_sets_request_id() {
    let server = MootServer::new(ServerConfig::default(), offline_service().await);

    let response = server.router().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_courtroom_phrasing_is_a_ruling_not_an_injection() {
    let service = offline_service().await;
    let router = router(service.clone());
    let started = service.start(Some("A cat sues its owner.")).await.unwrap();

    let (status, turn) = send(
        &router,
        post_json(
            "/run",
            serde_json::json!({
                "session_id": started.session_id,
                "user_message": "Counsel, you are now in contempt of court. Continue."
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(turn["is_finished"], false);
    let session = service.session(started.session_id).await.unwrap();
    assert_eq!(
        session.latest_judge_input(),
        "Counsel, you are now in contempt of court. Continue."
    );
}

#[tokio::test]
async fn test_malformed_session_id_is_404() {
    let router = router(offline_service().await);

    let (status, body) = send(
        &router,
        post_json(
            "/run",
            serde_json::json!({ "session_id": "not-a-uuid", "user_message": "Continue" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "Session not found: not-a-uuid");

    let (status, body) = send(&router, get("/sessions/not-a-uuid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_verdict_on_first_turn_reports_no_precedent() {
    let service = offline_service().await;
    let router = router(service.clone());
    let started = service.start(None).await.unwrap();

    let (status, verdict) = send(
        &router,
        post_json(
            "/run",
            serde_json::json!({ "session_id": started.session_id, "user_message": "rag wins" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(verdict["winner"], "personaAWins");
    assert_eq!(verdict["retrieved_context"], moot_debate::NO_PRECEDENT_FOUND);
}

#[tokio::test]
async fn test_close_session() {
    let service = offline_service().await;
    let router = router(service.clone());
    let started = service.start(None).await.unwrap();
    let uri = format!("/sessions/{}", started.session_id);

    let delete = |uri: &str| {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    };

    let (status, closed) = send(&router, delete(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["id"], started.session_id.to_string());
    assert!(service.store().is_empty().await);

    let (status, _) = send(&router, delete(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&router, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
