use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use mxtcatalog::{
    CatalogState, CatalogStore, FetchError, Resource, ResourceSource, WebhookPolicy,
    WebhookVerifier, create_router,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const SECRET: &str = "webhook-secret";

/// Source scriptée : renvoie les réponses dans l'ordre puis une liste vide
struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Vec<Resource>, FetchError>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn new(responses: Vec<Result<Vec<Resource>, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceSource for ScriptedSource {
    async fn fetch_resources(&self) -> Result<Vec<Resource>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

fn resource(public_id: &str) -> Resource {
    Resource {
        asset_id: format!("asset-{}", public_id.len()),
        public_id: public_id.to_string(),
        format: "mp3".to_string(),
        delivery_type: "upload".to_string(),
    }
}

fn three_tracks() -> Vec<Resource> {
    vec![
        resource("my-music/mixes/summer_mix_2024"),
        resource("my-music/beats/lofi-01"),
        resource("my-music/first_song"),
    ]
}

fn setup(source: Arc<ScriptedSource>, policy: WebhookPolicy) -> (Router, Arc<CatalogStore>) {
    let store = Arc::new(CatalogStore::new(source));
    let state = CatalogState::new(store.clone(), WebhookVerifier::new(SECRET, 0), policy);
    (create_router(state), store)
}

fn signed_webhook(body: &str) -> Request<Body> {
    let timestamp = "1700000000";
    let signature = WebhookVerifier::new(SECRET, 0).sign(body.as_bytes(), timestamp);
    Request::post("/api/webhook")
        .header("content-type", "application/json")
        .header("x-cld-timestamp", timestamp)
        .header("x-cld-signature", signature)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

fn get(path: &str) -> Request<Body> {
    Request::get(path).body(Body::empty()).unwrap()
}

const UPLOAD: &str = r#"{"notification_type":"upload","public_id":"my-music/first_song","resource_type":"video","type":"upload"}"#;

#[tokio::test]
async fn test_tracks_empty_before_first_refresh() {
    let (router, _) = setup(ScriptedSource::new(vec![]), WebhookPolicy::Any);

    let (status, json) = send(&router, get("/api/tracks")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({"resources": []}));
}

#[tokio::test]
async fn test_tracks_never_trigger_a_fetch() {
    let source = ScriptedSource::new(vec![Ok(three_tracks())]);
    let (router, _) = setup(source.clone(), WebhookPolicy::Any);

    for _ in 0..3 {
        send(&router, get("/api/tracks")).await;
    }
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_wrong_methods_are_rejected() {
    let (router, _) = setup(ScriptedSource::new(vec![]), WebhookPolicy::Any);

    let (status, _) = send(
        &router,
        Request::post("/api/tracks").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = send(&router, get("/api/webhook")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = send(
        &router,
        Request::builder()
            .method(Method::DELETE)
            .uri("/api/webhook")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_webhook_refreshes_and_serves_new_snapshot() {
    let source = ScriptedSource::new(vec![Ok(three_tracks())]);
    let (router, store) = setup(source.clone(), WebhookPolicy::Any);

    let (status, json) = send(&router, signed_webhook(UPLOAD)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["refreshed"], true);
    assert_eq!(json["cached_tracks"], 3);
    assert_eq!(source.calls(), 1);
    assert!(store.last_refresh().is_some());

    let (_, tracks) = send(&router, get("/api/tracks")).await;
    let resources = tracks["resources"].as_array().unwrap();
    assert_eq!(resources.len(), 3);
    assert_eq!(resources[0]["public_id"], "my-music/mixes/summer_mix_2024");
    assert_eq!(resources[0]["type"], "upload");
}

#[tokio::test]
async fn test_webhook_without_headers_is_bad_request() {
    let source = ScriptedSource::new(vec![]);
    let (router, _) = setup(source.clone(), WebhookPolicy::Any);

    let (status, json) = send(
        &router,
        Request::post("/api/webhook")
            .body(Body::from(UPLOAD))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "missing_header");
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_webhook_with_bad_signature_is_unauthorized() {
    let source = ScriptedSource::new(vec![]);
    let (router, _) = setup(source.clone(), WebhookPolicy::Any);

    let (status, json) = send(
        &router,
        Request::post("/api/webhook")
            .header("x-cld-timestamp", "1700000000")
            .header("x-cld-signature", "0000000000000000000000000000000000000000")
            .body(Body::from(UPLOAD))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "invalid_signature");
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_webhook_with_malformed_body_is_bad_request() {
    let source = ScriptedSource::new(vec![]);
    let (router, _) = setup(source.clone(), WebhookPolicy::Any);

    for body in ["not json", "[1, 2, 3]", "{}"] {
        let (status, json) = send(&router, signed_webhook(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", body);
        assert_eq!(json["error"], "malformed_body");
    }
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_filtered_policy_skips_irrelevant_notifications() {
    let source = ScriptedSource::new(vec![Ok(three_tracks())]);
    let policy = WebhookPolicy::Filtered {
        notification_types: vec!["upload".to_string()],
    };
    let (router, _) = setup(source.clone(), policy);

    let (status, json) = send(
        &router,
        signed_webhook(r#"{"notification_type":"eager","resource_type":"video"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["refreshed"], false);
    assert_eq!(json["cached_tracks"], 0);
    assert_eq!(source.calls(), 0);

    let (_, json) = send(&router, signed_webhook(UPLOAD)).await;
    assert_eq!(json["refreshed"], true);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let source = ScriptedSource::new(vec![
        Ok(three_tracks()),
        Err(FetchError::Status(503)),
    ]);
    let (router, store) = setup(source.clone(), WebhookPolicy::Any);

    store.refresh().await.unwrap();
    let (_, before) = send(&router, get("/api/tracks")).await;
    let refreshed_at = store.last_refresh();

    let (status, json) = send(&router, signed_webhook(UPLOAD)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "refresh_failed");

    let (_, after) = send(&router, get("/api/tracks")).await;
    assert_eq!(before, after);
    assert_eq!(store.last_refresh(), refreshed_at);
}

#[tokio::test]
async fn test_health_reports_cache_state() {
    let source = ScriptedSource::new(vec![Ok(three_tracks())]);
    let (router, store) = setup(source, WebhookPolicy::Any);

    let (status, json) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["last_fetch"], Value::Null);
    assert_eq!(json["cached_tracks"], 0);

    store.refresh().await.unwrap();

    let (_, json) = send(&router, get("/health")).await;
    assert_eq!(json["cached_tracks"], 3);
    assert!(json["last_fetch"].is_string());
}
