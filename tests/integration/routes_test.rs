// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{test_settings, InMemoryStore};
use adscan::domain::repositories::scan_repository::ScanRepository;
use adscan::domain::services::generative_service::{GenerativeService, FALLBACK_LABEL};
use adscan::infrastructure::services::llm_service::LLMService;
use adscan::presentation::routes;
use adscan::workers::scan_worker::ScanTrigger;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::{Extension, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestApp {
    router: Router,
    store: Arc<InMemoryStore>,
    triggers: mpsc::Receiver<Uuid>,
}

fn app_with(mock_base: &str, llm_key: Option<&str>, queue: usize) -> TestApp {
    let mut settings = test_settings(mock_base);
    settings.llm.api_key = llm_key.map(str::to_string);
    let store = Arc::new(InMemoryStore::new());
    let scans: Arc<dyn ScanRepository> = store.clone();
    let generative = GenerativeService::new(Arc::new(LLMService::new(&settings.llm)));
    let (trigger, triggers) = ScanTrigger::channel(queue);

    let router = routes::routes()
        .layer(Extension(scans))
        .layer(Extension(generative))
        .layer(Extension(trigger));
    TestApp {
        router,
        store,
        triggers,
    }
}

async fn send(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health_check() {
    let app = app_with("http://127.0.0.1:9", None, 4);
    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_scan_trigger_enqueues_existing_scan() {
    let mut app = app_with("http://127.0.0.1:9", None, 4);
    let job = app.store.seed_job(Some("https://garden.example"), None);

    let (status, body) = send(
        &app.router,
        "/scan",
        json!({"id": job.id, "site_id": job.site_id}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["scan_id"], json!(job.id));
    assert_eq!(app.triggers.try_recv().ok(), Some(job.id));
}

#[tokio::test]
async fn test_scan_trigger_rejects_unknown_or_mismatched_scan() {
    let mut app = app_with("http://127.0.0.1:9", None, 4);
    let job = app.store.seed_job(Some("https://garden.example"), None);

    let (status, body) = send(
        &app.router,
        "/scan",
        json!({"id": Uuid::new_v4(), "site_id": job.site_id}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app.router,
        "/scan",
        json!({"id": job.id, "site_id": Uuid::new_v4()}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app.router, "/scan", json!({"id": "not-a-uuid"})).await;
    assert!(status.is_client_error());
    assert!(app.triggers.try_recv().is_err());
}

#[tokio::test]
async fn test_scan_trigger_reports_full_queue() {
    let app = app_with("http://127.0.0.1:9", None, 1);
    let first = app.store.seed_job(Some("https://a.example"), None);
    let second = app.store.seed_job(Some("https://b.example"), None);

    let (status, _) = send(
        &app.router,
        "/scan",
        json!({"id": first.id, "site_id": first.site_id}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app.router,
        "/scan",
        json!({"id": second.id, "site_id": second.site_id}),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_regenerate_draft_persists_fallback() {
    let app = app_with("http://127.0.0.1:9", None, 4);
    let job = app.store.seed_job(Some("https://garden.example"), None);
    app.store
        .trust_data
        .lock()
        .unwrap()
        .insert(job.id, json!({"summary": {"privacy": false}}));

    let (status, body) = send(
        &app.router,
        "/regenerate-draft",
        json!({"scan_id": job.id, "domain": "garden.example", "page_type": "privacy"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let draft = body["draft"].as_str().unwrap();
    assert!(draft.contains(FALLBACK_LABEL));
    let stored = app.store.trust_data.lock().unwrap()[&job.id].clone();
    assert_eq!(stored["drafts"]["privacy"], json!(draft));
    assert_eq!(stored["summary"]["privacy"], json!(false));
}

#[tokio::test]
async fn test_regenerate_draft_validation() {
    let app = app_with("http://127.0.0.1:9", None, 4);
    let job = app.store.seed_job(None, None);

    let (status, _) = send(
        &app.router,
        "/regenerate-draft",
        json!({"scan_id": Uuid::new_v4(), "domain": "garden.example", "page_type": "about"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app.router,
        "/regenerate-draft",
        json!({"scan_id": job.id, "domain": "garden.example", "page_type": "cookies"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("page_type"));

    let (status, _) = send(
        &app.router,
        "/regenerate-draft",
        json!({"scan_id": job.id, "domain": "", "page_type": "about"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_appeal_falls_back_without_model() {
    let app = app_with("http://127.0.0.1:9", None, 4);
    let (status, body) = send(
        &app.router,
        "/ai/appeal",
        json!({"domain": "garden.example", "violations": ["Thin content"]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    let draft = body["draft"].as_str().unwrap();
    assert!(draft.starts_with(FALLBACK_LABEL));
    assert!(draft.contains("garden.example"));
}

#[tokio::test]
async fn test_monetization_uses_model_output() {
    let mock = MockServer::start().await;
    let suggestions = json!({
        "suggestions": [
            {"title": "Add a seasonal planting guide", "description": "Evergreen content", "priority": "HIGH"}
        ]
    });
    Mock::given(method("POST"))
        .and(path("/llm/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": format!("```json\n{}\n```", suggestions)}}]
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let app = app_with(&mock.uri(), Some("llm-key"), 4);
    let (status, body) = send(
        &app.router,
        "/ai/monetization",
        json!({"domain": "garden.example", "analysis_data": {"overall_score": 64}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let list = body["suggestions"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "Add a seasonal planting guide");
    assert_eq!(list[0]["priority"], "high");
}
