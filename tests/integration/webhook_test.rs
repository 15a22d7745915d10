// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{spawn_site, InMemoryStore};
use adscan::domain::models::scan_job::ScanJob;
use adscan::domain::models::score::ScoreCard;
use adscan::domain::models::webhook::{ScanEvent, WebhookPayload, WebhookSubscription};
use adscan::domain::services::notification_service::ScanNotifier;
use adscan::domain::services::webhook_service::WebhookService;
use adscan::infrastructure::services::webhook_service_impl::{
    sign, WebhookServiceImpl, EVENT_HEADER, SIGNATURE_HEADER,
};
use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn card(score: u8) -> ScoreCard {
    ScoreCard {
        overall_score: score,
        approval_probability: score.min(90),
        checklist: Vec::new(),
        confidence: 1.0,
        unavailable_signals: Vec::new(),
    }
}

#[tokio::test]
async fn test_signature_covers_raw_body() {
    let captured: Arc<Mutex<Vec<(HeaderMap, Bytes)>>> = Arc::default();
    let sink = captured.clone();
    let receiver = spawn_site(Router::new().route(
        "/hook",
        post(move |headers: HeaderMap, body: Bytes| {
            sink.lock().unwrap().push((headers, body));
            std::future::ready(StatusCode::NO_CONTENT)
        }),
    ))
    .await;

    let subscription = WebhookSubscription {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        url: format!("{}/hook", receiver),
        secret: "whsec_test".to_string(),
        events: vec!["scan.completed".to_string()],
        is_active: true,
    };
    let payload = WebhookPayload {
        event: ScanEvent::ScanCompleted,
        scan_id: Uuid::new_v4(),
        site_id: Uuid::new_v4(),
        status: "completed".to_string(),
        overall_score: Some(72),
        approval_probability: Some(64),
    };

    let outcome = WebhookServiceImpl::new()
        .send_webhook(&subscription, &payload)
        .await;
    assert!(outcome.success, "{:?}", outcome.error);

    let captured = captured.lock().unwrap();
    assert_eq!(captured.len(), 1);
    let (headers, body) = &captured[0];
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert_eq!(signature, sign("whsec_test", body));
    assert_eq!(
        headers.get(EVENT_HEADER).and_then(|v| v.to_str().ok()),
        Some("scan.completed")
    );

    let received: WebhookPayload = serde_json::from_slice(body).unwrap();
    assert_eq!(received, payload);
}

#[tokio::test]
async fn test_destinations_fail_independently() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock)
        .await;

    let store = Arc::new(InMemoryStore::new());
    let user_id = Uuid::new_v4();
    let broken = format!("{}/broken", mock.uri());
    let ok = format!("{}/ok", mock.uri());
    store.add_webhook(user_id, &broken, "s1", &["scan.completed"]);
    store.add_webhook(user_id, &ok, "s2", &["scan.completed", "scan.failed"]);
    // Not subscribed to completions
    store.add_webhook(user_id, &ok, "s3", &["scan.failed"]);

    let notifier = ScanNotifier::new(
        store.clone(),
        store.clone(),
        Arc::new(WebhookServiceImpl::new()),
    );
    let job = ScanJob::new(Uuid::new_v4(), Uuid::new_v4(), Some(user_id))
        .start()
        .and_then(ScanJob::complete)
        .unwrap();

    let outcomes = notifier.scan_completed(&job, "garden.example", &card(81)).await;
    assert_eq!(outcomes.len(), 2);
    let failed = outcomes.iter().find(|o| o.url == broken).unwrap();
    assert!(!failed.success);
    assert!(failed.error.as_deref().unwrap().contains("500"));
    assert!(outcomes.iter().find(|o| o.url == ok).unwrap().success);

    let notifications = store.notifications.lock().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, "scan_completed");
    assert!(notifications[0].message.contains("81/100"));
}

#[tokio::test]
async fn test_anonymous_scan_sends_nothing() {
    let store = Arc::new(InMemoryStore::new());
    let notifier = ScanNotifier::new(
        store.clone(),
        store.clone(),
        Arc::new(WebhookServiceImpl::new()),
    );
    let job = ScanJob::new(Uuid::new_v4(), Uuid::new_v4(), None);

    let outcomes = notifier.scan_failed(&job, "garden.example").await;
    assert!(outcomes.is_empty());
    assert!(store.notifications.lock().unwrap().is_empty());
}
