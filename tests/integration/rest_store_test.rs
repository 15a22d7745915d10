// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use adscan::config::settings::DatastoreSettings;
use adscan::domain::models::notification::Notification;
use adscan::domain::models::result_bundle::ResultBundle;
use adscan::domain::models::scan_job::ScanStatus;
use adscan::domain::models::webhook::ScanEvent;
use adscan::domain::repositories::notification_repository::NotificationRepository;
use adscan::domain::repositories::scan_repository::{
    CompletedScan, RepositoryError, ScanRepository,
};
use adscan::domain::repositories::webhook_repository::WebhookRepository;
use adscan::infrastructure::repositories::rest_store::RestStore;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCANS_PATH: &str = "/rest/v1/adsense_scans";

fn store(mock: &MockServer) -> RestStore {
    RestStore::new(&DatastoreSettings {
        url: format!("{}/", mock.uri()),
        service_key: "service-key".to_string(),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetch_pending_sends_credentials_and_filters() {
    let mock = MockServer::start().await;
    let id = Uuid::new_v4();
    let site_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path(SCANS_PATH))
        .and(header("apikey", "service-key"))
        .and(header("authorization", "Bearer service-key"))
        .and(query_param("status", "eq.pending"))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": id, "site_id": site_id, "user_id": null, "status": "pending"}
        ])))
        .expect(1)
        .mount(&mock)
        .await;

    let jobs = store(&mock).fetch_pending(3).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, id);
    assert_eq!(jobs[0].site_id, site_id);
    assert_eq!(jobs[0].status, ScanStatus::Pending);
    assert!(jobs[0].user_id.is_none());
}

#[tokio::test]
async fn test_claim_depends_on_returned_rows() {
    let mock = MockServer::start().await;
    let won = Uuid::new_v4();
    let lost = Uuid::new_v4();
    Mock::given(method("PATCH"))
        .and(path(SCANS_PATH))
        .and(query_param("id", format!("eq.{}", won).as_str()))
        .and(query_param("status", "eq.pending"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({"status": "running"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": won}])))
        .mount(&mock)
        .await;
    Mock::given(method("PATCH"))
        .and(path(SCANS_PATH))
        .and(query_param("id", format!("eq.{}", lost).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock)
        .await;

    let store = store(&mock);
    assert!(store.claim(won).await.unwrap());
    assert!(!store.claim(lost).await.unwrap());
}

#[tokio::test]
async fn test_save_completed_writes_every_group() {
    let mock = MockServer::start().await;
    let id = Uuid::new_v4();
    Mock::given(method("PATCH"))
        .and(path(SCANS_PATH))
        .and(query_param("id", format!("eq.{}", id).as_str()))
        .and(body_partial_json(json!({
            "status": "completed",
            "overall_score": 72,
            "approval_probability": 40
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock)
        .await;

    let scan = CompletedScan {
        overall_score: 72,
        approval_probability: 40,
        bundle: ResultBundle::default(),
        completed_at: Utc::now(),
    };
    store(&mock).save_completed(id, &scan).await.unwrap();

    let requests = mock.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    for column in [
        "core_scan_data",
        "trust_pages_data",
        "seo_indexing_data",
        "security_data",
        "completed_at",
    ] {
        assert!(body.get(column).is_some(), "missing {}", column);
    }
}

#[tokio::test]
async fn test_trust_pages_lookup_distinguishes_missing_rows() {
    let mock = MockServer::start().await;
    let present = Uuid::new_v4();
    let empty = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path(SCANS_PATH))
        .and(query_param("id", format!("eq.{}", present).as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"trust_pages_data": {"drafts": {"about": "x"}}}])),
        )
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path(SCANS_PATH))
        .and(query_param("id", format!("eq.{}", empty).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"trust_pages_data": null}])))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path(SCANS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock)
        .await;

    let store = store(&mock);
    let data = store.find_trust_pages_data(present).await.unwrap().unwrap();
    assert_eq!(data["drafts"]["about"], "x");
    assert_eq!(
        store.find_trust_pages_data(empty).await.unwrap(),
        Some(Value::Null)
    );
    assert!(store
        .find_trust_pages_data(Uuid::new_v4())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&mock)
        .await;

    let notification = Notification::scan_failed(Uuid::new_v4(), Uuid::new_v4(), "garden.example");
    let err = store(&mock).insert(&notification).await.unwrap_err();
    match err {
        RepositoryError::Status { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid api key"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_webhooks_filtered_by_event() {
    let mock = MockServer::start().await;
    let user_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/webhooks"))
        .and(query_param("events", "cs.{scan.completed}"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": Uuid::new_v4(),
                "user_id": user_id,
                "url": "https://hooks.example/a",
                "secret": "s",
                "events": ["scan.completed"],
                "is_active": true
            },
            {
                "id": Uuid::new_v4(),
                "user_id": user_id,
                "url": "https://hooks.example/b",
                "secret": "s",
                "events": ["scan.failed"],
                "is_active": true
            }
        ])))
        .mount(&mock)
        .await;

    let subscriptions = store(&mock)
        .find_active(user_id, ScanEvent::ScanCompleted)
        .await
        .unwrap();
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].url, "https://hooks.example/a");
}
