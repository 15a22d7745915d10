// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{eventually, spawn_site, test_settings, words, InMemoryStore};
use adscan::domain::models::scan_job::ScanStatus;
use adscan::domain::repositories::scan_repository::ScanRepository;
use adscan::domain::services::generative_service::GenerativeService;
use adscan::domain::services::notification_service::ScanNotifier;
use adscan::domain::services::scan_pipeline::ScanPipeline;
use adscan::infrastructure::services::llm_service::LLMService;
use adscan::infrastructure::services::webhook_service_impl::WebhookServiceImpl;
use adscan::workers::scan_worker::{JobOutcome, ScanWorker};
use axum::{response::Html, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn worker(mock: &MockServer, store: Arc<InMemoryStore>) -> ScanWorker {
    let settings = Arc::new(test_settings(&mock.uri()));
    let generative = GenerativeService::new(Arc::new(LLMService::new(&settings.llm)));
    let pipeline = Arc::new(ScanPipeline::new(settings, generative, store.clone()).unwrap());
    let notifier = Arc::new(ScanNotifier::new(
        store.clone(),
        store.clone(),
        Arc::new(WebhookServiceImpl::new()),
    ));
    ScanWorker::new(store, pipeline, notifier, Duration::from_secs(1), 5)
}

async fn simple_site() -> String {
    spawn_site(Router::new().route(
        "/",
        get(|| async {
            Html(format!(
                "<html><head><title>Garden</title></head><body><h1>Garden</h1><p>{}</p></body></html>",
                words(350)
            ))
        }),
    ))
    .await
}

#[tokio::test]
async fn test_missing_site_fails_the_scan() {
    let mock = MockServer::start().await;
    let store = Arc::new(InMemoryStore::new());
    let user_id = Uuid::new_v4();
    let job = store.seed_job(None, Some(user_id));

    let outcome = worker(&mock, store.clone()).process(job.clone()).await;

    assert_eq!(outcome, JobOutcome::Failed);
    assert_eq!(store.status(job.id), Some(ScanStatus::Failed));
    assert!(eventually(|| !store.notifications.lock().unwrap().is_empty()).await);
    let notifications = store.notifications.lock().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, "scan_failed");
    assert_eq!(notifications[0].scan_id, job.id);
}

#[tokio::test]
async fn test_successful_scan_is_persisted_and_announced() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/adscan"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock)
        .await;

    let site = simple_site().await;
    let store = Arc::new(InMemoryStore::new());
    let user_id = Uuid::new_v4();
    store.add_webhook(
        user_id,
        &format!("{}/hooks/adscan", mock.uri()),
        "secret",
        &["scan.completed"],
    );
    let job = store.seed_job(Some(&site), Some(user_id));

    let outcome = worker(&mock, store.clone()).process(job.clone()).await;

    assert_eq!(outcome, JobOutcome::Completed);
    assert_eq!(store.status(job.id), Some(ScanStatus::Completed));
    let completed = store.completed.lock().unwrap().get(&job.id).cloned().unwrap();
    assert!(completed.overall_score <= 100);
    assert!(completed.approval_probability <= completed.overall_score);
    assert_eq!(completed.bundle.core.status_code, Some(200));
    assert!(store.trust_data.lock().unwrap().contains_key(&job.id));

    assert!(eventually(|| !store.notifications.lock().unwrap().is_empty()).await);
    assert_eq!(store.notifications.lock().unwrap()[0].kind, "scan_completed");
    let mut delivered = false;
    for _ in 0..100 {
        let requests = mock.received_requests().await.unwrap_or_default();
        if requests.iter().any(|r| r.url.path() == "/hooks/adscan") {
            delivered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(delivered, "webhook was not delivered");
}

#[tokio::test]
async fn test_claimed_job_is_skipped() {
    let mock = MockServer::start().await;
    let store = Arc::new(InMemoryStore::new());
    let job = store.seed_job(Some("http://127.0.0.1:9"), None);
    assert!(store.claim(job.id).await.unwrap());

    let worker = worker(&mock, store.clone());
    assert_eq!(worker.process_triggered(job.id).await, JobOutcome::Skipped);
    assert_eq!(worker.process(job.clone()).await, JobOutcome::Skipped);
    assert_eq!(store.status(job.id), Some(ScanStatus::Running));
    assert_eq!(
        worker.process_triggered(Uuid::new_v4()).await,
        JobOutcome::Skipped
    );
}

#[tokio::test]
async fn test_poll_once_drains_pending_jobs() {
    let mock = MockServer::start().await;
    let site = simple_site().await;
    let store = Arc::new(InMemoryStore::new());
    let first = store.seed_job(Some(&site), None);
    let second = store.seed_job(None, None);

    let worker = worker(&mock, store.clone());
    assert_eq!(worker.poll_once().await.unwrap(), 2);
    assert_eq!(store.status(first.id), Some(ScanStatus::Completed));
    assert_eq!(store.status(second.id), Some(ScanStatus::Failed));
    assert_eq!(worker.poll_once().await.unwrap(), 0);
}
