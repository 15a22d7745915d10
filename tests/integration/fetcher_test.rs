// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{spawn_site, test_settings};
use adscan::engines::fetcher::{FetchError, PageFetcher};
use adscan::utils::validators::ValidationError;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, head};
use axum::Router;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn fetcher(allow_private: bool) -> PageFetcher {
    let mut settings = test_settings("http://127.0.0.1:9");
    settings.scan.allow_private_targets = allow_private;
    PageFetcher::new(&settings.scan).unwrap()
}

fn redirect_to(location: &'static str) -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, location)])
}

#[tokio::test]
async fn test_private_targets_are_rejected_for_every_request_kind() {
    let fetcher = fetcher(false);

    let err = fetcher.probe("http://127.0.0.1:1/", TIMEOUT).await.unwrap_err();
    assert!(matches!(err, FetchError::Blocked(ValidationError::PrivateAddress(_))));

    let err = fetcher
        .get_text("http://10.0.0.8/robots.txt", TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Blocked(ValidationError::PrivateAddress(_))));
}

#[tokio::test]
async fn test_redirect_hops_are_validated_for_probes_and_text() {
    let site = spawn_site(
        Router::new()
            .route("/leak", get(|| async { redirect_to("file:///etc/passwd") }))
            .route("/robots.txt", get(|| async { redirect_to("gopher://127.0.0.1/") })),
    )
    .await;
    let fetcher = fetcher(true);

    let err = fetcher
        .probe(&format!("{}/leak", site), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Blocked(ValidationError::UnsupportedScheme(_))));

    let err = fetcher
        .get_text(&format!("{}/robots.txt", site), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Blocked(ValidationError::UnsupportedScheme(_))));
}

#[tokio::test]
async fn test_probe_follows_redirects_and_falls_back_to_get() {
    let site = spawn_site(
        Router::new()
            .route("/old", get(|| async { redirect_to("/new") }))
            .route("/new", get(|| async { "fresh" }))
            .route("/gone", get(|| async { redirect_to("/missing") }))
            .route(
                "/no-head",
                head(|| async { StatusCode::METHOD_NOT_ALLOWED }).get(|| async { "body" }),
            ),
    )
    .await;
    let fetcher = fetcher(true);

    assert_eq!(fetcher.probe(&format!("{}/old", site), TIMEOUT).await.unwrap(), 200);
    assert_eq!(fetcher.probe(&format!("{}/gone", site), TIMEOUT).await.unwrap(), 404);
    assert_eq!(fetcher.probe(&format!("{}/no-head", site), TIMEOUT).await.unwrap(), 200);

    let (status, body) = fetcher
        .get_text(&format!("{}/old", site), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(status, 200);
    assert_eq!(body, "fresh");
}

#[tokio::test]
async fn test_redirect_loop_is_cut_off() {
    let site = spawn_site(
        Router::new()
            .route("/ping", get(|| async { redirect_to("/pong") }))
            .route("/pong", get(|| async { redirect_to("/ping") })),
    )
    .await;

    let err = fetcher(true)
        .probe(&format!("{}/ping", site), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::TooManyRedirects(10)));
}
