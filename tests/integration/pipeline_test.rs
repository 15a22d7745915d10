// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{spawn_site, spawn_site_with, test_settings, words, InMemoryStore};
use adscan::domain::models::result_bundle::TrustCategory;
use adscan::domain::models::scan_job::ScanJob;
use adscan::domain::services::generative_service::{GenerativeService, FALLBACK_LABEL};
use adscan::domain::services::scan_pipeline::{ScanError, ScanPipeline};
use adscan::infrastructure::services::llm_service::LLMService;
use axum::{response::Html, routing::get, Router};
use std::sync::Arc;
use uuid::Uuid;
use wiremock::MockServer;

fn page(title: &str, body: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{href}\">{href}</a> "))
        .collect();
    format!(
        "<!DOCTYPE html><html><head><title>{title}</title>\
         <meta name=\"description\" content=\"A gardening blog\"></head>\
         <body><h1>{title}</h1><p>{body}</p><nav>{anchors}</nav></body></html>"
    )
}

async fn pipeline(mock: &MockServer) -> ScanPipeline {
    let settings = Arc::new(test_settings(&mock.uri()));
    let generative = GenerativeService::new(Arc::new(LLMService::new(&settings.llm)));
    ScanPipeline::new(settings, generative, Arc::new(InMemoryStore::new())).unwrap()
}

fn job() -> ScanJob {
    ScanJob::new(Uuid::new_v4(), Uuid::new_v4(), None).start().unwrap()
}

#[tokio::test]
async fn test_site_without_trust_pages_is_penalised() {
    let mock = MockServer::start().await;
    let site = spawn_site(
        Router::new()
            .route(
                "/",
                get(|| async { Html(page("Home", &words(400), &["/blog/one", "/blog/two"])) }),
            )
            .route(
                "/blog/one",
                get(|| async { Html(page("One", &words(300), &["/blog/two"])) }),
            )
            .route("/blog/two", get(|| async { Html(page("Two", &words(80), &[])) })),
    )
    .await;

    let output = pipeline(&mock).await.run(&job(), &site).await.unwrap();
    let trust = &output.bundle.trust_pages;

    for category in [TrustCategory::Privacy, TrustCategory::About, TrustCategory::Contact] {
        assert!(!trust.has(category), "{} should be missing", category);
        let draft = trust.drafts.get(&category).expect("draft for missing page");
        assert!(draft.contains(FALLBACK_LABEL));
    }

    let ids: Vec<&str> = output.card.checklist.iter().map(|item| item.id.as_str()).collect();
    for id in ["privacy_page", "contact_page", "about_page"] {
        assert!(ids.contains(&id), "checklist should contain {}", id);
    }
    assert!(output.card.overall_score <= 70);

    // Plain-HTTP site cannot pass the TLS check
    assert!(!output.bundle.core.ssl_check.passed());
    assert!(output.card.approval_probability <= 5);

    let content = &output.bundle.core.content_analysis;
    assert_eq!(content.pages_scanned, 3);
    assert!(content
        .thin_content_pages
        .iter()
        .any(|url| url.ends_with("/blog/two")));
    assert_eq!(output.bundle.core.status_code, Some(200));
    assert!(output.bundle.core.homepage_error.is_none());
}

#[tokio::test]
async fn test_sitemap_discovered_through_robots_directive() {
    let mock = MockServer::start().await;
    let site = spawn_site_with(|base| {
        let robots = format!(
            "User-agent: *\nDisallow: /admin\n\nSitemap: {}/sitemaps/index.xml\n",
            base
        );
        Router::new()
            .route("/", get(|| async { Html(page("Home", &words(300), &[])) }))
            .route("/robots.txt", get(move || std::future::ready(robots.clone())))
            .route(
                "/sitemaps/index.xml",
                get(|| async { "<?xml version=\"1.0\"?><sitemapindex></sitemapindex>" }),
            )
    })
    .await;

    let output = pipeline(&mock).await.run(&job(), &site).await.unwrap();
    let core = &output.bundle.core;

    assert!(core.robots_txt.exists);
    assert!(core.robots_txt.adsense_crawler_allowed);
    assert!(!core.robots_txt.has_disallow_all);
    assert!(core.sitemap_xml.exists);
    assert!(core.sitemap_xml.from_robots);
    assert!(core.sitemap_xml.url.ends_with("/sitemaps/index.xml"));
    assert!(output.card.checklist.iter().all(|item| item.id != "sitemap"));
}

#[tokio::test]
async fn test_valid_trust_pages_are_accepted() {
    let mock = MockServer::start().await;
    let privacy = format!(
        "Privacy Policy. This page explains the personal information we collect. {}",
        words(120)
    );
    let about = format!("About us. We are a small team of gardeners. {}", words(120));
    let contact = format!("Contact us at hello@garden.example or use the form. {}", words(80));
    let site = spawn_site(
        Router::new()
            .route(
                "/",
                get(|| async {
                    Html(page(
                        "Home",
                        &words(300),
                        &["/privacy-policy", "/about-us", "/contact", "/category/privacy-tips"],
                    ))
                }),
            )
            .route(
                "/privacy-policy",
                get(move || std::future::ready(Html(page("Privacy", &privacy, &[])))),
            )
            .route("/about-us", get(move || std::future::ready(Html(page("About", &about, &[])))))
            .route(
                "/contact",
                get(move || std::future::ready(Html(page("Contact", &contact, &[])))),
            )
            .route(
                "/category/privacy-tips",
                get(|| async { Html(page("Tips", &words(300), &[])) }),
            ),
    )
    .await;

    let output = pipeline(&mock).await.run(&job(), &site).await.unwrap();
    let trust = &output.bundle.trust_pages;

    assert!(trust.has(TrustCategory::Privacy));
    assert!(trust.has(TrustCategory::About));
    assert!(trust.has(TrustCategory::Contact));
    let privacy_url = trust.pages[&TrustCategory::Privacy].url.clone().unwrap();
    assert!(privacy_url.ends_with("/privacy-policy"));
    assert!(!trust.drafts.contains_key(&TrustCategory::Privacy));
    assert!(output.bundle.core.content_analysis.email_found);
}

#[tokio::test]
async fn test_stub_trust_page_does_not_validate() {
    let mock = MockServer::start().await;
    let site = spawn_site(
        Router::new()
            .route(
                "/",
                get(|| async { Html(page("Home", &words(300), &["/privacy"])) }),
            )
            .route(
                "/privacy",
                get(|| async { Html(page("Privacy", "We collect personal data.", &[])) }),
            ),
    )
    .await;

    let output = pipeline(&mock).await.run(&job(), &site).await.unwrap();
    let privacy = &output.bundle.trust_pages.pages[&TrustCategory::Privacy];
    assert!(!privacy.exists);
    assert_eq!(privacy.candidates_checked, 1);
}

#[tokio::test]
async fn test_unreachable_homepage_degrades_instead_of_failing() {
    let mock = MockServer::start().await;
    let site = spawn_site(Router::new()).await;

    let output = pipeline(&mock).await.run(&job(), &site).await.unwrap();
    assert_eq!(output.bundle.core.status_code, Some(404));
    assert!(output.bundle.core.homepage_error.is_some());
    assert_eq!(output.bundle.core.content_analysis.pages_scanned, 0);
    assert!(output.card.overall_score <= 100);
}

#[tokio::test]
async fn test_private_target_refused_without_opt_in() {
    let mock = MockServer::start().await;
    let mut settings = test_settings(&mock.uri());
    settings.scan.allow_private_targets = false;
    let settings = Arc::new(settings);
    let generative = GenerativeService::new(Arc::new(LLMService::new(&settings.llm)));
    let pipeline =
        ScanPipeline::new(settings, generative, Arc::new(InMemoryStore::new())).unwrap();

    let err = pipeline
        .run(&job(), "http://127.0.0.1:9/")
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::Blocked(_)));
}

#[tokio::test]
async fn test_pipeline_runs_on_a_spawned_task() {
    let mock = MockServer::start().await;
    let site = spawn_site(Router::new().route(
        "/",
        get(|| async { Html(page("Home", &words(300), &["/gone", "/gone#top"])) }),
    ))
    .await;
    let pipeline = Arc::new(pipeline(&mock).await);
    let job = job();

    let output = tokio::spawn(async move { pipeline.run(&job, &site).await })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(output.bundle.core.content_analysis.pages_scanned, 1);
}
