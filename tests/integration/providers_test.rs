// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use adscan::domain::models::signal::{SignalResult, SignalSource};
use adscan::engines::providers::domain_age::{RdapLookup, WhoisXmlApi};
use adscan::engines::providers::pagespeed::{LocalPerformanceHeuristic, PageSpeedApi};
use adscan::engines::providers::safe_browsing::SafeBrowsingApi;
use adscan::engines::providers::{ProbeSubject, ProviderChain, SignalProvider};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn subject() -> ProbeSubject {
    ProbeSubject {
        url: Url::parse("https://garden.example/").unwrap(),
        domain: "garden.example".to_string(),
        text: "A blog about growing tomatoes".to_string(),
        links: Vec::new(),
        response_time_ms: Some(450),
        page_bytes: 120_000,
        integration_token: None,
    }
}

fn lighthouse(score: f64) -> serde_json::Value {
    json!({
        "lighthouseResult": {
            "categories": {"performance": {"score": score}},
            "audits": {
                "largest-contentful-paint": {"displayValue": "2.1 s"},
                "render-blocking-resources": {"details": {"items": [{}, {}]}}
            }
        }
    })
}

#[tokio::test]
async fn test_pagespeed_retries_without_rejected_key() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pagespeed"))
        .and(query_param("key", "bad"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/pagespeed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lighthouse(0.87)))
        .mount(&mock)
        .await;

    let api = PageSpeedApi::new(
        reqwest::Client::new(),
        format!("{}/pagespeed", mock.uri()),
        Some("bad".to_string()),
        Duration::from_millis(0),
    );
    let report = api.fetch(&subject()).await.unwrap();

    assert_eq!(report.score, 87);
    assert_eq!(report.strategy, "mobile");
    assert_eq!(report.lcp.as_deref(), Some("2.1 s"));
    assert_eq!(report.render_blocking_issues, 2);
    assert_eq!(mock.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_pagespeed_chain_falls_back_to_heuristic() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pagespeed"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock)
        .await;

    let chain = ProviderChain::new("pagespeed")
        .with(Arc::new(PageSpeedApi::new(
            reqwest::Client::new(),
            format!("{}/pagespeed", mock.uri()),
            None,
            Duration::from_millis(0),
        )))
        .with(Arc::new(LocalPerformanceHeuristic));

    match chain.resolve(&subject()).await {
        SignalResult::Available {
            payload,
            source,
            provider,
        } => {
            assert_eq!(source, SignalSource::Fallback);
            assert_ne!(provider, "pagespeed_insights");
            assert_eq!(payload.strategy, "heuristic");
        }
        SignalResult::Unavailable(reason) => panic!("expected heuristic, got {}", reason),
    }
    // Both strategies were attempted before falling back
    assert_eq!(mock.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_safe_browsing_counts_matches() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/safe-browsing"))
        .and(query_param("key", "sb-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matches": [{"threatType": "MALWARE"}, {"threatType": "SOCIAL_ENGINEERING"}]
        })))
        .mount(&mock)
        .await;

    let api = SafeBrowsingApi::new(
        reqwest::Client::new(),
        format!("{}/safe-browsing", mock.uri()),
        Some("sb-key".to_string()),
    );
    let verdict = api.fetch(&subject()).await.unwrap();
    assert_eq!(verdict.unsafe_matches, 2);
}

#[tokio::test]
async fn test_safe_browsing_without_key_is_unavailable() {
    let chain = ProviderChain::new("safe_browsing").with(Arc::new(SafeBrowsingApi::new(
        reqwest::Client::new(),
        "http://127.0.0.1:9/unused".to_string(),
        None,
    )));
    match chain.resolve(&subject()).await {
        SignalResult::Unavailable(reason) => assert!(reason.contains("not configured")),
        other => panic!("expected unavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_domain_age_falls_back_to_rdap() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rdap/domain/garden.example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [
                {"eventAction": "last changed", "eventDate": "2024-01-01T00:00:00Z"},
                {"eventAction": "registration", "eventDate": "2015-03-20T10:00:00Z"}
            ]
        })))
        .mount(&mock)
        .await;

    let chain = ProviderChain::new("domain_age")
        .with(Arc::new(WhoisXmlApi::new(
            reqwest::Client::new(),
            format!("{}/whois", mock.uri()),
            None,
        )))
        .with(Arc::new(RdapLookup::new(
            reqwest::Client::new(),
            format!("{}/rdap", mock.uri()),
        )));

    match chain.resolve(&subject()).await {
        SignalResult::Available {
            payload, source, ..
        } => {
            assert_eq!(source, SignalSource::Fallback);
            assert!(payload.created_at.starts_with("2015-03-20"));
            assert!(payload.age_days > 365 * 9);
        }
        SignalResult::Unavailable(reason) => panic!("expected rdap result, got {}", reason),
    }
}
