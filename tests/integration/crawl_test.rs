// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{spawn_site, test_settings, words};
use adscan::domain::services::crawl_service::{CrawlConfig, CrawlService};
use adscan::engines::fetcher::PageFetcher;
use axum::extract::Path;
use axum::{response::Html, routing::get, Router};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const SITE_PAGES: usize = 70;

/// 每个页面链接到后续若干页面，并混入带片段的重复链接
fn article(n: usize) -> String {
    let links: String = (n + 1..(n + 6).min(SITE_PAGES))
        .flat_map(|i| {
            [
                format!("<a href=\"/p/{i}\">Page {i}</a>"),
                format!("<a href=\"/p/{i}#comments\">Comments</a>"),
            ]
        })
        .collect();
    format!(
        "<html><head><title>Page {n}</title></head>\
         <body><h1>Page {n}</h1><p>{}</p><a href=\"/#top\">Home</a>{links}</body></html>",
        words(320)
    )
}

async fn large_site() -> String {
    spawn_site(
        Router::new()
            .route(
                "/",
                get(|| async {
                    let links: String = (0..SITE_PAGES)
                        .map(|i| format!("<a href=\"/p/{i}\">{i}</a><a href=\"/p/{i}#top\">#</a>"))
                        .collect();
                    Html(format!(
                        "<html><head><title>Home</title></head><body><p>{}</p>{links}</body></html>",
                        words(400)
                    ))
                }),
            )
            .route("/p/{n}", get(|Path(n): Path<usize>| async move { Html(article(n)) })),
    )
    .await
}

#[tokio::test]
async fn test_crawl_respects_page_cap_and_never_refetches() {
    let site = large_site().await;
    let mut settings = test_settings("http://127.0.0.1:9");
    settings.scan.max_pages = 50;
    let fetcher = Arc::new(PageFetcher::new(&settings.scan).unwrap());
    let crawl = CrawlService::new(fetcher.clone(), CrawlConfig::from(&settings.scan));

    let homepage = fetcher
        .fetch_document(&Url::parse(&site).unwrap(), Duration::from_secs(5))
        .await
        .unwrap();
    let outcome = crawl.crawl(&homepage).await;

    assert_eq!(outcome.fetched.len(), 50);
    assert_eq!(outcome.content.pages_scanned, 50);
    let unique: HashSet<&String> = outcome.fetched.iter().collect();
    assert_eq!(unique.len(), outcome.fetched.len(), "a page was fetched twice");
    assert!(outcome.fetched.iter().all(|url| !url.contains('#')));
}

#[tokio::test]
async fn test_crawl_stops_when_site_is_exhausted() {
    let site = spawn_site(
        Router::new()
            .route(
                "/",
                get(|| async {
                    Html(format!(
                        "<html><body><p>{}</p><a href=\"/a\">a</a><a href=\"/a#x\">a</a>\
                         <a href=\"/a#y\">a</a><a href=\"/b\">b</a></body></html>",
                        words(300)
                    ))
                }),
            )
            .route(
                "/a",
                get(|| async { Html("<html><body><a href=\"/b#top\">b</a></body></html>") }),
            )
            .route(
                "/b",
                get(|| async { Html("<html><body><a href=\"/a\">a</a></body></html>") }),
            ),
    )
    .await;
    let settings = test_settings("http://127.0.0.1:9");
    let fetcher = Arc::new(PageFetcher::new(&settings.scan).unwrap());
    let crawl = CrawlService::new(fetcher.clone(), CrawlConfig::from(&settings.scan));

    let homepage = fetcher
        .fetch_document(&Url::parse(&site).unwrap(), Duration::from_secs(5))
        .await
        .unwrap();
    let outcome = crawl.crawl(&homepage).await;

    assert_eq!(outcome.fetched.len(), 3);
    assert_eq!(outcome.content.pages_scanned, 3);
}
