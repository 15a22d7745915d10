// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::{ProbeSubject, ProviderError, SignalProvider};
use crate::domain::models::reports::SocialLinks;
use crate::domain::models::signal::SignalSource;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

static SOCIAL_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("facebook", r"^https?://(?:www\.|m\.)?facebook\.com/[A-Za-z0-9_.\-]+"),
        ("twitter", r"^https?://(?:www\.)?(?:twitter|x)\.com/[A-Za-z0-9_]+"),
        ("instagram", r"^https?://(?:www\.)?instagram\.com/[A-Za-z0-9_.]+"),
        ("linkedin", r"^https?://(?:[a-z]{2,3}\.)?linkedin\.com/(?:company|in)/[A-Za-z0-9_\-]+"),
        ("youtube", r"^https?://(?:www\.)?youtube\.com/(?:@|channel/|c/|user/)[A-Za-z0-9_\-]+"),
        ("tiktok", r"^https?://(?:www\.)?tiktok\.com/@[A-Za-z0-9_.]+"),
        ("pinterest", r"^https?://(?:[a-z]{2}\.)?pinterest\.[a-z.]+/[A-Za-z0-9_]+"),
        ("github", r"^https?://(?:www\.)?github\.com/[A-Za-z0-9_\-]+"),
    ]
    .into_iter()
    .map(|(platform, pattern)| {
        (
            platform,
            Regex::new(pattern).expect("social link pattern is valid"),
        )
    })
    .collect()
});

/// 从链接列表中识别社交账号，每个平台取第一个
pub fn scan_links(links: &[String]) -> SocialLinks {
    let mut profiles = BTreeMap::new();
    for link in links {
        for (platform, regex) in SOCIAL_PATTERNS.iter() {
            if !profiles.contains_key(*platform) && regex.is_match(link) {
                profiles.insert(platform.to_string(), link.clone());
            }
        }
    }
    SocialLinks { profiles }
}

/// 品牌信息接口（Brandfetch）
pub struct BrandApi {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl BrandApi {
    pub fn new(client: reqwest::Client, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl SignalProvider<SocialLinks> for BrandApi {
    fn name(&self) -> &'static str {
        "brandfetch"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Premium
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(10)
    }

    async fn fetch(&self, subject: &ProbeSubject) -> Result<SocialLinks, ProviderError> {
        let key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured)?;
        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), subject.domain);
        let response = self.client.get(url).bearer_auth(key).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::from_status(response.status()));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let links = body["links"]
            .as_array()
            .ok_or_else(|| ProviderError::Malformed("missing links array".into()))?;
        let profiles = links
            .iter()
            .filter_map(|link| {
                Some((
                    link["name"].as_str()?.to_lowercase(),
                    link["url"].as_str()?.to_string(),
                ))
            })
            .collect();
        Ok(SocialLinks { profiles })
    }
}

/// 本地链接扫描
pub struct LocalLinkScan;

#[async_trait]
impl SignalProvider<SocialLinks> for LocalLinkScan {
    fn name(&self) -> &'static str {
        "local_link_scan"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Fallback
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn fetch(&self, subject: &ProbeSubject) -> Result<SocialLinks, ProviderError> {
        Ok(scan_links(&subject.links))
    }
}
