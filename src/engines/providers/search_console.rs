// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::{ProbeSubject, ProviderError, SignalProvider};
use crate::domain::models::reports::{SearchConsoleReport, SubmittedSitemap};
use crate::domain::models::signal::SignalSource;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Search Console 站点地图查询
///
/// 使用站点所属用户绑定的 Google 授权令牌；没有令牌时返回 `NotConfigured`
pub struct SearchConsoleApi {
    client: reqwest::Client,
    base_url: String,
}

impl SearchConsoleApi {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

fn as_count(value: &Value) -> i64 {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .unwrap_or(0)
}

#[async_trait]
impl SignalProvider<SearchConsoleReport> for SearchConsoleApi {
    fn name(&self) -> &'static str {
        "search_console"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Premium
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    async fn fetch(&self, subject: &ProbeSubject) -> Result<SearchConsoleReport, ProviderError> {
        let token = subject
            .integration_token
            .as_deref()
            .ok_or(ProviderError::NotConfigured)?;

        // URL-prefix property for the resolved origin
        let property = format!("{}/", subject.url.origin().ascii_serialization());
        let url = format!(
            "{}/webmasters/v3/sites/{}/sitemaps",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&property)
        );

        let response = self.client.get(url).bearer_auth(token).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::from_status(response.status()));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let sitemaps = body["sitemap"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        Some(SubmittedSitemap {
                            path: item["path"].as_str()?.to_string(),
                            last_submitted: item["lastSubmitted"].as_str().map(str::to_string),
                            errors: as_count(&item["errors"]),
                            warnings: as_count(&item["warnings"]),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(SearchConsoleReport { sitemaps })
    }
}
