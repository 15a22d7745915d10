// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::{ProbeSubject, ProviderError, SignalProvider};
use crate::domain::models::reports::{KeywordEntry, KeywordReport};
use crate::domain::models::signal::SignalSource;
use crate::utils::text_stats;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const TOP_KEYWORDS: usize = 10;

/// 关键词接口（Keywords Everywhere 域名关键词）
pub struct KeywordApi {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl KeywordApi {
    pub fn new(client: reqwest::Client, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl SignalProvider<KeywordReport> for KeywordApi {
    fn name(&self) -> &'static str {
        "keywords_everywhere"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Premium
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    async fn fetch(&self, subject: &ProbeSubject) -> Result<KeywordReport, ProviderError> {
        let key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured)?;
        let num = TOP_KEYWORDS.to_string();
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key)
            .header("Accept", "application/json")
            .form(&[("domain", subject.domain.as_str()), ("num", num.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::from_status(response.status()));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let items = body["data"]
            .as_array()
            .ok_or_else(|| ProviderError::Malformed("missing data array".into()))?;
        let top_keywords = items
            .iter()
            .filter_map(|item| {
                let term = item["keyword"].as_str()?.to_string();
                let volume = item["vol"]
                    .as_u64()
                    .or_else(|| item["estimated_monthly_traffic"].as_u64());
                Some(KeywordEntry {
                    term,
                    count: 0,
                    search_volume: volume,
                })
            })
            .take(TOP_KEYWORDS)
            .collect();

        Ok(KeywordReport { top_keywords })
    }
}

/// 本地词频统计
pub struct LocalTermFrequency;

#[async_trait]
impl SignalProvider<KeywordReport> for LocalTermFrequency {
    fn name(&self) -> &'static str {
        "local_term_frequency"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Fallback
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn fetch(&self, subject: &ProbeSubject) -> Result<KeywordReport, ProviderError> {
        let terms = text_stats::top_terms(&subject.text, TOP_KEYWORDS);
        if terms.is_empty() {
            return Err(ProviderError::Malformed("no text to extract keywords from".into()));
        }
        Ok(KeywordReport {
            top_keywords: terms
                .into_iter()
                .map(|(term, count)| KeywordEntry {
                    term,
                    count,
                    search_volume: None,
                })
                .collect(),
        })
    }
}
