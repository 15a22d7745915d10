// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::{ProbeSubject, ProviderError, SignalProvider};
use crate::domain::models::reports::TrafficRank;
use crate::domain::models::signal::SignalSource;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// 流量排名接口（Open PageRank）
///
/// 第三方流量数据没有本地替代，未配置密钥时不伪造数据
pub struct PageRankApi {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl PageRankApi {
    pub fn new(client: reqwest::Client, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl SignalProvider<TrafficRank> for PageRankApi {
    fn name(&self) -> &'static str {
        "open_pagerank"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Premium
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(10)
    }

    async fn fetch(&self, subject: &ProbeSubject) -> Result<TrafficRank, ProviderError> {
        let key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured)?;
        let response = self
            .client
            .get(&self.endpoint)
            .header("API-OPR", key)
            .query(&[("domains[]", subject.domain.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::from_status(response.status()));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let entry = &body["response"][0];
        if entry["status_code"].as_i64().is_some_and(|code| code != 200) {
            return Err(ProviderError::Malformed(
                entry["error"].as_str().unwrap_or("domain not ranked").to_string(),
            ));
        }
        let page_rank_decimal = entry["page_rank_decimal"]
            .as_f64()
            .or_else(|| entry["page_rank_decimal"].as_str().and_then(|s| s.parse().ok()))
            .ok_or_else(|| ProviderError::Malformed("missing page_rank_decimal".into()))?;
        let rank = entry["rank"]
            .as_i64()
            .or_else(|| entry["rank"].as_str().and_then(|s| s.parse().ok()));

        Ok(TrafficRank {
            page_rank_decimal,
            rank,
        })
    }
}
