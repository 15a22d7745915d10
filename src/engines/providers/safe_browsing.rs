// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::{ProbeSubject, ProviderError, SignalProvider};
use crate::domain::models::reports::ReputationVerdict;
use crate::domain::models::signal::SignalSource;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

const THREAT_TYPES: [&str; 4] = [
    "MALWARE",
    "SOCIAL_ENGINEERING",
    "UNWANTED_SOFTWARE",
    "POTENTIALLY_HARMFUL_APPLICATION",
];

/// 网址信誉接口（Safe Browsing Lookup）
///
/// 没有免费等价来源；未配置密钥时直接返回 `NotConfigured`
pub struct SafeBrowsingApi {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl SafeBrowsingApi {
    pub fn new(client: reqwest::Client, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl SignalProvider<ReputationVerdict> for SafeBrowsingApi {
    fn name(&self) -> &'static str {
        "safe_browsing"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Premium
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn fetch(&self, subject: &ProbeSubject) -> Result<ReputationVerdict, ProviderError> {
        let key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured)?;

        let payload = json!({
            "client": {"clientId": "adscan", "clientVersion": env!("CARGO_PKG_VERSION")},
            "threatInfo": {
                "threatTypes": THREAT_TYPES,
                "platformTypes": ["ANY_PLATFORM"],
                "threatEntryTypes": ["URL"],
                "threatEntries": [{"url": subject.url.as_str()}]
            }
        });

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", key)])
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::from_status(response.status()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        // An empty object means no matches.
        let unsafe_matches = body
            .get("matches")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);
        Ok(ReputationVerdict { unsafe_matches })
    }
}
