// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::{ProbeSubject, ProviderError, SignalProvider};
use crate::domain::models::reports::DomainAge;
use crate::domain::models::signal::SignalSource;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::time::Duration;

/// 解析注册日期，兼容 RFC3339、无时区时间与纯日期
pub fn parse_registration_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%d %H:%M:%S UTC", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    let date_part = raw.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn age_from(created: DateTime<Utc>, registrar: Option<String>) -> DomainAge {
    DomainAge {
        created_at: created.to_rfc3339(),
        age_days: (Utc::now() - created).num_days(),
        registrar,
    }
}

/// WHOIS 查询（WhoisXML API）
pub struct WhoisXmlApi {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl WhoisXmlApi {
    pub fn new(client: reqwest::Client, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl SignalProvider<DomainAge> for WhoisXmlApi {
    fn name(&self) -> &'static str {
        "whoisxml"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Premium
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    async fn fetch(&self, subject: &ProbeSubject) -> Result<DomainAge, ProviderError> {
        let key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured)?;
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("apiKey", key),
                ("domainName", subject.domain.as_str()),
                ("outputFormat", "JSON"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::from_status(response.status()));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let record = &body["WhoisRecord"];
        let created = record["createdDate"]
            .as_str()
            .or_else(|| record["registryData"]["createdDate"].as_str())
            .and_then(parse_registration_date)
            .ok_or_else(|| ProviderError::Malformed("no creation date in WHOIS record".into()))?;
        let registrar = record["registrarName"].as_str().map(str::to_string);
        Ok(age_from(created, registrar))
    }
}

/// RDAP 查询（免费回退）
pub struct RdapLookup {
    client: reqwest::Client,
    base_url: String,
}

impl RdapLookup {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl SignalProvider<DomainAge> for RdapLookup {
    fn name(&self) -> &'static str {
        "rdap"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Fallback
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(10)
    }

    async fn fetch(&self, subject: &ProbeSubject) -> Result<DomainAge, ProviderError> {
        let url = format!(
            "{}/domain/{}",
            self.base_url.trim_end_matches('/'),
            subject.domain
        );
        let response = self
            .client
            .get(url)
            .header("Accept", "application/rdap+json")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::from_status(response.status()));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let created = body["events"]
            .as_array()
            .into_iter()
            .flatten()
            .find(|event| event["eventAction"].as_str() == Some("registration"))
            .and_then(|event| event["eventDate"].as_str())
            .and_then(parse_registration_date)
            .ok_or_else(|| ProviderError::Malformed("no registration event".into()))?;

        let registrar = body["entities"]
            .as_array()
            .into_iter()
            .flatten()
            .find(|entity| {
                entity["roles"]
                    .as_array()
                    .map(|roles| roles.iter().any(|r| r.as_str() == Some("registrar")))
                    .unwrap_or(false)
            })
            .and_then(|entity| entity["vcardArray"][1].as_array())
            .and_then(|cards| {
                cards
                    .iter()
                    .find(|card| card[0].as_str() == Some("fn"))
                    .and_then(|card| card[3].as_str())
            })
            .map(str::to_string);

        Ok(age_from(created, registrar))
    }
}
