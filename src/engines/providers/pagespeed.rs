// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::{ProbeSubject, ProviderError, SignalProvider};
use crate::domain::models::reports::PageSpeedReport;
use crate::domain::models::signal::SignalSource;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

const STRATEGIES: [&str; 2] = ["mobile", "desktop"];

/// 性能审计接口（PageSpeed Insights）
///
/// 依次尝试 mobile、desktop 两种设备策略，之间留出间隔；
/// 带密钥调用遇到 403/429 时以无密钥方式重试一次
pub struct PageSpeedApi {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    strategy_delay: Duration,
}

impl PageSpeedApi {
    pub fn new(
        client: reqwest::Client,
        endpoint: String,
        api_key: Option<String>,
        strategy_delay: Duration,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            strategy_delay,
        }
    }

    async fn call(
        &self,
        url: &str,
        strategy: &str,
        key: Option<&str>,
    ) -> Result<reqwest::Response, ProviderError> {
        let mut query: Vec<(&str, &str)> = vec![
            ("url", url),
            ("strategy", strategy),
            ("category", "performance"),
        ];
        if let Some(key) = key {
            query.push(("key", key));
        }
        Ok(self
            .client
            .get(&self.endpoint)
            .query(&query)
            .timeout(Duration::from_secs(60))
            .send()
            .await?)
    }

    async fn run_strategy(&self, url: &str, strategy: &str) -> Result<PageSpeedReport, ProviderError> {
        let mut response = self.call(url, strategy, self.api_key.as_deref()).await?;

        if self.api_key.is_some() && matches!(response.status().as_u16(), 403 | 429) {
            warn!(
                "PageSpeed key rejected with {}, retrying {} without key",
                response.status(),
                strategy
            );
            response = self.call(url, strategy, None).await?;
        }

        if !response.status().is_success() {
            return Err(ProviderError::from_status(response.status()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        parse_report(&body, strategy)
    }
}

#[async_trait]
impl SignalProvider<PageSpeedReport> for PageSpeedApi {
    fn name(&self) -> &'static str {
        "pagespeed_insights"
    }

    fn source(&self) -> SignalSource {
        if self.api_key.is_some() {
            SignalSource::Premium
        } else {
            SignalSource::Fallback
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(120)
    }

    async fn fetch(&self, subject: &ProbeSubject) -> Result<PageSpeedReport, ProviderError> {
        let url = subject.url.as_str();
        let mut last_error = None;

        for (index, strategy) in STRATEGIES.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.strategy_delay).await;
            }
            match self.run_strategy(url, strategy).await {
                Ok(report) => {
                    info!("PageSpeed {} score for {}: {}", strategy, url, report.score);
                    return Ok(report);
                }
                Err(e) => {
                    warn!("PageSpeed {} strategy failed for {}: {}", strategy, url, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(ProviderError::Malformed("no strategy attempted".into())))
    }
}

/// 解析审计结果
///
/// 实验室数据为基础，真实用户（field）数据逐项覆盖
pub fn parse_report(body: &Value, strategy: &str) -> Result<PageSpeedReport, ProviderError> {
    let lighthouse = &body["lighthouseResult"];
    let score = lighthouse["categories"]["performance"]["score"]
        .as_f64()
        .ok_or_else(|| ProviderError::Malformed("missing performance score".into()))?;
    let audits = &lighthouse["audits"];

    let display = |id: &str| audits[id]["displayValue"].as_str().map(str::to_string);
    let item_count = |id: &str| {
        audits[id]["details"]["items"]
            .as_array()
            .map(Vec::len)
            .unwrap_or(0)
    };

    let mut report = PageSpeedReport {
        score: (score * 100.0).round().clamp(0.0, 100.0) as u8,
        strategy: strategy.to_string(),
        lcp: display("largest-contentful-paint"),
        cls: display("cumulative-layout-shift"),
        tbt: display("total-blocking-time"),
        fcp: display("first-contentful-paint"),
        render_blocking_issues: item_count("render-blocking-resources"),
        image_optimization_issues: item_count("offscreen-images"),
        field_data: false,
        metric_sources: BTreeMap::new(),
    };

    for (metric, value) in [
        ("lcp", &report.lcp),
        ("cls", &report.cls),
        ("tbt", &report.tbt),
        ("fcp", &report.fcp),
    ] {
        if value.is_some() {
            report.metric_sources.insert(metric.to_string(), "lab".to_string());
        }
    }

    let field = &body["loadingExperience"]["metrics"];
    let percentile = |key: &str| field[key]["percentile"].as_f64();

    if let Some(ms) = percentile("LARGEST_CONTENTFUL_PAINT_MS") {
        report.lcp = Some(format_seconds(ms));
        report.metric_sources.insert("lcp".into(), "field".into());
        report.field_data = true;
    }
    if let Some(ms) = percentile("FIRST_CONTENTFUL_PAINT_MS") {
        report.fcp = Some(format_seconds(ms));
        report.metric_sources.insert("fcp".into(), "field".into());
        report.field_data = true;
    }
    if let Some(raw) = percentile("CUMULATIVE_LAYOUT_SHIFT_SCORE") {
        // CrUX reports CLS multiplied by 100
        report.cls = Some(format!("{:.2}", raw / 100.0));
        report.metric_sources.insert("cls".into(), "field".into());
        report.field_data = true;
    }

    Ok(report)
}

fn format_seconds(ms: f64) -> String {
    format!("{:.1} s", ms / 1000.0)
}

/// 本地性能估算
///
/// 根据首页响应时间与页面体积粗略估分，仅在审计接口不可用时使用
pub struct LocalPerformanceHeuristic;

#[async_trait]
impl SignalProvider<PageSpeedReport> for LocalPerformanceHeuristic {
    fn name(&self) -> &'static str {
        "local_heuristic"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Fallback
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn fetch(&self, subject: &ProbeSubject) -> Result<PageSpeedReport, ProviderError> {
        let ttfb = subject
            .response_time_ms
            .ok_or_else(|| ProviderError::Malformed("homepage timing unavailable".into()))?;
        Ok(PageSpeedReport {
            score: heuristic_score(ttfb, subject.page_bytes),
            strategy: "heuristic".to_string(),
            ..Default::default()
        })
    }
}

/// 响应时间超过 200ms 后每 20ms 扣 1 分（最多 60 分），
/// 页面超过 500KB 后每 20KB 扣 1 分（最多 30 分）
pub fn heuristic_score(response_time_ms: u64, page_bytes: usize) -> u8 {
    let time_penalty = (response_time_ms.saturating_sub(200) / 20).min(60);
    let kb = (page_bytes / 1024) as u64;
    let size_penalty = (kb.saturating_sub(500) / 20).min(30);
    (100 - time_penalty - size_penalty) as u8
}
