// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 外部信号提供方
//!
//! 每个信号由一条 [`ProviderChain`] 负责：按顺序尝试候选来源（付费优先，免费回退在后），
//! 第一个成功者胜出；全部失败时返回 `Unavailable`，从不向上传播错误。

pub mod content_policy;
pub mod domain_age;
pub mod keywords;
pub mod pagespeed;
pub mod safe_browsing;
pub mod search_console;
pub mod social;
pub mod traffic;

use crate::config::settings::Settings;
use crate::domain::models::reports::{
    DomainAge, KeywordReport, PageSpeedReport, PolicyReport, ReputationVerdict,
    SearchConsoleReport, SocialLinks, TrafficRank,
};
use crate::domain::models::signal::{SignalResult, SignalSource};
use crate::domain::services::generative_service::GenerativeContent;
use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// 提供方错误类型
#[derive(Error, Debug)]
pub enum ProviderError {
    /// 未配置凭据
    #[error("Provider not configured")]
    NotConfigured,
    /// 请求失败
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// 非成功状态码
    #[error("Provider returned status {0}")]
    Status(u16),
    /// 配额耗尽或凭据被拒（403/429）
    #[error("Provider quota exhausted or credential rejected")]
    Quota,
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 响应格式错误
    #[error("Malformed payload: {0}")]
    Malformed(String),
    /// TLS 握手失败
    #[error("TLS handshake failed: {0}")]
    Handshake(String),
}

impl ProviderError {
    /// 根据状态码构造错误，403/429 归为配额错误
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            403 | 429 => ProviderError::Quota,
            code => ProviderError::Status(code),
        }
    }
}

/// 提供方探测对象
///
/// 首页抓取完成后构建一次，所有提供方共享只读引用
#[derive(Debug, Clone)]
pub struct ProbeSubject {
    /// 重定向后的最终URL
    pub url: Url,
    /// 不含 `www.` 的主机名
    pub domain: String,
    /// 首页可见文本
    pub text: String,
    /// 首页出现的所有绝对链接
    pub links: Vec<String>,
    /// 首页响应时间（毫秒）
    pub response_time_ms: Option<u64>,
    /// 首页字节数
    pub page_bytes: usize,
    /// 站点所属用户的 Google 授权令牌
    pub integration_token: Option<String>,
}

/// 信号提供方特质
///
/// 单个候选来源；失败以 `ProviderError` 表达，由所在的链统一降级
#[async_trait]
pub trait SignalProvider<T: Send>: Send + Sync {
    /// 提供方名称
    fn name(&self) -> &'static str;

    /// 来源标记
    fn source(&self) -> SignalSource;

    /// 单次调用超时
    fn timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    /// 获取信号
    async fn fetch(&self, subject: &ProbeSubject) -> Result<T, ProviderError>;
}

/// 提供方责任链
pub struct ProviderChain<T: Send> {
    signal: &'static str,
    candidates: Vec<Arc<dyn SignalProvider<T>>>,
}

impl<T: Send + 'static> ProviderChain<T> {
    /// 创建空的责任链
    ///
    /// # 参数
    ///
    /// * `signal` - 信号名称（用于日志与指标标签）
    pub fn new(signal: &'static str) -> Self {
        Self {
            signal,
            candidates: Vec::new(),
        }
    }

    /// 追加候选来源，先追加者优先
    pub fn with(mut self, provider: Arc<dyn SignalProvider<T>>) -> Self {
        self.candidates.push(provider);
        self
    }

    pub fn signal(&self) -> &'static str {
        self.signal
    }

    /// 依次尝试候选来源
    ///
    /// # 返回值
    ///
    /// 第一个成功者的结果；全部失败（或链为空）时返回带原因的 `Unavailable`
    pub async fn resolve(&self, subject: &ProbeSubject) -> SignalResult<T> {
        let mut reasons = Vec::new();

        for candidate in &self.candidates {
            let name = candidate.name();
            match tokio::time::timeout(candidate.timeout(), candidate.fetch(subject)).await {
                Ok(Ok(payload)) => {
                    info!("Signal {} resolved by {}", self.signal, name);
                    return SignalResult::available(payload, candidate.source(), name);
                }
                Ok(Err(ProviderError::NotConfigured)) => {
                    debug!("Provider {} not configured, skipping", name);
                    reasons.push(format!("{}: not configured", name));
                }
                Ok(Err(e)) => {
                    warn!("Provider {} failed for {}: {}", name, self.signal, e);
                    reasons.push(format!("{}: {}", name, e));
                }
                Err(_) => {
                    warn!("Provider {} timed out for {}", name, self.signal);
                    reasons.push(format!("{}: {}", name, ProviderError::Timeout));
                }
            }
        }

        counter!("provider_unavailable_total", "provider" => self.signal).increment(1);
        if reasons.is_empty() {
            reasons.push("no provider available".to_string());
        }
        SignalResult::Unavailable(reasons.join("; "))
    }
}

/// 一次扫描收集到的全部提供方信号
#[derive(Debug, Clone)]
pub struct ProviderSignals {
    pub pagespeed: SignalResult<PageSpeedReport>,
    pub safe_browsing: SignalResult<ReputationVerdict>,
    pub content_policy: SignalResult<PolicyReport>,
    pub domain_age: SignalResult<DomainAge>,
    pub traffic: SignalResult<TrafficRank>,
    pub keywords: SignalResult<KeywordReport>,
    pub social: SignalResult<SocialLinks>,
    pub search_console: SignalResult<SearchConsoleReport>,
}

/// 全部信号的提供方集合
pub struct ProviderSet {
    pub pagespeed: ProviderChain<PageSpeedReport>,
    pub safe_browsing: ProviderChain<ReputationVerdict>,
    pub content_policy: ProviderChain<PolicyReport>,
    pub domain_age: ProviderChain<DomainAge>,
    pub traffic: ProviderChain<TrafficRank>,
    pub keywords: ProviderChain<KeywordReport>,
    pub social: ProviderChain<SocialLinks>,
    pub search_console: ProviderChain<SearchConsoleReport>,
}

impl ProviderSet {
    /// 根据配置组装各信号的责任链
    ///
    /// 凭据缺失的付费来源仍会加入链中，调用时返回 `NotConfigured` 并跳过
    pub fn from_settings(
        settings: &Settings,
        generative: Arc<dyn GenerativeContent>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.scan.user_agent.clone())
            .build()?;
        let providers = &settings.providers;

        Ok(Self {
            pagespeed: ProviderChain::new("pagespeed")
                .with(Arc::new(pagespeed::PageSpeedApi::new(
                    client.clone(),
                    providers.pagespeed_url.clone(),
                    providers.pagespeed_api_key.clone(),
                    Duration::from_millis(providers.pagespeed_delay_ms),
                )))
                .with(Arc::new(pagespeed::LocalPerformanceHeuristic)),
            safe_browsing: ProviderChain::new("safe_browsing").with(Arc::new(
                safe_browsing::SafeBrowsingApi::new(
                    client.clone(),
                    providers.safe_browsing_url.clone(),
                    providers.safe_browsing_api_key.clone(),
                ),
            )),
            content_policy: ProviderChain::new("content_policy")
                .with(Arc::new(content_policy::GenerativePolicyAnalyzer::new(
                    generative,
                )))
                .with(Arc::new(content_policy::KeywordPolicyHeuristic)),
            domain_age: ProviderChain::new("domain_age")
                .with(Arc::new(domain_age::WhoisXmlApi::new(
                    client.clone(),
                    providers.whois_url.clone(),
                    providers.whois_api_key.clone(),
                )))
                .with(Arc::new(domain_age::RdapLookup::new(
                    client.clone(),
                    providers.rdap_url.clone(),
                ))),
            traffic: ProviderChain::new("traffic").with(Arc::new(traffic::PageRankApi::new(
                client.clone(),
                providers.traffic_url.clone(),
                providers.traffic_api_key.clone(),
            ))),
            keywords: ProviderChain::new("keywords")
                .with(Arc::new(keywords::KeywordApi::new(
                    client.clone(),
                    providers.keyword_url.clone(),
                    providers.keyword_api_key.clone(),
                )))
                .with(Arc::new(keywords::LocalTermFrequency)),
            social: ProviderChain::new("social")
                .with(Arc::new(social::BrandApi::new(
                    client.clone(),
                    providers.social_url.clone(),
                    providers.social_api_key.clone(),
                )))
                .with(Arc::new(social::LocalLinkScan)),
            search_console: ProviderChain::new("search_console").with(Arc::new(
                search_console::SearchConsoleApi::new(client, providers.search_console_url.clone()),
            )),
        })
    }

    /// 并发收集全部信号
    pub async fn collect(&self, subject: &ProbeSubject) -> ProviderSignals {
        let (
            pagespeed,
            safe_browsing,
            content_policy,
            domain_age,
            traffic,
            keywords,
            social,
            search_console,
        ) = tokio::join!(
            self.pagespeed.resolve(subject),
            self.safe_browsing.resolve(subject),
            self.content_policy.resolve(subject),
            self.domain_age.resolve(subject),
            self.traffic.resolve(subject),
            self.keywords.resolve(subject),
            self.social.resolve(subject),
            self.search_console.resolve(subject),
        );

        ProviderSignals {
            pagespeed,
            safe_browsing,
            content_policy,
            domain_age,
            traffic,
            keywords,
            social,
            search_console,
        }
    }
}
