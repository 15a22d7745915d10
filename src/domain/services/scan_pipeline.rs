// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::domain::models::reports::SafeBrowsingCheck;
use crate::domain::models::result_bundle::{ResultBundle, RobotsTxt, SitemapXml};
use crate::domain::models::scan_job::{DomainError, ScanJob};
use crate::domain::models::score::ScoreCard;
use crate::domain::repositories::notification_repository::IntegrationRepository;
use crate::domain::repositories::scan_repository::RepositoryError;
use crate::domain::services::crawl_service::{CrawlConfig, CrawlOutcome, CrawlService};
use crate::domain::services::generative_service::GenerativeService;
use crate::domain::services::homepage_analyzer::{self, HomepageSignals};
use crate::domain::services::scoring_service;
use crate::domain::services::trust_page_validator::TrustPageValidator;
use crate::engines::fetcher::{FetchedPage, PageFetcher};
use crate::engines::providers::{ProbeSubject, ProviderSet, ProviderSignals};
use crate::engines::tls_inspector::TlsInspector;
use crate::utils::validators::{self, ValidationError};
use crate::utils::{robots, url_utils};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;
use uuid::Uuid;

/// 绑定 Search Console 的授权提供方名称
const GOOGLE_PROVIDER: &str = "google";

/// 扫描错误类型
#[derive(Error, Debug)]
pub enum ScanError {
    /// 站点不存在（对任务致命）
    #[error("Site {0} not found")]
    SiteNotFound(Uuid),
    /// 站点地址无效
    #[error("Invalid site URL: {0}")]
    InvalidSiteUrl(String),
    /// 目标被 SSRF 校验拒绝
    #[error("Target refused: {0}")]
    Blocked(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// 流水线内部未预期的错误
    #[error("Scan pipeline failed: {0}")]
    Pipeline(#[from] anyhow::Error),
}

/// 一次扫描的产出
#[derive(Debug, Clone)]
pub struct ScanOutput {
    pub domain: String,
    pub bundle: ResultBundle,
    pub card: ScoreCard,
}

/// 扫描流水线
///
/// 首页抓取 → 首页分析与站点探测 → 爬取、提供方信号、TLS、信任页面并发执行 → 汇总评分
pub struct ScanPipeline {
    settings: Arc<Settings>,
    fetcher: Arc<PageFetcher>,
    tls: TlsInspector,
    providers: ProviderSet,
    crawl: CrawlService,
    trust: TrustPageValidator,
    integrations: Arc<dyn IntegrationRepository>,
}

impl ScanPipeline {
    /// 根据配置组装流水线
    ///
    /// # 参数
    ///
    /// * `settings` - 应用配置
    /// * `generative` - 生成式内容服务（政策分析与页面草稿）
    /// * `integrations` - 第三方授权仓库
    pub fn new(
        settings: Arc<Settings>,
        generative: GenerativeService,
        integrations: Arc<dyn IntegrationRepository>,
    ) -> anyhow::Result<Self> {
        let scan = &settings.scan;
        let fetcher = Arc::new(PageFetcher::new(scan)?);
        let tls = TlsInspector::new(scan.tls_port, scan.probe_timeout())?;
        let providers = ProviderSet::from_settings(&settings, generative.inner())?;
        let crawl = CrawlService::new(fetcher.clone(), CrawlConfig::from(scan));
        let trust = TrustPageValidator::new(
            fetcher.clone(),
            generative,
            scan.trust_min_words,
            scan.page_timeout(),
        );

        Ok(Self {
            settings,
            fetcher,
            tls,
            providers,
            crawl,
            trust,
            integrations,
        })
    }

    /// 执行一次完整扫描
    ///
    /// # 参数
    ///
    /// * `job` - 已领取的扫描任务
    /// * `site_url` - 站点地址（可缺少协议）
    ///
    /// # 返回值
    ///
    /// * `Ok(ScanOutput)` - 结果集与评分；单个信号失败只会降级
    /// * `Err(ScanError)` - 地址无效或被拒绝等对任务致命的错误
    #[instrument(skip(self, job), fields(scan_id = %job.id, site_id = %job.site_id))]
    pub async fn run(&self, job: &ScanJob, site_url: &str) -> Result<ScanOutput, ScanError> {
        let scan = &self.settings.scan;
        let url = url_utils::normalize_site_url(site_url)
            .map_err(|e| ScanError::InvalidSiteUrl(format!("{} ({})", site_url, e)))?;
        validators::validate_target(&url, scan.allow_private_targets).await?;
        let domain = url_utils::bare_host(&url)
            .ok_or_else(|| ScanError::InvalidSiteUrl(site_url.to_string()))?;

        info!("Scanning {}", url);

        // Homepage must complete before anything that needs its links and text
        let homepage = match self.fetcher.fetch_document(&url, scan.homepage_timeout()).await {
            Ok(page) => {
                info!(
                    "Homepage {} returned {} in {}ms",
                    page.final_url, page.status, page.response_time_ms
                );
                Some(page)
            }
            Err(e) => {
                warn!("Homepage fetch failed for {}: {}", url, e);
                None
            }
        };
        let homepage_error = match &homepage {
            None => Some("homepage could not be fetched".to_string()),
            Some(page) if !page.is_success() => Some(format!("homepage returned {}", page.status)),
            Some(_) => None,
        };

        let final_url = homepage
            .as_ref()
            .map(|page| page.final_url.clone())
            .unwrap_or_else(|| url.clone());
        let signals = homepage
            .as_ref()
            .map(homepage_analyzer::analyze)
            .unwrap_or_default();

        let root = url_utils::origin_root(&final_url);
        let robots_txt = self.probe_robots(&root, scan.probe_timeout()).await;
        let sitemap_xml = self.probe_sitemap(&root, &robots_txt, scan.probe_timeout()).await;
        let https_downgrade = self
            .fetcher
            .downgrade_check(&final_url, scan.probe_timeout())
            .await;

        let subject = ProbeSubject {
            url: final_url.clone(),
            domain: domain.clone(),
            text: signals.text.clone(),
            links: signals.anchors.iter().map(|a| a.url.to_string()).collect(),
            response_time_ms: homepage.as_ref().map(|page| page.response_time_ms),
            page_bytes: homepage.as_ref().map(|page| page.body.len()).unwrap_or(0),
            integration_token: self.integration_token(job).await,
        };

        let crawl = async {
            match &homepage {
                Some(page) if page.is_success() => self.crawl.crawl(page).await,
                _ => CrawlOutcome::default(),
            }
        };
        let (crawl, provider_signals, ssl_check, trust_pages) = tokio::join!(
            crawl,
            self.providers.collect(&subject),
            self.tls.inspect(&final_url),
            self.trust.validate(&signals.anchors, &final_url, &domain),
        );

        let mut bundle = assemble(
            &url,
            homepage.as_ref(),
            signals,
            crawl,
            provider_signals,
            robots_txt,
            sitemap_xml,
        );
        bundle.core.homepage_error = homepage_error;
        bundle.core.ssl_check = ssl_check;
        bundle.core.https_downgrade = https_downgrade;
        bundle.trust_pages = trust_pages;

        let card = scoring_service::score(&bundle);
        bundle.core.priority_checklist = card.checklist.clone();
        bundle.core.signal_confidence = Some(card.confidence);

        info!(
            "Scan of {} scored {} (approval {}%)",
            domain, card.overall_score, card.approval_probability
        );

        Ok(ScanOutput {
            domain,
            bundle,
            card,
        })
    }

    async fn probe_robots(&self, root: &str, timeout: Duration) -> RobotsTxt {
        let url = format!("{}/robots.txt", root);
        match self.fetcher.get_text(&url, timeout).await {
            Ok((status, body)) if (200..300).contains(&status) => robots::analyze(&url, Some(&body)),
            Ok(_) => robots::analyze(&url, None),
            Err(e) => {
                warn!("robots.txt probe failed for {}: {}", url, e);
                robots::analyze(&url, None)
            }
        }
    }

    /// 先探测 `/sitemap.xml`，不存在时探测 robots.txt 中的第一个 `Sitemap:` 指令
    async fn probe_sitemap(&self, root: &str, robots_txt: &RobotsTxt, timeout: Duration) -> SitemapXml {
        let default_url = format!("{}/sitemap.xml", root);
        if self.reachable(&default_url, timeout).await {
            return SitemapXml {
                exists: true,
                url: default_url,
                from_robots: false,
            };
        }
        if let Some(directive) = robots_txt.sitemaps.first() {
            if self.reachable(directive, timeout).await {
                return SitemapXml {
                    exists: true,
                    url: directive.clone(),
                    from_robots: true,
                };
            }
        }
        SitemapXml {
            exists: false,
            url: default_url,
            from_robots: false,
        }
    }

    async fn reachable(&self, url: &str, timeout: Duration) -> bool {
        matches!(self.fetcher.probe(url, timeout).await, Ok(status) if status < 400)
    }

    async fn integration_token(&self, job: &ScanJob) -> Option<String> {
        let user_id = job.user_id?;
        match self.integrations.find_token(user_id, GOOGLE_PROVIDER).await {
            Ok(Some(token)) if token.is_usable(Utc::now()) => Some(token.access_token),
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to load integration token for user {}: {}", user_id, e);
                None
            }
        }
    }
}

/// 汇总首页、爬取与提供方信号为结果集
///
/// TLS、降级检查与信任页面由调用方单独写入
pub fn assemble(
    url: &Url,
    homepage: Option<&FetchedPage>,
    signals: HomepageSignals,
    crawl: CrawlOutcome,
    providers: ProviderSignals,
    robots_txt: RobotsTxt,
    sitemap_xml: SitemapXml,
) -> ResultBundle {
    let mut bundle = ResultBundle::default();

    let core = &mut bundle.core;
    core.url = url.to_string();
    if let Some(page) = homepage {
        core.final_url = Some(page.final_url.to_string());
        core.status_code = Some(page.status);
        core.response_time_ms = Some(page.response_time_ms);
    }
    core.redirects = signals.redirects;
    core.robots_txt = robots_txt;
    core.sitemap_xml = sitemap_xml;
    core.broken_links = crawl.broken_links;
    core.cookie_consent = signals.cookie_consent;
    core.ai_policy = Some(providers.content_policy);
    core.pagespeed = Some(providers.pagespeed);
    core.domain_age = Some(providers.domain_age);
    core.traffic = Some(providers.traffic);
    core.social_links = Some(providers.social);

    let mixed_pages = !crawl.content.mixed_content_pages.is_empty();
    core.content_analysis = crawl.content;

    bundle.seo_indexing = signals.seo;
    bundle.seo_indexing.keywords = Some(providers.keywords);
    bundle.seo_indexing.search_console = Some(providers.search_console);

    let security = &mut bundle.security;
    security.headers = signals.headers;
    security.cache_control = signals.cache_control;
    security.mixed_content = !signals.mixed_content_urls.is_empty() || mixed_pages;
    security.mixed_content_urls = signals.mixed_content_urls;
    security.safe_browsing = SafeBrowsingCheck::from(&providers.safe_browsing);

    bundle
}
