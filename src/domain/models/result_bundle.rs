// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::reports::{
    DomainAge, KeywordReport, PageSpeedReport, PolicyReport, SafeBrowsingCheck,
    SearchConsoleReport, SocialLinks, SslCheck, TrafficRank,
};
use super::score::ChecklistItem;
use super::signal::SignalResult;

/// 扫描结果集
///
/// 四个分组在一次扫描执行内逐步填充，持久化时整体替换
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultBundle {
    pub core: CoreScanData,
    pub trust_pages: TrustPagesData,
    pub seo_indexing: SeoIndexingData,
    pub security: SecurityData,
}

/// 重定向链摘要
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RedirectSummary {
    pub hops: usize,
    pub chain: Vec<String>,
    /// 超过 2 跳
    pub excessive: bool,
}

/// HTTP 降级检查：HTTPS 站点的 http:// 孪生地址是否跳回 HTTPS
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DowngradeCheck {
    pub http_url: String,
    pub redirects_to_https: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RobotsTxt {
    pub exists: bool,
    pub url: String,
    pub has_disallow_all: bool,
    pub adsense_crawler_allowed: bool,
    pub sitemaps: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SitemapXml {
    pub exists: bool,
    pub url: String,
    pub from_robots: bool,
}

/// 断链普查
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BrokenLinks {
    /// 抽样复核的链接数
    pub checked: usize,
    /// 抽样复核中失效的链接数
    pub broken: usize,
    /// 爬取过程中抓取失败或状态码 ≥400 的页面数
    pub crawl_broken: usize,
    pub broken_urls: Vec<String>,
}

impl BrokenLinks {
    pub fn total(&self) -> usize {
        self.broken + self.crawl_broken
    }
}

/// 多页面内容分析
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentAnalysis {
    pub pages_scanned: usize,
    pub total_words: usize,
    pub thin_content_pages: Vec<String>,
    pub has_thin_content: bool,
    pub keyword_stuffed_pages: Vec<String>,
    pub keyword_stuffed: bool,
    pub pages_missing_title: Vec<String>,
    pub pages_missing_description: Vec<String>,
    pub mixed_content_pages: Vec<String>,
    pub email_found: bool,
    pub phone_found: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CookieConsent {
    pub detected: bool,
    /// 命中的检测手段：text / id / class
    pub methods: Vec<String>,
}

/// 核心扫描数据
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoreScanData {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage_error: Option<String>,
    pub redirects: RedirectSummary,
    pub ssl_check: SslCheck,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https_downgrade: Option<DowngradeCheck>,
    pub robots_txt: RobotsTxt,
    pub sitemap_xml: SitemapXml,
    pub broken_links: BrokenLinks,
    pub content_analysis: ContentAnalysis,
    pub cookie_consent: CookieConsent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_policy: Option<SignalResult<PolicyReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagespeed: Option<SignalResult<PageSpeedReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_age: Option<SignalResult<DomainAge>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic: Option<SignalResult<TrafficRank>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_links: Option<SignalResult<SocialLinks>>,
    /// 评分后写入的优先整改清单
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub priority_checklist: Vec<ChecklistItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_confidence: Option<f64>,
}

/// 信任页面类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustCategory {
    Privacy,
    About,
    Contact,
    Terms,
    Disclaimer,
}

impl TrustCategory {
    pub const ALL: [TrustCategory; 5] = [
        TrustCategory::Privacy,
        TrustCategory::About,
        TrustCategory::Contact,
        TrustCategory::Terms,
        TrustCategory::Disclaimer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TrustCategory::Privacy => "privacy",
            TrustCategory::About => "about",
            TrustCategory::Contact => "contact",
            TrustCategory::Terms => "terms",
            TrustCategory::Disclaimer => "disclaimer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for TrustCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个信任页面的验证结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrustPage {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    pub candidates_checked: usize,
}

/// 信任页面数据
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrustPagesData {
    pub pages: BTreeMap<TrustCategory, TrustPage>,
    pub summary: BTreeMap<TrustCategory, bool>,
    /// 缺失类别的补救草稿（HTML 片段），并非已验证页面
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub drafts: BTreeMap<TrustCategory, String>,
}

impl TrustPagesData {
    pub fn has(&self, category: TrustCategory) -> bool {
        self.summary.get(&category).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetaTagsAnalysis {
    pub title_length: usize,
    pub title_optimal: bool,
    pub description_length: usize,
    pub description_optimal: bool,
    pub og_title: bool,
    pub og_description: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalCheck {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub conflict: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Headings {
    pub h1: usize,
    pub h2: usize,
    pub h3: usize,
    pub anomalies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructuredData {
    pub detected: bool,
    pub count: usize,
    pub valid: usize,
    pub valid_ratio: f64,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageStats {
    pub total: usize,
    pub lazy_loaded: usize,
    pub missing_alt: usize,
    pub lazy_ratio: f64,
    pub missing_alt_ratio: f64,
}

/// SEO 与索引数据
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeoIndexingData {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub meta_tags_analysis: MetaTagsAnalysis,
    pub canonical: CanonicalCheck,
    pub headings: Headings,
    pub structured_data: StructuredData,
    pub images: ImageStats,
    pub internal_links: usize,
    pub external_links: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<SignalResult<KeywordReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_console: Option<SignalResult<SearchConsoleReport>>,
}

/// 经过值校验的安全响应头集合
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SecurityHeaders {
    pub csp: bool,
    pub sts: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sts_max_age: Option<u64>,
    pub frame_options: bool,
    pub content_type_options: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheControl {
    pub present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub cacheable: bool,
}

/// 安全数据
#[derive(Debug, Clone, Default, Serialize)]
pub struct SecurityData {
    pub headers: SecurityHeaders,
    pub cache_control: CacheControl,
    pub mixed_content: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mixed_content_urls: Vec<String>,
    pub safe_browsing: SafeBrowsingCheck,
}
