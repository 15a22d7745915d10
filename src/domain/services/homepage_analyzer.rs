// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 首页分析
//!
//! 对解析后的首页文档做一次性、无副作用的结构化信号提取。
//! 这里的函数都是同步的，调用方不得跨 `.await` 持有 `Html`。

use crate::domain::models::result_bundle::{
    CacheControl, CanonicalCheck, CookieConsent, Headings, ImageStats, MetaTagsAnalysis,
    RedirectSummary, SecurityHeaders, SeoIndexingData, StructuredData,
};
use crate::engines::fetcher::FetchedPage;
use crate::utils::{text_stats, url_utils};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use url::Url;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static META_DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector(r#"meta[name="description"]"#));
static OG_TITLE: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property="og:title"]"#));
static OG_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| selector(r#"meta[property="og:description"]"#));
static CANONICAL: Lazy<Selector> = Lazy::new(|| selector(r#"link[rel="canonical"][href]"#));
static H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static H2: Lazy<Selector> = Lazy::new(|| selector("h2"));
static H3: Lazy<Selector> = Lazy::new(|| selector("h3"));
static JSON_LD: Lazy<Selector> = Lazy::new(|| selector(r#"script[type="application/ld+json"]"#));
static MICRODATA: Lazy<Selector> = Lazy::new(|| selector("[itemtype]"));
static IMG: Lazy<Selector> = Lazy::new(|| selector("img"));
static WITH_ID: Lazy<Selector> = Lazy::new(|| selector("[id]"));
static WITH_CLASS: Lazy<Selector> = Lazy::new(|| selector("[class]"));
static FORM: Lazy<Selector> = Lazy::new(|| selector("form"));
static PASSIVE_SRC: Lazy<Selector> =
    Lazy::new(|| selector("img[src], script[src], iframe[src], audio[src], video[src], source[src]"));
static STYLESHEET: Lazy<Selector> = Lazy::new(|| selector(r#"link[rel~="stylesheet"][href]"#));

/// 标题最佳长度区间（字符）
pub const TITLE_BAND: (usize, usize) = (50, 60);
/// 描述最佳长度区间（字符）
pub const DESCRIPTION_BAND: (usize, usize) = (120, 160);
/// 超过该跳数视为重定向链过长
pub const MAX_REDIRECT_HOPS: usize = 2;

const CONSENT_PHRASES: &[&str] = &[
    "we use cookies",
    "this website uses cookies",
    "this site uses cookies",
    "accept cookies",
    "accept all cookies",
    "cookie policy",
    "cookie settings",
    "cookie preferences",
    "cookie consent",
    "manage consent",
];

const CONSENT_MARKERS: &[&str] = &["cookie", "consent", "gdpr", "cmp", "onetrust", "cookiebot"];

/// 页面内的超链接
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    /// 去除片段标识的绝对地址
    pub url: Url,
    /// 折叠空白后的锚文本
    pub text: String,
}

/// 首页分析结果
#[derive(Debug, Clone, Default)]
pub struct HomepageSignals {
    pub redirects: RedirectSummary,
    pub headers: SecurityHeaders,
    pub cache_control: CacheControl,
    pub seo: SeoIndexingData,
    pub cookie_consent: CookieConsent,
    pub mixed_content_urls: Vec<String>,
    /// 按出现顺序去重后的链接
    pub anchors: Vec<Anchor>,
    pub text: String,
    pub word_count: usize,
    pub email_found: bool,
    pub phone_found: bool,
}

/// 分析已抓取的首页
///
/// # 参数
///
/// * `page` - 重定向后的首页响应
///
/// # 返回值
///
/// 首页的安全、SEO 与结构信号；关键词与 Search Console 字段由调用方稍后填充
pub fn analyze(page: &FetchedPage) -> HomepageSignals {
    let document = Html::parse_document(&page.body);
    let final_url = &page.final_url;

    let text = text_stats::visible_text(&document);
    let anchors = extract_anchors(&document, final_url);
    let (internal_links, external_links) = anchors.iter().fold((0, 0), |(int, ext), a| {
        if url_utils::same_origin(&a.url, final_url) {
            (int + 1, ext)
        } else {
            (int, ext + 1)
        }
    });

    let title = page_title(&document);
    let meta_description = meta_description(&document);
    let og_title = meta_content(&document, &OG_TITLE);
    let og_description = meta_content(&document, &OG_DESCRIPTION);

    let seo = SeoIndexingData {
        meta_tags_analysis: meta_tags_analysis(
            title.as_deref(),
            meta_description.as_deref(),
            og_title.is_some(),
            og_description.is_some(),
        ),
        title,
        meta_description,
        og_title,
        og_description,
        canonical: canonical_check(&document, final_url),
        headings: headings(&document),
        structured_data: structured_data(&document),
        images: image_stats(&document),
        internal_links,
        external_links,
        keywords: None,
        search_console: None,
    };

    HomepageSignals {
        redirects: redirect_summary(&page.redirect_chain),
        headers: security_headers(page),
        cache_control: cache_control(page.header("cache-control")),
        seo,
        cookie_consent: cookie_consent(&document, &text),
        mixed_content_urls: mixed_content(&document, final_url),
        word_count: text_stats::word_count(&text),
        email_found: text_stats::contains_email(&text),
        phone_found: text_stats::contains_phone(&text),
        anchors,
        text,
    }
}

/// 提取页面内所有 http(s) 链接，保持出现顺序并按地址去重
pub fn extract_anchors(document: &Html, base: &Url) -> Vec<Anchor> {
    let mut seen = HashSet::new();
    let mut anchors = Vec::new();

    for element in document.select(&ANCHOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        // Ignore fragment identifiers, mailto and javascript links
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("javascript:")
        {
            continue;
        }
        let Ok(url) = url_utils::resolve_url(base, href) else {
            continue;
        };
        if url.scheme() != "http" && url.scheme() != "https" {
            continue;
        }
        let url = url_utils::strip_fragment(url);
        if seen.insert(url.to_string()) {
            anchors.push(Anchor {
                url,
                text: element_text(&element),
            });
        }
    }

    anchors
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 页面标题（去除首尾空白，空标题视为缺失）
pub fn page_title(document: &Html) -> Option<String> {
    document
        .select(&TITLE)
        .next()
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
}

/// meta description 内容
pub fn meta_description(document: &Html) -> Option<String> {
    meta_content(document, &META_DESCRIPTION)
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

/// 重定向链摘要
pub fn redirect_summary(chain: &[String]) -> RedirectSummary {
    let hops = chain.len().saturating_sub(1);
    RedirectSummary {
        hops,
        chain: chain.to_vec(),
        excessive: hops > MAX_REDIRECT_HOPS,
    }
}

/// 校验安全响应头的取值
///
/// 仅有响应头不够：HSTS 需要有效的正 max-age，X-Frame-Options 只接受 DENY/SAMEORIGIN，
/// X-Content-Type-Options 必须为 nosniff，CSP 必须非空
pub fn security_headers(page: &FetchedPage) -> SecurityHeaders {
    let sts_max_age = page.header("strict-transport-security").and_then(hsts_max_age);
    SecurityHeaders {
        csp: page
            .header("content-security-policy")
            .is_some_and(|v| !v.trim().is_empty()),
        sts: sts_max_age.is_some_and(|age| age > 0),
        sts_max_age,
        frame_options: page.header("x-frame-options").is_some_and(|v| {
            let v = v.trim();
            v.eq_ignore_ascii_case("DENY") || v.eq_ignore_ascii_case("SAMEORIGIN")
        }),
        content_type_options: page
            .header("x-content-type-options")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("nosniff")),
    }
}

/// 解析 HSTS 头中的 max-age 指令
pub fn hsts_max_age(value: &str) -> Option<u64> {
    value.split(';').find_map(|directive| {
        let (name, raw) = directive.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("max-age") {
            return None;
        }
        raw.trim().trim_matches('"').parse().ok()
    })
}

/// Cache-Control 摘要
pub fn cache_control(value: Option<&str>) -> CacheControl {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => {
            let lower = v.to_ascii_lowercase();
            CacheControl {
                present: true,
                value: Some(v.to_string()),
                cacheable: !lower.contains("no-store") && !lower.contains("private"),
            }
        }
        None => CacheControl::default(),
    }
}

/// 标题与描述长度分析
pub fn meta_tags_analysis(
    title: Option<&str>,
    description: Option<&str>,
    og_title: bool,
    og_description: bool,
) -> MetaTagsAnalysis {
    let title_length = title.map(|t| t.chars().count()).unwrap_or(0);
    let description_length = description.map(|d| d.chars().count()).unwrap_or(0);
    MetaTagsAnalysis {
        title_length,
        title_optimal: (TITLE_BAND.0..=TITLE_BAND.1).contains(&title_length),
        description_length,
        description_optimal: (DESCRIPTION_BAND.0..=DESCRIPTION_BAND.1)
            .contains(&description_length),
        og_title,
        og_description,
    }
}

/// 规范链接冲突检测：主机或路径与最终地址不一致即为冲突
pub fn canonical_check(document: &Html, final_url: &Url) -> CanonicalCheck {
    let Some(href) = document
        .select(&CANONICAL)
        .next()
        .and_then(|el| el.value().attr("href"))
    else {
        return CanonicalCheck::default();
    };

    match url_utils::resolve_url(final_url, href.trim()) {
        Ok(canonical) => {
            let host_differs = url_utils::bare_host(&canonical) != url_utils::bare_host(final_url);
            let path_differs =
                canonical.path().trim_end_matches('/') != final_url.path().trim_end_matches('/');
            CanonicalCheck {
                url: Some(canonical.to_string()),
                conflict: host_differs || path_differs,
            }
        }
        Err(_) => CanonicalCheck {
            url: Some(href.to_string()),
            conflict: true,
        },
    }
}

/// 标题层级统计与异常
pub fn headings(document: &Html) -> Headings {
    let h1 = document.select(&H1).count();
    let h2 = document.select(&H2).count();
    let h3 = document.select(&H3).count();

    let mut anomalies = Vec::new();
    match h1 {
        0 => anomalies.push("missing_h1".to_string()),
        1 => {}
        _ => anomalies.push("multiple_h1".to_string()),
    }
    if h1 == 0 && h2 + h3 > 0 {
        anomalies.push("subheadings_without_h1".to_string());
    }

    Headings {
        h1,
        h2,
        h3,
        anomalies,
    }
}

/// 结构化数据统计
///
/// 统计 JSON-LD 块数量与可解析比例，收集 `@type`（含 `@graph` 内的类型）；
/// 微数据的 `itemtype` 同样计入类型
pub fn structured_data(document: &Html) -> StructuredData {
    let mut types = BTreeSet::new();
    let mut count = 0;
    let mut valid = 0;

    for block in document.select(&JSON_LD) {
        count += 1;
        let raw: String = block.text().collect();
        if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
            valid += 1;
            collect_types(&value, &mut types);
        }
    }

    let mut microdata = false;
    for element in document.select(&MICRODATA) {
        if let Some(itemtype) = element.value().attr("itemtype") {
            microdata = true;
            if let Some(name) = itemtype.trim_end_matches('/').rsplit('/').next() {
                if !name.is_empty() {
                    types.insert(name.to_string());
                }
            }
        }
    }

    StructuredData {
        detected: valid > 0 || microdata,
        count,
        valid,
        valid_ratio: ratio(valid, count),
        types: types.into_iter().collect(),
    }
}

fn collect_types(value: &Value, types: &mut BTreeSet<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_types(item, types)),
        Value::Object(map) => {
            match map.get("@type") {
                Some(Value::String(t)) => {
                    types.insert(t.clone());
                }
                Some(Value::Array(list)) => {
                    types.extend(list.iter().filter_map(Value::as_str).map(str::to_string));
                }
                _ => {}
            }
            if let Some(graph) = map.get("@graph") {
                collect_types(graph, types);
            }
        }
        _ => {}
    }
}

/// 图片懒加载与缺失 alt 比例
pub fn image_stats(document: &Html) -> ImageStats {
    let mut total = 0;
    let mut lazy_loaded = 0;
    let mut missing_alt = 0;

    for img in document.select(&IMG) {
        let el = img.value();
        total += 1;
        if el.attr("loading").is_some_and(|v| v.eq_ignore_ascii_case("lazy"))
            || el.attr("data-src").is_some()
        {
            lazy_loaded += 1;
        }
        if el.attr("alt").map(str::trim).unwrap_or("").is_empty() {
            missing_alt += 1;
        }
    }

    ImageStats {
        total,
        lazy_loaded,
        missing_alt,
        lazy_ratio: ratio(lazy_loaded, total),
        missing_alt_ratio: ratio(missing_alt, total),
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((part as f64 / total as f64) * 100.0).round() / 100.0
}

/// Cookie 同意横幅检测
///
/// 文本短语、元素 id、元素 class 三种手段相互独立，任一命中即视为检测到
pub fn cookie_consent(document: &Html, text: &str) -> CookieConsent {
    let lower = text.to_lowercase();
    let mut methods = Vec::new();

    if CONSENT_PHRASES.iter().any(|p| lower.contains(p)) {
        methods.push("text".to_string());
    }
    let has_marker = |value: &str| {
        let value = value.to_ascii_lowercase();
        CONSENT_MARKERS.iter().any(|m| value.contains(m))
    };
    if document
        .select(&WITH_ID)
        .filter_map(|el| el.value().attr("id"))
        .any(has_marker)
    {
        methods.push("id".to_string());
    }
    if document
        .select(&WITH_CLASS)
        .filter_map(|el| el.value().attr("class"))
        .any(has_marker)
    {
        methods.push("class".to_string());
    }

    CookieConsent {
        detected: !methods.is_empty(),
        methods,
    }
}

/// 混合内容检测
///
/// 仅当页面通过 HTTPS 提供时检查媒体、脚本、iframe 的 `src` 与样式表的 `href`
pub fn mixed_content(document: &Html, page_url: &Url) -> Vec<String> {
    if page_url.scheme() != "https" {
        return Vec::new();
    }
    let insecure = |value: &str| value.trim().to_ascii_lowercase().starts_with("http://");

    let mut seen = HashSet::new();
    document
        .select(&PASSIVE_SRC)
        .filter_map(|el| el.value().attr("src"))
        .chain(
            document
                .select(&STYLESHEET)
                .filter_map(|el| el.value().attr("href")),
        )
        .filter(|v| insecure(v))
        .map(|v| v.trim().to_string())
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// 页面是否包含表单
pub fn has_form(document: &Html) -> bool {
    document.select(&FORM).next().is_some()
}

#[cfg(test)]
#[path = "homepage_analyzer_test.rs"]
mod tests;
