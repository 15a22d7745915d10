// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::result_bundle::{TrustCategory, TrustPage, TrustPagesData};
use crate::domain::services::generative_service::GenerativeService;
use crate::domain::services::homepage_analyzer::{self, Anchor};
use crate::engines::fetcher::PageFetcher;
use crate::utils::{text_stats, url_utils};
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// 每个类别最多验证的候选页面数
pub const MAX_CANDIDATES: usize = 3;

struct CategoryRule {
    category: TrustCategory,
    /// 匹配最后一段路径（去掉扩展名），整段匹配
    path: Regex,
    /// 匹配锚文本
    anchor: Regex,
    /// 页面内容需包含的短语之一（联系页改用结构判断）
    phrases: &'static [&'static str],
}

fn rule(
    category: TrustCategory,
    path: &str,
    anchor: &str,
    phrases: &'static [&'static str],
) -> CategoryRule {
    CategoryRule {
        category,
        path: Regex::new(path).expect("trust path pattern is valid"),
        anchor: Regex::new(anchor).expect("trust anchor pattern is valid"),
        phrases,
    }
}

static RULES: Lazy<Vec<CategoryRule>> = Lazy::new(|| {
    vec![
        rule(
            TrustCategory::Privacy,
            r"^(?:privacy|privacy[-_]?(?:policy|notice|statement)|data[-_]?protection|gdpr)$",
            r"(?i)^privacy$|\bprivacy\s+(?:policy|notice|statement)\b|\bdata\s+protection\b",
            &[
                "personal data",
                "personal information",
                "information we collect",
                "we collect",
                "data we collect",
                "collection",
            ],
        ),
        rule(
            TrustCategory::About,
            r"^(?:about|about[-_]?(?:us|me)|who[-_]?we[-_]?are|our[-_]?story|our[-_]?team)$",
            r"(?i)^about$|\babout\s+(?:us|me)\b|\bwho\s+we\s+are\b|\bour\s+story\b",
            &[
                "about us",
                "about me",
                "who we are",
                "our mission",
                "our team",
                "our story",
                "founded",
                "we are",
                "i am",
            ],
        ),
        rule(
            TrustCategory::Contact,
            r"^(?:contact|contact[-_]?(?:us|me)|get[-_]?in[-_]?touch|reach[-_]?us)$",
            r"(?i)^contact$|\bcontact\s+(?:us|me)\b|\bget\s+in\s+touch\b|\breach\s+us\b",
            &[],
        ),
        rule(
            TrustCategory::Terms,
            r"^(?:terms|tos|terms[-_]?(?:of[-_]?(?:service|use)|and[-_]?conditions|conditions)|conditions)$",
            r"(?i)^terms$|\bterms\s+(?:of\s+(?:service|use)|and\s+conditions|&\s+conditions)\b",
            &[
                "terms of service",
                "terms of use",
                "terms and conditions",
                "you agree",
                "by using",
                "governing law",
                "liability",
            ],
        ),
        rule(
            TrustCategory::Disclaimer,
            r"^(?:disclaimer|disclaimers|disclosure|affiliate[-_]?disclosure)$",
            r"(?i)^disclaimer$|\bdisclaimers?\b|\baffiliate\s+disclosure\b",
            &[
                "disclaimer",
                "not responsible",
                "no warranty",
                "without warranty",
                "informational purposes",
                "affiliate",
                "liability",
            ],
        ),
    ]
});

fn rule_for(category: TrustCategory) -> &'static CategoryRule {
    RULES
        .iter()
        .find(|r| r.category == category)
        .unwrap_or(&RULES[0])
}

fn last_segment(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or("")
        .to_ascii_lowercase();
    match segment.rsplit_once('.') {
        Some((stem, ext)) if matches!(ext, "html" | "htm" | "php" | "aspx") => stem.to_string(),
        _ => segment,
    }
}

/// 为类别挑选候选链接
///
/// 只考虑同源链接；路径匹配的候选排在锚文本匹配之前，最多 [`MAX_CANDIDATES`] 个
pub fn candidates(anchors: &[Anchor], origin: &Url, category: TrustCategory) -> Vec<Url> {
    let rule = rule_for(category);
    let same_origin: Vec<&Anchor> = anchors
        .iter()
        .filter(|a| url_utils::same_origin(&a.url, origin))
        .collect();

    let by_path = same_origin
        .iter()
        .filter(|a| rule.path.is_match(&last_segment(&a.url)));
    let by_text = same_origin
        .iter()
        .filter(|a| !rule.path.is_match(&last_segment(&a.url)) && rule.anchor.is_match(a.text.trim()));

    let mut picked: Vec<Url> = Vec::new();
    for anchor in by_path.chain(by_text) {
        if !picked.contains(&anchor.url) {
            picked.push(anchor.url.clone());
        }
        if picked.len() == MAX_CANDIDATES {
            break;
        }
    }
    picked
}

/// 候选页面的内容特征
#[derive(Debug, Clone, Default)]
pub struct PageEvidence {
    pub word_count: usize,
    pub text: String,
    pub has_form: bool,
    pub email_found: bool,
    pub phone_found: bool,
}

impl PageEvidence {
    pub fn from_html(body: &str) -> Self {
        let document = Html::parse_document(body);
        let text = text_stats::visible_text(&document);
        Self {
            word_count: text_stats::word_count(&text),
            has_form: homepage_analyzer::has_form(&document),
            email_found: text_stats::contains_email(&text),
            phone_found: text_stats::contains_phone(&text),
            text: text.to_lowercase(),
        }
    }
}

/// 页面是否通过类别验证
///
/// 正文必须超过 `min_words` 个词，并满足类别专属的短语或结构检查
pub fn passes(category: TrustCategory, evidence: &PageEvidence, min_words: usize) -> bool {
    if evidence.word_count <= min_words {
        return false;
    }
    match category {
        TrustCategory::Contact => {
            evidence.email_found || evidence.phone_found || evidence.has_form
        }
        other => rule_for(other)
            .phrases
            .iter()
            .any(|phrase| evidence.text.contains(phrase)),
    }
}

/// 信任页面验证器
pub struct TrustPageValidator {
    fetcher: Arc<PageFetcher>,
    generative: GenerativeService,
    min_words: usize,
    timeout: Duration,
}

impl TrustPageValidator {
    pub fn new(
        fetcher: Arc<PageFetcher>,
        generative: GenerativeService,
        min_words: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            generative,
            min_words,
            timeout,
        }
    }

    /// 并发验证五个类别
    ///
    /// # 参数
    ///
    /// * `anchors` - 首页链接
    /// * `origin` - 首页最终地址
    /// * `domain` - 站点域名（用于生成草稿）
    ///
    /// # 返回值
    ///
    /// 每个类别的验证结果与摘要；缺失类别附带生成的补救草稿
    pub async fn validate(&self, anchors: &[Anchor], origin: &Url, domain: &str) -> TrustPagesData {
        let checks = TrustCategory::ALL
            .into_iter()
            .map(|category| self.validate_category(anchors, origin, domain, category));
        let results = join_all(checks).await;

        let mut data = TrustPagesData::default();
        for (category, page, draft) in results {
            data.summary.insert(category, page.exists);
            data.pages.insert(category, page);
            if let Some(draft) = draft {
                data.drafts.insert(category, draft);
            }
        }
        data
    }

    async fn validate_category(
        &self,
        anchors: &[Anchor],
        origin: &Url,
        domain: &str,
        category: TrustCategory,
    ) -> (TrustCategory, TrustPage, Option<String>) {
        let candidates = candidates(anchors, origin, category);
        let mut checked = 0;

        for candidate in &candidates {
            checked += 1;
            let page = match self.fetcher.fetch_document(candidate, self.timeout).await {
                Ok(page) if page.status < 400 => page,
                Ok(page) => {
                    debug!("Trust candidate {} returned {}", candidate, page.status);
                    continue;
                }
                Err(e) => {
                    debug!("Trust candidate {} failed: {}", candidate, e);
                    continue;
                }
            };
            let evidence = PageEvidence::from_html(&page.body);
            if passes(category, &evidence, self.min_words) {
                info!("Validated {} page at {}", category, candidate);
                return (
                    category,
                    TrustPage {
                        exists: true,
                        url: Some(candidate.to_string()),
                        word_count: Some(evidence.word_count),
                        candidates_checked: checked,
                    },
                    None,
                );
            }
            debug!(
                "Trust candidate {} rejected for {} ({} words)",
                candidate, category, evidence.word_count
            );
        }

        info!("No valid {} page found; requesting draft", category);
        let draft = self.generative.draft_page(domain, category).await;
        (
            category,
            TrustPage {
                exists: false,
                candidates_checked: checked,
                ..Default::default()
            },
            Some(draft),
        )
    }
}
