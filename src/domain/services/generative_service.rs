// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::reports::PolicyReport;
use crate::domain::models::result_bundle::TrustCategory;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// 标记回退内容的前缀
pub const FALLBACK_LABEL: &str = "[fallback]";

/// 一条排序后的建议
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub description: String,
    /// high / medium / low
    pub priority: String,
}

/// 生成式内容特质
///
/// 由 LLM 客户端实现；错误可直接向上返回，由 [`GenerativeService`] 负责降级
#[async_trait]
pub trait GenerativeContent: Send + Sync {
    /// 是否配置了可用凭据
    fn is_configured(&self) -> bool {
        true
    }

    /// 生成合规页面草稿（HTML 片段）
    async fn draft_page(&self, domain: &str, category: TrustCategory) -> Result<String>;

    /// 内容改进建议
    async fn content_improvements(&self, domain: &str, snapshot: &Value)
        -> Result<Vec<Suggestion>>;

    /// 变现方式建议
    async fn monetization_suggestions(
        &self,
        domain: &str,
        snapshot: &Value,
    ) -> Result<Vec<Suggestion>>;

    /// 申诉信草稿
    async fn appeal_letter(&self, domain: &str, violations: &[String]) -> Result<String>;

    /// 内容政策分析
    async fn policy_analysis(&self, text: &str) -> Result<PolicyReport>;
}

/// 生成式内容服务
///
/// 包装 [`GenerativeContent`]，调用失败或未配置时返回带 `[fallback]` 标记的内容，从不返回错误
#[derive(Clone)]
pub struct GenerativeService {
    inner: Arc<dyn GenerativeContent>,
}

impl GenerativeService {
    pub fn new(inner: Arc<dyn GenerativeContent>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> Arc<dyn GenerativeContent> {
        self.inner.clone()
    }

    /// 生成页面草稿
    ///
    /// # 参数
    ///
    /// * `domain` - 站点域名
    /// * `category` - 信任页面类别
    ///
    /// # 返回值
    ///
    /// 生成的 HTML 片段；失败时为带标记的模板草稿
    pub async fn draft_page(&self, domain: &str, category: TrustCategory) -> String {
        match self.inner.draft_page(domain, category).await {
            Ok(draft) if !draft.trim().is_empty() => draft,
            Ok(_) => fallback_draft(domain, category),
            Err(e) => {
                warn!("Draft generation for {} ({}) failed: {}", domain, category, e);
                fallback_draft(domain, category)
            }
        }
    }

    pub async fn content_improvements(&self, domain: &str, snapshot: &Value) -> Vec<Suggestion> {
        match self.inner.content_improvements(domain, snapshot).await {
            Ok(list) if !list.is_empty() => list,
            Ok(_) => fallback_improvements(),
            Err(e) => {
                warn!("Content improvements for {} failed: {}", domain, e);
                fallback_improvements()
            }
        }
    }

    pub async fn monetization_suggestions(&self, domain: &str, snapshot: &Value) -> Vec<Suggestion> {
        match self.inner.monetization_suggestions(domain, snapshot).await {
            Ok(list) if !list.is_empty() => list,
            Ok(_) => fallback_monetization(),
            Err(e) => {
                warn!("Monetization suggestions for {} failed: {}", domain, e);
                fallback_monetization()
            }
        }
    }

    pub async fn appeal_letter(&self, domain: &str, violations: &[String]) -> String {
        match self.inner.appeal_letter(domain, violations).await {
            Ok(letter) if !letter.trim().is_empty() => letter,
            Ok(_) => fallback_appeal(domain, violations),
            Err(e) => {
                warn!("Appeal letter for {} failed: {}", domain, e);
                fallback_appeal(domain, violations)
            }
        }
    }
}

fn suggestion(title: &str, description: &str, priority: &str) -> Suggestion {
    Suggestion {
        title: format!("{} {}", FALLBACK_LABEL, title),
        description: description.to_string(),
        priority: priority.to_string(),
    }
}

/// 模板草稿
pub fn fallback_draft(domain: &str, category: TrustCategory) -> String {
    let domain = html_escape::encode_text(domain);
    let (heading, body) = match category {
        TrustCategory::Privacy => (
            "Privacy Policy",
            "This policy explains what information we collect when you visit the site, \
             how we use it, and the choices you have. We use cookies and similar technologies, \
             including third-party advertising partners such as Google, to serve ads based on \
             prior visits. You can opt out of personalised advertising in your ad settings.",
        ),
        TrustCategory::About => (
            "About Us",
            "Describe who runs this site, the topics it covers, and the editorial standards \
             you follow. Real names, experience, and a clear purpose build reader trust.",
        ),
        TrustCategory::Contact => (
            "Contact Us",
            "Readers can reach us by email or through the contact form below. \
             Add a working email address and, where appropriate, a postal address or phone number.",
        ),
        TrustCategory::Terms => (
            "Terms of Service",
            "By using this site you agree to these terms. Content is provided for general \
             information, may change without notice, and may not be reproduced without permission.",
        ),
        TrustCategory::Disclaimer => (
            "Disclaimer",
            "The information on this site is provided in good faith for general purposes only. \
             We make no warranty about its completeness or accuracy, and some links may be \
             affiliate links from which we earn a commission.",
        ),
    };
    format!(
        "<!-- {label} generated from a template; review before publishing -->\n\
         <h1>{heading}</h1>\n<p>{body}</p>\n<p>Site: {domain}</p>",
        label = FALLBACK_LABEL,
        heading = heading,
        body = body,
        domain = domain,
    )
}

fn fallback_improvements() -> Vec<Suggestion> {
    vec![
        suggestion(
            "Expand thin pages",
            "Bring every indexable article above 600 words of original, useful content.",
            "high",
        ),
        suggestion(
            "Fix heading structure",
            "Use exactly one H1 per page and nest H2/H3 sub-headings beneath it.",
            "medium",
        ),
        suggestion(
            "Tune meta tags",
            "Keep titles between 50 and 60 characters and descriptions between 120 and 160.",
            "low",
        ),
    ]
}

fn fallback_monetization() -> Vec<Suggestion> {
    vec![
        suggestion(
            "Display advertising",
            "Apply to an ad network once trust pages and content depth are in place.",
            "high",
        ),
        suggestion(
            "Affiliate partnerships",
            "Recommend products relevant to your niche with clearly disclosed affiliate links.",
            "medium",
        ),
        suggestion(
            "Email newsletter",
            "Grow a subscriber list to diversify traffic and sponsorship income.",
            "low",
        ),
    ]
}

fn fallback_appeal(domain: &str, violations: &[String]) -> String {
    let listed = if violations.is_empty() {
        "the issues identified in the review".to_string()
    } else {
        violations.join("; ")
    };
    format!(
        "{label} Dear review team,\n\n\
         We are writing to request a re-review of {domain}. Since the previous decision we have \
         addressed {listed}. All affected content has been revised or removed, and our privacy, \
         contact and about pages have been updated.\n\n\
         Thank you for your time and consideration.\n",
        label = FALLBACK_LABEL,
        domain = domain,
        listed = listed,
    )
}
