// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 评分与决策
//!
//! 给定完整结果集时是确定的、无副作用的纯函数。

use crate::domain::models::reports::ReputationStatus;
use crate::domain::models::result_bundle::{ResultBundle, TrustCategory};
use crate::domain::models::score::{ChecklistItem, ScoreCard, Severity};

/// 基础分
pub const BASE_SCORE: i32 = 100;
/// 整改清单条目上限
pub const MAX_CHECKLIST: usize = 10;

const TLS_FAILURE_CAP: u8 = 5;
const POLICY_RISK_CAP: u8 = 10;

/// 一条评分规则：谓词返回分值变化，未触发时为 0
struct ScoreRule {
    id: &'static str,
    severity: Severity,
    title: &'static str,
    recommendation: &'static str,
    delta: fn(&ResultBundle) -> i32,
}

fn policy_risk(bundle: &ResultBundle) -> Option<u8> {
    bundle
        .core
        .ai_policy
        .as_ref()
        .and_then(|signal| signal.payload())
        .map(|report| report.risk_score)
}

fn performance_score(bundle: &ResultBundle) -> Option<u8> {
    bundle
        .core
        .pagespeed
        .as_ref()
        .and_then(|signal| signal.payload())
        .map(|report| report.score)
}

fn domain_age_days(bundle: &ResultBundle) -> Option<i64> {
    bundle
        .core
        .domain_age
        .as_ref()
        .and_then(|signal| signal.payload())
        .map(|age| age.age_days)
}

fn reputation_unsafe(bundle: &ResultBundle) -> bool {
    bundle.security.safe_browsing.status == ReputationStatus::Unsafe
}

fn tls_failed(bundle: &ResultBundle) -> bool {
    !bundle.core.ssl_check.passed()
}

/// 固定顺序的扣分表
static RULES: &[ScoreRule] = &[
    ScoreRule {
        id: "ssl",
        severity: Severity::Critical,
        title: "TLS certificate check failed",
        recommendation: "Serve the site over HTTPS with a valid, unexpired certificate.",
        delta: |b| if tls_failed(b) { -20 } else { 0 },
    },
    ScoreRule {
        id: "mixed_content",
        severity: Severity::Warning,
        title: "Mixed content on HTTPS pages",
        recommendation: "Load every image, script, iframe and stylesheet over https://.",
        delta: |b| if b.security.mixed_content { -10 } else { 0 },
    },
    ScoreRule {
        id: "safe_browsing",
        severity: Severity::Critical,
        title: "URL flagged by reputation service",
        recommendation: "Remove malware or phishing content and request a security review.",
        delta: |b| if reputation_unsafe(b) { -50 } else { 0 },
    },
    ScoreRule {
        id: "privacy_page",
        severity: Severity::Critical,
        title: "Privacy policy missing",
        recommendation: "Publish a privacy policy that discloses cookie and advertising use.",
        delta: |b| if b.trust_pages.has(TrustCategory::Privacy) { 0 } else { -15 },
    },
    ScoreRule {
        id: "contact_page",
        severity: Severity::Warning,
        title: "Contact page missing",
        recommendation: "Add a contact page with an email address, phone number or form.",
        delta: |b| if b.trust_pages.has(TrustCategory::Contact) { 0 } else { -10 },
    },
    ScoreRule {
        id: "about_page",
        severity: Severity::Warning,
        title: "About page missing",
        recommendation: "Add an about page describing who runs the site and why.",
        delta: |b| if b.trust_pages.has(TrustCategory::About) { 0 } else { -5 },
    },
    ScoreRule {
        id: "sitemap",
        severity: Severity::Warning,
        title: "No sitemap found",
        recommendation: "Publish /sitemap.xml and reference it from robots.txt.",
        delta: |b| if b.core.sitemap_xml.exists { 0 } else { -10 },
    },
    ScoreRule {
        id: "broken_links",
        severity: Severity::Warning,
        title: "Broken links found",
        recommendation: "Fix or remove links that return errors.",
        delta: |b| if b.core.broken_links.total() > 0 { -5 } else { 0 },
    },
    ScoreRule {
        id: "structured_data",
        severity: Severity::Warning,
        title: "No structured data",
        recommendation: "Add JSON-LD describing the site, organization and articles.",
        delta: |b| if b.seo_indexing.structured_data.detected { 0 } else { -5 },
    },
    ScoreRule {
        id: "content_policy",
        severity: Severity::Critical,
        title: "Content policy risk",
        recommendation: "Remove content that violates publisher policies before applying.",
        delta: |b| match policy_risk(b) {
            Some(risk) if risk > 70 => -30,
            Some(risk) if risk > 30 => -15,
            _ => 0,
        },
    },
    ScoreRule {
        id: "thin_content",
        severity: Severity::Warning,
        title: "Thin content pages",
        recommendation: "Expand short pages with substantial original content or noindex them.",
        delta: |b| if b.core.content_analysis.has_thin_content { -15 } else { 0 },
    },
    ScoreRule {
        id: "performance",
        severity: Severity::Warning,
        title: "Slow page performance",
        recommendation: "Reduce render-blocking resources and optimize images to improve load time.",
        delta: |b| match performance_score(b) {
            Some(score) if score < 50 => -20,
            Some(score) if score < 80 => -10,
            _ => 0,
        },
    },
    ScoreRule {
        id: "domain_age",
        severity: Severity::Warning,
        title: "Domain is very new",
        recommendation: "Keep publishing; young domains are often asked to wait before approval.",
        delta: |b| match domain_age_days(b) {
            Some(days) if days < 180 => -10,
            Some(days) if days > 730 => 5,
            _ => 0,
        },
    },
];

/// 计算综合分、通过概率与整改清单
///
/// # 参数
///
/// * `bundle` - 完整的扫描结果集
///
/// # 返回值
///
/// 相同输入总是得到相同输出；分数与概率都在 `[0, 100]` 内
pub fn score(bundle: &ResultBundle) -> ScoreCard {
    let mut total = BASE_SCORE;
    let mut checklist = Vec::new();

    for rule in RULES {
        let delta = (rule.delta)(bundle);
        total += delta;
        if delta < 0 {
            checklist.push(ChecklistItem {
                id: rule.id.to_string(),
                severity: rule.severity,
                title: rule.title.to_string(),
                recommendation: rule.recommendation.to_string(),
                points: delta.unsigned_abs().min(100) as u8,
            });
        }
    }

    let overall_score = total.clamp(0, 100) as u8;

    // Near-certain rejection conditions override the additive score
    let mut approval_probability = overall_score;
    if tls_failed(bundle) {
        approval_probability = approval_probability.min(TLS_FAILURE_CAP);
    }
    if reputation_unsafe(bundle) {
        approval_probability = 0;
    }
    if policy_risk(bundle).is_some_and(|risk| risk > 70) {
        approval_probability = approval_probability.min(POLICY_RISK_CAP);
    }

    // Stable sort keeps table order within a severity
    checklist.sort_by_key(|item| item.severity);
    checklist.truncate(MAX_CHECKLIST);

    let (confidence, unavailable_signals) = confidence(bundle);

    ScoreCard {
        overall_score,
        approval_probability,
        checklist,
        confidence,
        unavailable_signals,
    }
}

/// 参与评分的外部信号可用比例
fn confidence(bundle: &ResultBundle) -> (f64, Vec<String>) {
    let core = &bundle.core;
    let signals = [
        ("pagespeed", core.pagespeed.as_ref().is_some_and(|s| s.is_available())),
        ("content_policy", core.ai_policy.as_ref().is_some_and(|s| s.is_available())),
        ("domain_age", core.domain_age.as_ref().is_some_and(|s| s.is_available())),
        (
            "safe_browsing",
            bundle.security.safe_browsing.status != ReputationStatus::Unknown,
        ),
    ];

    let available = signals.iter().filter(|(_, ok)| *ok).count();
    let missing = signals
        .iter()
        .filter(|(_, ok)| !*ok)
        .map(|(name, _)| name.to_string())
        .collect();
    let ratio = (available as f64 / signals.len() as f64 * 100.0).round() / 100.0;
    (ratio, missing)
}

#[cfg(test)]
#[path = "scoring_service_test.rs"]
mod tests;
