// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::{ProbeSubject, ProviderError, SignalProvider};
use crate::domain::models::reports::PolicyReport;
use crate::domain::models::signal::SignalSource;
use crate::domain::services::generative_service::GenerativeContent;
use crate::utils::text_stats;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// 送入分析的文本上限（字符）
const MAX_POLICY_TEXT: usize = 4000;

/// 生成式内容政策分析
pub struct GenerativePolicyAnalyzer {
    generative: Arc<dyn GenerativeContent>,
}

impl GenerativePolicyAnalyzer {
    pub fn new(generative: Arc<dyn GenerativeContent>) -> Self {
        Self { generative }
    }
}

#[async_trait]
impl SignalProvider<PolicyReport> for GenerativePolicyAnalyzer {
    fn name(&self) -> &'static str {
        "generative_policy"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Premium
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(60)
    }

    async fn fetch(&self, subject: &ProbeSubject) -> Result<PolicyReport, ProviderError> {
        if !self.generative.is_configured() {
            return Err(ProviderError::NotConfigured);
        }
        let text = text_stats::truncate_chars(subject.text.trim(), MAX_POLICY_TEXT);
        if text.is_empty() {
            return Err(ProviderError::Malformed("no page text to analyze".into()));
        }
        let mut report = self
            .generative
            .policy_analysis(text)
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        report.risk_score = report.risk_score.min(100);
        if report.policy_violations.is_empty() {
            report.policy_violations = report.flags.clone();
        }
        Ok(report)
    }
}

struct PolicyCategory {
    label: &'static str,
    weight: u8,
    terms: &'static [&'static str],
    recommendation: &'static str,
}

const CATEGORIES: &[PolicyCategory] = &[
    PolicyCategory {
        label: "Adult or sexually explicit content",
        weight: 45,
        terms: &["porn", "xxx", "nude", "escort", "camgirl", "nsfw"],
        recommendation: "Remove sexually explicit material and links to adult sites.",
    },
    PolicyCategory {
        label: "Gambling content",
        weight: 35,
        terms: &["casino", "betting", "sportsbook", "poker", "slot machine", "jackpot"],
        recommendation: "Remove gambling promotions or restrict them to permitted regions.",
    },
    PolicyCategory {
        label: "Drug-related content",
        weight: 35,
        terms: &["cocaine", "heroin", "buy weed", "meth", "recreational drugs"],
        recommendation: "Remove content that promotes or sells illegal drugs.",
    },
    PolicyCategory {
        label: "Weapons content",
        weight: 30,
        terms: &["buy guns", "firearms for sale", "ammunition", "explosives"],
        recommendation: "Remove listings or promotion of weapons and ammunition.",
    },
    PolicyCategory {
        label: "Copyright infringement",
        weight: 30,
        terms: &["free download full movie", "cracked", "torrent", "keygen", "warez"],
        recommendation: "Remove pirated downloads and links to infringing content.",
    },
    PolicyCategory {
        label: "Hateful or violent content",
        weight: 40,
        terms: &["kill them all", "racial superiority", "ethnic cleansing"],
        recommendation: "Remove content that promotes hatred or violence.",
    },
];

/// 关键词内容政策估算
///
/// 按类别统计敏感词命中，每个命中类别累加权重，最高 100
pub struct KeywordPolicyHeuristic;

impl KeywordPolicyHeuristic {
    pub fn analyze(text: &str) -> PolicyReport {
        let lower = text.to_lowercase();
        let mut risk: u32 = 0;
        let mut flags = Vec::new();
        let mut recommendations = Vec::new();

        for category in CATEGORIES {
            if category.terms.iter().any(|term| contains_term(&lower, term)) {
                risk += category.weight as u32;
                flags.push(category.label.to_string());
                recommendations.push(category.recommendation.to_string());
            }
        }

        PolicyReport {
            issues_found: !flags.is_empty(),
            risk_score: risk.min(100) as u8,
            policy_violations: flags.clone(),
            flags,
            recommendations,
        }
    }
}

/// 整词匹配，避免 "meth" 命中 "method"
fn contains_term(haystack: &str, term: &str) -> bool {
    haystack.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        before_ok && after_ok
    })
}

#[async_trait]
impl SignalProvider<PolicyReport> for KeywordPolicyHeuristic {
    fn name(&self) -> &'static str {
        "keyword_policy"
    }

    fn source(&self) -> SignalSource {
        SignalSource::Fallback
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn fetch(&self, subject: &ProbeSubject) -> Result<PolicyReport, ProviderError> {
        Ok(Self::analyze(&subject.text))
    }
}
