// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 各信号提供方返回的负载类型

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::signal::{SignalResult, SignalSource};

/// 通过/失败二元检查状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    #[default]
    Failed,
}

/// TLS 证书检查结果
///
/// 握手超时或失败同样记为 `Failed`，而不是未知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SslCheck {
    pub status: CheckStatus,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub url_reached: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SslCheck {
    pub fn failed(url_reached: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Failed,
            valid: false,
            url_reached: url_reached.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Passed
    }
}

/// 性能审计结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PageSpeedReport {
    /// 0-100 性能分
    pub score: u8,
    /// 实际产出结果的设备策略（mobile/desktop/heuristic）
    pub strategy: String,
    pub lcp: Option<String>,
    pub cls: Option<String>,
    pub tbt: Option<String>,
    pub fcp: Option<String>,
    pub render_blocking_issues: usize,
    pub image_optimization_issues: usize,
    /// 是否包含真实用户（field）数据
    pub field_data: bool,
    /// 每个指标的数据来源：field 或 lab
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metric_sources: BTreeMap<String, String>,
}

/// 网址信誉判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationVerdict {
    pub unsafe_matches: usize,
}

/// 信誉状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReputationStatus {
    Safe,
    Unsafe,
    #[default]
    Unknown,
}

/// 安全浏览检查结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SafeBrowsingCheck {
    pub status: ReputationStatus,
    pub issues: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SignalSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&SignalResult<ReputationVerdict>> for SafeBrowsingCheck {
    fn from(signal: &SignalResult<ReputationVerdict>) -> Self {
        match signal {
            SignalResult::Available {
                payload, source, ..
            } => Self {
                status: if payload.unsafe_matches > 0 {
                    ReputationStatus::Unsafe
                } else {
                    ReputationStatus::Safe
                },
                issues: payload.unsafe_matches,
                source: Some(*source),
                reason: None,
            },
            SignalResult::Unavailable(reason) => Self {
                status: ReputationStatus::Unknown,
                issues: 0,
                source: None,
                reason: Some(reason.clone()),
            },
        }
    }
}

/// 内容政策分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PolicyReport {
    pub issues_found: bool,
    /// 0-100，越高越危险
    pub risk_score: u8,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub policy_violations: Vec<String>,
}

/// 域名注册年龄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainAge {
    pub created_at: String,
    pub age_days: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,
}

/// 流量/排名数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficRank {
    pub page_rank_decimal: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub term: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_volume: Option<u64>,
}

/// 关键词数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct KeywordReport {
    pub top_keywords: Vec<KeywordEntry>,
}

/// 社交账号链接，按平台名索引
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SocialLinks {
    pub profiles: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedSitemap {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_submitted: Option<String>,
    pub errors: i64,
    pub warnings: i64,
}

/// Search Console 中已提交的站点地图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SearchConsoleReport {
    pub sitemaps: Vec<SubmittedSitemap>,
}
