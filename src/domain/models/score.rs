// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 整改项严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// 几乎必然导致拒绝
    Critical,
    Warning,
}

/// 优先整改清单中的一项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub severity: Severity,
    pub title: String,
    pub recommendation: String,
    /// 该项造成的扣分（正数）
    pub points: u8,
}

/// 评分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    /// 0-100 综合分
    pub overall_score: u8,
    /// 0-100 通过概率（在综合分基础上施加硬上限）
    pub approval_probability: u8,
    pub checklist: Vec<ChecklistItem>,
    /// 参与评分的外部信号中可用的比例
    pub confidence: f64,
    /// 不可用的外部信号名称
    pub unavailable_signals: Vec<String>,
}
