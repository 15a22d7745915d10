// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::generative_service::Suggestion;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

/// 触发扫描请求
#[derive(Debug, Deserialize, Serialize)]
pub struct ScanRequestDto {
    /// 扫描记录ID（由触发方预先创建）
    pub id: Uuid,
    pub site_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScanResponseDto {
    pub status: String,
    pub message: String,
    pub scan_id: Uuid,
}

/// 重新生成信任页面草稿
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RegenerateDraftDto {
    pub scan_id: Uuid,
    #[validate(length(min = 1, max = 253))]
    pub domain: String,
    #[validate(length(min = 1, max = 32))]
    pub page_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DraftResponseDto {
    pub draft: String,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ContentImprovementsDto {
    #[serde(default)]
    pub scan_id: Option<Uuid>,
    #[validate(length(min = 1, max = 253))]
    pub domain: String,
    #[serde(default)]
    pub analysis_data: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImprovementsResponseDto {
    pub status: String,
    pub improvements: Vec<Suggestion>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct MonetizationDto {
    #[serde(default)]
    pub scan_id: Option<Uuid>,
    #[validate(length(min = 1, max = 253))]
    pub domain: String,
    #[serde(default)]
    pub analysis_data: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MonetizationResponseDto {
    pub status: String,
    pub suggestions: Vec<Suggestion>,
}

/// 申诉信请求
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct AppealDto {
    #[serde(default)]
    pub scan_id: Option<Uuid>,
    #[validate(length(min = 1, max = 253))]
    pub domain: String,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub violations: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AppealResponseDto {
    pub status: String,
    pub draft: String,
}
