// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 站内通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: Uuid,
    pub scan_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn scan_completed(user_id: Uuid, scan_id: Uuid, domain: &str, score: u8) -> Self {
        Self {
            user_id,
            scan_id,
            kind: "scan_completed".to_string(),
            title: "Scan completed".to_string(),
            message: format!(
                "The readiness scan for {} finished with a score of {}/100.",
                domain, score
            ),
        }
    }

    pub fn scan_failed(user_id: Uuid, scan_id: Uuid, domain: &str) -> Self {
        Self {
            user_id,
            scan_id,
            kind: "scan_failed".to_string(),
            title: "Scan failed".to_string(),
            message: format!(
                "The readiness scan for {} could not be completed. Please try again.",
                domain
            ),
        }
    }
}

/// 用户绑定的第三方授权令牌
#[derive(Debug, Clone, Deserialize)]
pub struct IntegrationToken {
    pub user_id: Uuid,
    pub provider: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl IntegrationToken {
    /// 令牌是否仍然有效（未设置过期时间视为有效）
    pub fn is_usable(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.token_expires_at.map(|exp| exp > now).unwrap_or(true)
    }
}
