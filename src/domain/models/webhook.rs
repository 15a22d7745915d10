// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Webhook订阅实体
///
/// 用户为扫描生命周期事件配置的回调端点，每个订阅使用独立密钥签名。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSubscription {
    /// 订阅唯一标识符
    pub id: Uuid,
    /// 所属用户ID
    pub user_id: Uuid,
    /// 回调URL
    pub url: String,
    /// 签名密钥
    pub secret: String,
    /// 订阅的事件类型列表
    #[serde(default)]
    pub events: Vec<String>,
    /// 是否启用
    #[serde(default)]
    pub is_active: bool,
}

/// Webhook事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanEvent {
    /// 扫描完成
    #[serde(rename = "scan.completed")]
    ScanCompleted,
    /// 扫描失败
    #[serde(rename = "scan.failed")]
    ScanFailed,
}

impl ScanEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            ScanEvent::ScanCompleted => "scan.completed",
            ScanEvent::ScanFailed => "scan.failed",
        }
    }
}

impl fmt::Display for ScanEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Webhook负载
///
/// 投递时按序列化后的字节计算签名，接收方应对原始请求体验签
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: ScanEvent,
    pub scan_id: Uuid,
    pub site_id: Uuid,
    pub status: String,
    pub overall_score: Option<u8>,
    pub approval_probability: Option<u8>,
}

/// 单个目标的投递结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub url: String,
    pub success: bool,
    pub error: Option<String>,
}
