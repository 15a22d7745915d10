// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::{DeliveryOutcome, WebhookPayload, WebhookSubscription};
use async_trait::async_trait;

/// Webhook服务特质
///
/// 定义Webhook发送的核心逻辑
#[async_trait]
pub trait WebhookService: Send + Sync {
    /// 向单个订阅投递签名后的负载
    ///
    /// # 参数
    ///
    /// * `subscription` - 目标订阅（提供URL与签名密钥）
    /// * `payload` - 事件负载
    ///
    /// # 返回值
    ///
    /// 投递结果；失败不会以错误形式返回，由调用方记录
    async fn send_webhook(
        &self,
        subscription: &WebhookSubscription,
        payload: &WebhookPayload,
    ) -> DeliveryOutcome;
}
