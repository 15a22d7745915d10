// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::{DeliveryOutcome, WebhookPayload, WebhookSubscription};
use crate::domain::services::webhook_service::WebhookService;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use metrics::counter;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// 签名请求头
pub const SIGNATURE_HEADER: &str = "X-Adscan-Signature";
/// 事件类型请求头
pub const EVENT_HEADER: &str = "X-Adscan-Event";

/// 对请求体原始字节计算 HMAC-SHA256 签名
///
/// # 返回值
///
/// `sha256=<hex>` 形式的签名
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Webhook服务实现
pub struct WebhookServiceImpl {
    /// HTTP 客户端
    client: reqwest::Client,
}

impl WebhookServiceImpl {
    /// 创建新的 Webhook 服务实现
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self { client }
    }
}

impl Default for WebhookServiceImpl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookService for WebhookServiceImpl {
    async fn send_webhook(
        &self,
        subscription: &WebhookSubscription,
        payload: &WebhookPayload,
    ) -> DeliveryOutcome {
        let failed = |error: String| {
            counter!("webhook_delivery_failed_total").increment(1);
            warn!("Webhook delivery to {} failed: {}", subscription.url, error);
            DeliveryOutcome {
                url: subscription.url.clone(),
                success: false,
                error: Some(error),
            }
        };

        let body = match serde_json::to_vec(payload) {
            Ok(body) => body,
            Err(e) => return failed(e.to_string()),
        };
        let signature = sign(&subscription.secret, &body);

        let response = self
            .client
            .post(&subscription.url)
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .header(EVENT_HEADER, payload.event.as_str())
            .body(body)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                counter!("webhook_delivery_success_total").increment(1);
                debug!("Webhook {} delivered to {}", payload.event, subscription.url);
                DeliveryOutcome {
                    url: subscription.url.clone(),
                    success: true,
                    error: None,
                }
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                failed(format!("status {}: {}", status, body))
            }
            Err(e) => failed(e.to_string()),
        }
    }
}
