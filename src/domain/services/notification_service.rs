// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::notification::Notification;
use crate::domain::models::scan_job::ScanJob;
use crate::domain::models::score::ScoreCard;
use crate::domain::models::webhook::{DeliveryOutcome, ScanEvent, WebhookPayload};
use crate::domain::repositories::notification_repository::NotificationRepository;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use crate::domain::services::webhook_service::WebhookService;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

/// 扫描结果通知
///
/// 站内通知与 Webhook 投递都是尽力而为：失败只记录日志，不影响任务状态
pub struct ScanNotifier {
    notifications: Arc<dyn NotificationRepository>,
    webhooks: Arc<dyn WebhookRepository>,
    dispatcher: Arc<dyn WebhookService>,
}

impl ScanNotifier {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        webhooks: Arc<dyn WebhookRepository>,
        dispatcher: Arc<dyn WebhookService>,
    ) -> Self {
        Self {
            notifications,
            webhooks,
            dispatcher,
        }
    }

    /// 扫描完成通知
    pub async fn scan_completed(
        &self,
        job: &ScanJob,
        domain: &str,
        card: &ScoreCard,
    ) -> Vec<DeliveryOutcome> {
        let Some(user_id) = job.user_id else {
            return Vec::new();
        };
        let notification =
            Notification::scan_completed(user_id, job.id, domain, card.overall_score);
        self.insert_notification(&notification).await;

        let payload = WebhookPayload {
            event: ScanEvent::ScanCompleted,
            scan_id: job.id,
            site_id: job.site_id,
            status: job.status.to_string(),
            overall_score: Some(card.overall_score),
            approval_probability: Some(card.approval_probability),
        };
        self.deliver(user_id, payload).await
    }

    /// 扫描失败通知
    pub async fn scan_failed(&self, job: &ScanJob, domain: &str) -> Vec<DeliveryOutcome> {
        let Some(user_id) = job.user_id else {
            return Vec::new();
        };
        let notification = Notification::scan_failed(user_id, job.id, domain);
        self.insert_notification(&notification).await;

        let payload = WebhookPayload {
            event: ScanEvent::ScanFailed,
            scan_id: job.id,
            site_id: job.site_id,
            status: job.status.to_string(),
            overall_score: None,
            approval_probability: None,
        };
        self.deliver(user_id, payload).await
    }

    async fn insert_notification(&self, notification: &Notification) {
        if let Err(e) = self.notifications.insert(notification).await {
            warn!(
                "Failed to insert {} notification for scan {}: {}",
                notification.kind, notification.scan_id, e
            );
        }
    }

    /// 并发投递到所有订阅，各目标互不影响
    async fn deliver(&self, user_id: uuid::Uuid, payload: WebhookPayload) -> Vec<DeliveryOutcome> {
        let subscriptions = match self.webhooks.find_active(user_id, payload.event).await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                warn!("Failed to load webhooks for user {}: {}", user_id, e);
                return Vec::new();
            }
        };
        if subscriptions.is_empty() {
            return Vec::new();
        }

        let deliveries = subscriptions
            .iter()
            .map(|subscription| self.dispatcher.send_webhook(subscription, &payload));
        let outcomes = join_all(deliveries).await;

        let delivered = outcomes.iter().filter(|o| o.success).count();
        info!(
            "Delivered {} for scan {} to {}/{} webhooks",
            payload.event,
            payload.scan_id,
            delivered,
            outcomes.len()
        );
        outcomes
    }
}
