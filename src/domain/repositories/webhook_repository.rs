// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::scan_repository::RepositoryError;
use crate::domain::models::webhook::{ScanEvent, WebhookSubscription};
use async_trait::async_trait;
use uuid::Uuid;

/// Webhook仓库特质
///
/// 定义Webhook订阅数据访问接口
#[async_trait]
pub trait WebhookRepository: Send + Sync {
    /// 查询用户订阅了指定事件的启用中Webhook
    async fn find_active(
        &self,
        user_id: Uuid,
        event: ScanEvent,
    ) -> Result<Vec<WebhookSubscription>, RepositoryError>;
}
