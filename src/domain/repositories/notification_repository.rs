// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::scan_repository::RepositoryError;
use crate::domain::models::notification::{IntegrationToken, Notification};
use async_trait::async_trait;
use uuid::Uuid;

/// 通知仓库特质
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// 写入一条通知
    async fn insert(&self, notification: &Notification) -> Result<(), RepositoryError>;
}

/// 第三方授权仓库特质
#[async_trait]
pub trait IntegrationRepository: Send + Sync {
    /// 查询用户在指定提供方下存储的令牌
    async fn find_token(
        &self,
        user_id: Uuid,
        provider: &str,
    ) -> Result<Option<IntegrationToken>, RepositoryError>;
}
