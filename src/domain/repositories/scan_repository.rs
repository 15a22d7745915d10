// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::result_bundle::ResultBundle;
use crate::domain::models::scan_job::{ScanJob, ScanStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 传输错误
    #[error("Datastore request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// 非成功状态码
    #[error("Datastore returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 响应解析失败
    #[error("Failed to decode datastore response: {0}")]
    Decode(String),
}

/// 已完成扫描的持久化内容
#[derive(Debug, Clone)]
pub struct CompletedScan {
    pub overall_score: u8,
    pub approval_probability: u8,
    pub bundle: ResultBundle,
    pub completed_at: DateTime<Utc>,
}

/// 扫描仓库特质
///
/// 定义扫描记录与站点的数据访问接口
#[async_trait]
pub trait ScanRepository: Send + Sync {
    /// 拉取待处理的扫描任务
    async fn fetch_pending(&self, limit: usize) -> Result<Vec<ScanJob>, RepositoryError>;
    /// 根据ID查找扫描任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScanJob>, RepositoryError>;
    /// 查询站点URL
    async fn find_site_url(&self, site_id: Uuid) -> Result<Option<String>, RepositoryError>;
    /// 领取任务：仅当状态仍为 pending 时置为 running
    ///
    /// # 返回值
    ///
    /// 领取成功返回 true，已被其他执行领取返回 false
    async fn claim(&self, id: Uuid) -> Result<bool, RepositoryError>;
    /// 更新扫描状态
    async fn update_status(&self, id: Uuid, status: ScanStatus) -> Result<(), RepositoryError>;
    /// 写入完成结果（状态、分数与四个结果分组）
    async fn save_completed(&self, id: Uuid, scan: &CompletedScan) -> Result<(), RepositoryError>;
    /// 读取信任页面数据
    async fn find_trust_pages_data(
        &self,
        id: Uuid,
    ) -> Result<Option<serde_json::Value>, RepositoryError>;
    /// 整体替换信任页面数据
    async fn save_trust_pages_data(
        &self,
        id: Uuid,
        data: &serde_json::Value,
    ) -> Result<(), RepositoryError>;
}
