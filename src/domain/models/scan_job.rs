// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 扫描任务实体
///
/// 由外部触发方创建，被轮询循环领取后由单次扫描执行独占处理。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanJob {
    /// 扫描记录ID
    pub id: Uuid,
    /// 站点ID
    pub site_id: Uuid,
    /// 所属用户ID（可选）
    #[serde(default)]
    pub user_id: Option<Uuid>,
    /// 生命周期状态
    #[serde(default)]
    pub status: ScanStatus,
}

/// 扫描状态枚举
///
/// 状态转换遵循以下流程：
/// Pending → Running → Completed/Failed
///
/// `Failed` 为终态，不会自动重试。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// 待处理
    #[default]
    Pending,
    /// 执行中
    Running,
    /// 已完成
    Completed,
    /// 已失败
    Failed,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanStatus::Pending => write!(f, "pending"),
            ScanStatus::Running => write!(f, "running"),
            ScanStatus::Completed => write!(f, "completed"),
            ScanStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ScanStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ScanStatus::Pending),
            "running" => Ok(ScanStatus::Running),
            "completed" => Ok(ScanStatus::Completed),
            "failed" => Ok(ScanStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: ScanStatus, to: ScanStatus },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ScanStatus {
    /// 判断是否允许转换到目标状态
    pub fn can_transition_to(self, next: ScanStatus) -> bool {
        matches!(
            (self, next),
            (ScanStatus::Pending, ScanStatus::Running)
                | (ScanStatus::Running, ScanStatus::Completed)
                | (ScanStatus::Running, ScanStatus::Failed)
                | (ScanStatus::Pending, ScanStatus::Failed)
        )
    }
}

impl ScanJob {
    /// 创建一个待处理的扫描任务
    pub fn new(id: Uuid, site_id: Uuid, user_id: Option<Uuid>) -> Self {
        Self {
            id,
            site_id,
            user_id,
            status: ScanStatus::Pending,
        }
    }

    fn transition(mut self, next: ScanStatus) -> Result<Self, DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(self)
    }

    /// 启动任务（Pending → Running）
    pub fn start(self) -> Result<Self, DomainError> {
        self.transition(ScanStatus::Running)
    }

    /// 完成任务（Running → Completed）
    pub fn complete(self) -> Result<Self, DomainError> {
        self.transition(ScanStatus::Completed)
    }

    /// 标记任务失败
    ///
    /// 站点不存在时任务可直接从 Pending 失败
    pub fn fail(self) -> Result<Self, DomainError> {
        self.transition(ScanStatus::Failed)
    }
}
