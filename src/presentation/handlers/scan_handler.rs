// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::scan_repository::{RepositoryError, ScanRepository};
use crate::presentation::dto::{ScanRequestDto, ScanResponseDto};
use crate::presentation::errors::AppError;
use crate::workers::scan_worker::ScanTrigger;
use axum::{extract::Extension, Json};
use std::sync::Arc;
use tracing::info;

/// 触发扫描
///
/// 扫描记录需已存在；任务通过进程内通道交给轮询循环顺序执行，接口立即返回
///
/// # 返回值
///
/// * `200` - 已加入执行队列
/// * `400` - 站点ID与扫描记录不一致
/// * `404` - 扫描记录不存在
/// * `503` - 执行队列已满
pub async fn trigger_scan(
    Extension(repo): Extension<Arc<dyn ScanRepository>>,
    Extension(trigger): Extension<ScanTrigger>,
    Json(payload): Json<ScanRequestDto>,
) -> Result<Json<ScanResponseDto>, AppError> {
    let job = repo
        .find_by_id(payload.id)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    if job.site_id != payload.site_id {
        return Err(anyhow::anyhow!("Invalid site_id for scan {}", payload.id).into());
    }

    trigger.trigger(job.id)?;
    info!("Scan {} triggered for site {}", job.id, job.site_id);

    Ok(Json(ScanResponseDto {
        status: "success".to_string(),
        message: "Scan triggered and running in the background".to_string(),
        scan_id: job.id,
    }))
}
