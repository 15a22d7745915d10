// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::result_bundle::TrustCategory;
use crate::domain::repositories::scan_repository::{RepositoryError, ScanRepository};
use crate::domain::services::generative_service::GenerativeService;
use crate::presentation::dto::{DraftResponseDto, RegenerateDraftDto};
use crate::presentation::errors::AppError;
use axum::{extract::Extension, Json};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

/// 重新生成信任页面草稿并写回扫描记录
///
/// 草稿保存在 `trust_pages_data.drafts.{page_type}`，其余字段保持不变
pub async fn regenerate_draft(
    Extension(repo): Extension<Arc<dyn ScanRepository>>,
    Extension(generative): Extension<GenerativeService>,
    Json(request): Json<RegenerateDraftDto>,
) -> Result<Json<DraftResponseDto>, AppError> {
    request.validate()?;
    let category = TrustCategory::parse(&request.page_type)
        .ok_or_else(|| anyhow::anyhow!("Invalid page_type: {}", request.page_type))?;

    let data = repo
        .find_trust_pages_data(request.scan_id)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    let draft = generative.draft_page(&request.domain, category).await;
    let data = with_draft(data, category, &draft);
    repo.save_trust_pages_data(request.scan_id, &data).await?;
    info!("Regenerated {} draft for scan {}", category, request.scan_id);

    Ok(Json(DraftResponseDto { draft }))
}

/// 将草稿写入信任页面数据，非对象值按空对象处理
pub fn with_draft(data: Value, category: TrustCategory, draft: &str) -> Value {
    let mut root = match data {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let drafts = root
        .entry("drafts")
        .or_insert_with(|| Value::Object(Map::new()));
    if !drafts.is_object() {
        *drafts = Value::Object(Map::new());
    }
    if let Value::Object(drafts) = drafts {
        drafts.insert(category.as_str().to_string(), Value::String(draft.to_string()));
    }
    Value::Object(root)
}
