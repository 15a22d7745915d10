// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::generative_service::GenerativeService;
use crate::presentation::dto::{
    AppealDto, AppealResponseDto, ContentImprovementsDto, ImprovementsResponseDto,
    MonetizationDto, MonetizationResponseDto,
};
use crate::presentation::errors::AppError;
use axum::{extract::Extension, Json};
use validator::Validate;

// 生成式服务自带回退内容，这些接口只在请求无效时返回错误

pub async fn content_improvements(
    Extension(generative): Extension<GenerativeService>,
    Json(request): Json<ContentImprovementsDto>,
) -> Result<Json<ImprovementsResponseDto>, AppError> {
    request.validate()?;
    let improvements = generative
        .content_improvements(&request.domain, &request.analysis_data)
        .await;
    Ok(Json(ImprovementsResponseDto {
        status: "success".to_string(),
        improvements,
    }))
}

pub async fn monetization(
    Extension(generative): Extension<GenerativeService>,
    Json(request): Json<MonetizationDto>,
) -> Result<Json<MonetizationResponseDto>, AppError> {
    request.validate()?;
    let suggestions = generative
        .monetization_suggestions(&request.domain, &request.analysis_data)
        .await;
    Ok(Json(MonetizationResponseDto {
        status: "success".to_string(),
        suggestions,
    }))
}

pub async fn appeal(
    Extension(generative): Extension<GenerativeService>,
    Json(request): Json<AppealDto>,
) -> Result<Json<AppealResponseDto>, AppError> {
    request.validate()?;
    let draft = generative
        .appeal_letter(&request.domain, &request.violations)
        .await;
    Ok(Json(AppealResponseDto {
        status: "success".to_string(),
        draft,
    }))
}
