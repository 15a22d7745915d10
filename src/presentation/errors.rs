// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::repositories::scan_repository::RepositoryError;
use crate::workers::scan_worker::TriggerError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        if let Some(RepositoryError::NotFound) = self.0.downcast_ref::<RepositoryError>() {
            return StatusCode::NOT_FOUND;
        }
        if self.0.downcast_ref::<TriggerError>().is_some() {
            return StatusCode::SERVICE_UNAVAILABLE;
        }
        if self.0.downcast_ref::<validator::ValidationErrors>().is_some() {
            return StatusCode::BAD_REQUEST;
        }

        // 检查是否为验证错误（包含特定关键词）
        let message = self.0.to_string().to_lowercase();
        if message.contains("cannot be empty")
            || message.contains("invalid")
            || message.contains("required")
            || message.contains("validation")
        {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {:#}", self.0);
        }
        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
