// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::presentation::handlers::{ai_handler, draft_handler, scan_handler};
use axum::{
    routing::{get, post},
    Router,
};

/// 创建应用路由
///
/// 处理器依赖通过 `Extension` 层注入：`Arc<dyn ScanRepository>`、
/// `GenerativeService` 与 `ScanTrigger`
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version))
        .route("/scan", post(scan_handler::trigger_scan))
        .route("/regenerate-draft", post(draft_handler::regenerate_draft))
        .route(
            "/ai/content-improvements",
            post(ai_handler::content_improvements),
        )
        .route("/ai/monetization", post(ai_handler::monetization))
        .route("/ai/appeal", post(ai_handler::appeal))
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
