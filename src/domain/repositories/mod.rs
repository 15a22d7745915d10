// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 扫描记录、Webhook订阅、通知与第三方授权的持久化抽象
pub mod notification_repository;
pub mod scan_repository;
pub mod webhook_repository;
