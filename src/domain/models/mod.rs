// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 扫描任务（scan_job）：扫描记录及其状态生命周期
/// - 信号结果（signal）：提供方返回的可用/不可用结果
/// - 扫描结果集（result_bundle）：四个分组的结构化输出
/// - 提供方负载（reports）：各信号的具体数据结构
/// - 评分结果（score）：综合分、通过概率与整改清单
/// - 网络钩子与通知（webhook / notification）
pub mod notification;
pub mod reports;
pub mod result_bundle;
pub mod scan_job;
pub mod score;
pub mod signal;
pub mod webhook;
