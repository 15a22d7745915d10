// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、服务和仓库接口
pub mod domain;

/// 引擎模块
///
/// 页面抓取、TLS 握手检查与外部信号提供方
pub mod engines;

/// 基础设施模块
///
/// 提供外部服务集成，如 REST 数据存储、LLM 与 Webhook 投递
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由与处理器
pub mod presentation;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 扫描轮询循环与工作器管理
pub mod workers;
