// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：扫描任务、信号结果与结果集
/// - 仓库接口（repositories）：数据持久化抽象接口
/// - 服务（services）：首页分析、爬取、信任页验证、评分与扫描流水线
///
/// 领域层不依赖具体的存储或 HTTP 框架实现。
pub mod models;
pub mod repositories;
pub mod services;
