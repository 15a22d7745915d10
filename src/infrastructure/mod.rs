// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，提供对具体技术的抽象和封装。
/// 基础设施层负责与外部系统的交互，包括 REST 数据存储、LLM 提供商与 Webhook 接收方。
///
/// 包含的子模块：
/// - 指标（metrics）：Prometheus 导出器安装
/// - 仓库实现（repositories）：提供领域仓库接口的具体实现
/// - 服务实现（services）：生成式内容与 Webhook 投递
///
/// 基础设施层遵循依赖倒置原则，依赖于领域层的抽象接口，
/// 确保领域层保持纯粹的业务逻辑，不受技术实现的影响。
pub mod metrics;
pub mod repositories;
pub mod services;
