// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施服务模块
///
/// 提供领域服务特质的具体实现
/// 包括 LLM 生成式内容与带签名的 Webhook 投递
pub mod llm_service;
pub mod webhook_service_impl;
