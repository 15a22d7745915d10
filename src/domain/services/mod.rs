// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 首页分析（homepage_analyzer）：从首页文档中提取安全、SEO 与结构信号
/// - 爬取服务（crawl_service）：有上限的广度优先同源遍历与断链普查
/// - 信任页面验证（trust_page_validator）：隐私、关于、联系等合规页面的候选挑选与内容校验
/// - 评分服务（scoring_service）：扣分表、通过概率上限与整改清单
/// - 扫描流水线（scan_pipeline）：编排一次完整扫描
/// - 生成式内容（generative_service）：草稿、建议与政策分析的降级包装
/// - 通知服务（notification_service）与 Webhook 服务特质（webhook_service）
pub mod crawl_service;
pub mod generative_service;
pub mod homepage_analyzer;
pub mod notification_service;
pub mod scan_pipeline;
pub mod scoring_service;
pub mod trust_page_validator;
pub mod webhook_service;
