// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
/// 包括日志初始化、robots.txt 解析、URL 处理、SSRF 校验与文本统计
pub mod robots;
pub mod telemetry;
pub mod text_stats;
pub mod url_utils;
pub mod validators;
