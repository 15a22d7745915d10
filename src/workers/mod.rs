// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供后台扫描轮询循环和工作器生命周期管理
pub mod manager;
pub mod scan_worker;
