// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 基于 REST 数据存储实现领域层的仓库特质
pub mod rest_store;
