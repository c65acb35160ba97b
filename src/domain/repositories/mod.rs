// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 缓存存储接口由基础设施层实现，记录是否存在是续跑的唯一依据
pub mod cache_repository;
