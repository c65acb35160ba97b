// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含抓取流水线的核心概念，包括：
/// - 领域模型（models）：集合、记录键、抓取任务和执行结果
/// - 仓库接口（repositories）：缓存存储抽象接口
/// - 服务（services）：键抽取规则
///
/// 领域层不依赖于任何具体的传输或存储实现。
pub mod models;
pub mod repositories;
pub mod services;
