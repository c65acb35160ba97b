// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 集合（collection）：每个阶段的持久化集合、记录键和记录
/// - 结果（outcome）：响应分类、任务结果和阶段报告
/// - 任务（task）：抓取任务和列表查询请求体
pub mod collection;
pub mod outcome;
pub mod task;
