// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含集合、记录、抓取任务等核心概念和键抽取规则
pub mod domain;

/// 引擎模块
///
/// 远程 API 传输和响应分类
pub mod engines;

/// 基础设施模块
///
/// 提供存储和指标等外部集成
pub mod infrastructure;

/// 工具模块
///
/// 提供错误类型和日志初始化
pub mod utils;

/// 工作器模块
///
/// 实现流水线各阶段和编排
pub mod workers;
