// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// - 指标（metrics）：Prometheus 导出器和任务计数
/// - 存储（storage）：缓存存储的文件系统实现和内存实现
///
/// 基础设施层依赖于领域层的抽象接口。
pub mod metrics;
pub mod storage;
