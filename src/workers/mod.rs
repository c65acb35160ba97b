// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供流水线各阶段的执行和编排
/// 包括并发闸门、任务执行、列表阶段、详情阶段和流水线管理
pub mod detail_worker;
pub mod executor;
pub mod gate;
pub mod listing_worker;
pub mod manager;

pub use manager::{PipelineManager, PipelineOptions, StageSpec};
