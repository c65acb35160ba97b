// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::domain::repositories::cache_repository::StorageError;
use crate::engines::traits::TransportError;

/// 流水线错误类型
///
/// 单个任务的失败不会变成错误，而是记录为 `TaskOutcome`；
/// 这里只包含让整个运行无法继续的基础设施故障
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),

    #[error("传输错误: {0}")]
    Transport(#[from] TransportError),

    #[error("编码错误: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("配置错误: {0}")]
    Configuration(String),
}
