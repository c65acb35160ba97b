// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::models::collection::{Collection, Record, RecordKey};

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON 编解码错误
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// 存储错误
    #[error("Storage error: {0}")]
    Other(String),
}

/// 写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Written,
    /// 记录已存在，本次写入为空操作
    AlreadyPresent,
}

/// 缓存存储特质
///
/// 按 (集合, 键) 持久化记录。记录是否存在是唯一的续跑依据。
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 检查记录是否存在
    async fn exists(&self, collection: Collection, key: &RecordKey) -> Result<bool, StorageError>;

    /// 写入记录
    ///
    /// 已存在时不覆盖，返回 `PutOutcome::AlreadyPresent`；
    /// 实现必须在真正写入前再次检查，以应对并发写同一键。
    async fn put(
        &self,
        collection: Collection,
        key: &RecordKey,
        payload: &Value,
    ) -> Result<PutOutcome, StorageError>;

    /// 读取记录
    async fn get(
        &self,
        collection: Collection,
        key: &RecordKey,
    ) -> Result<Option<Record>, StorageError>;

    /// 列出集合中的所有键，集合不存在时返回空
    async fn list_keys(&self, collection: Collection) -> Result<Vec<RecordKey>, StorageError>;
}
