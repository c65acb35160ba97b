// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::domain::models::collection::{Collection, Record, RecordKey};
use crate::domain::repositories::cache_repository::{CacheStore, PutOutcome, StorageError};

/// 本地文件系统缓存
///
/// 每个集合一个目录，每条记录一个 JSON 文件
pub struct LocalCacheStore {
    base_path: PathBuf,
}

impl LocalCacheStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.base_path.join(collection.dir_name())
    }

    pub fn record_path(&self, collection: Collection, key: &RecordKey) -> PathBuf {
        self.collection_dir(collection)
            .join(collection.file_name(key))
    }

    async fn write_temp(&self, dir: &Path, file_name: &str, data: &[u8]) -> Result<PathBuf, StorageError> {
        let temp_path = dir.join(format!(".{}.tmp-{}", file_name, Uuid::new_v4().simple()));
        let mut file = fs::File::create(&temp_path).await?;
        let written: std::io::Result<()> = async {
            file.write_all(data).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        drop(file);
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(temp_path)
    }

    /// 将临时文件发布到最终路径，目标已存在时不覆盖
    async fn publish(&self, temp_path: &Path, final_path: &Path) -> Result<PutOutcome, StorageError> {
        match fs::hard_link(temp_path, final_path).await {
            Ok(()) => Ok(PutOutcome::Written),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(PutOutcome::AlreadyPresent),
            Err(e) if e.kind() == ErrorKind::Unsupported => {
                Self::rename_if_absent(temp_path, final_path).await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 无硬链接时的发布方式；rename 会覆盖目标，因此先确认目标不存在
    async fn rename_if_absent(temp_path: &Path, final_path: &Path) -> Result<PutOutcome, StorageError> {
        if fs::try_exists(final_path).await? {
            return Ok(PutOutcome::AlreadyPresent);
        }
        fs::rename(temp_path, final_path).await?;
        Ok(PutOutcome::Written)
    }
}

#[async_trait]
impl CacheStore for LocalCacheStore {
    async fn exists(&self, collection: Collection, key: &RecordKey) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.record_path(collection, key)).await?)
    }

    async fn put(
        &self,
        collection: Collection,
        key: &RecordKey,
        payload: &Value,
    ) -> Result<PutOutcome, StorageError> {
        let final_path = self.record_path(collection, key);
        if fs::try_exists(&final_path).await? {
            return Ok(PutOutcome::AlreadyPresent);
        }

        let dir = self.collection_dir(collection);
        fs::create_dir_all(&dir).await?;

        let data = serde_json::to_vec_pretty(payload)?;
        let temp_path = self
            .write_temp(&dir, &collection.file_name(key), &data)
            .await?;

        // Final check right before publishing; the temp file is removed on every path below.
        let outcome = match fs::try_exists(&final_path).await {
            Ok(true) => Ok(PutOutcome::AlreadyPresent),
            Ok(false) => self.publish(&temp_path, &final_path).await,
            Err(e) => Err(StorageError::Io(e)),
        };

        if let Err(e) = fs::remove_file(&temp_path).await {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to remove temp file {}: {}", temp_path.display(), e);
            }
        }

        outcome
    }

    async fn get(
        &self,
        collection: Collection,
        key: &RecordKey,
    ) -> Result<Option<Record>, StorageError> {
        match fs::read(self.record_path(collection, key)).await {
            Ok(data) => Ok(Some(Record {
                collection,
                key: key.clone(),
                payload: serde_json::from_slice(&data)?,
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn list_keys(&self, collection: Collection) -> Result<Vec<RecordKey>, StorageError> {
        let mut entries = match fs::read_dir(self.collection_dir(collection)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(key) = entry
                .file_name()
                .to_str()
                .and_then(|name| collection.key_from_file_name(name))
            {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// 测试用的内存存储实现
#[derive(Clone, Default)]
pub struct InMemoryCacheStore {
    data: Arc<RwLock<HashMap<(Collection, RecordKey), Value>>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 集合中的记录数
    pub async fn len(&self, collection: Collection) -> usize {
        let map = self.data.read().await;
        map.keys().filter(|(c, _)| *c == collection).count()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn exists(&self, collection: Collection, key: &RecordKey) -> Result<bool, StorageError> {
        let map = self.data.read().await;
        Ok(map.contains_key(&(collection, key.clone())))
    }

    async fn put(
        &self,
        collection: Collection,
        key: &RecordKey,
        payload: &Value,
    ) -> Result<PutOutcome, StorageError> {
        let mut map = self.data.write().await;
        let slot = (collection, key.clone());
        if map.contains_key(&slot) {
            return Ok(PutOutcome::AlreadyPresent);
        }
        map.insert(slot, payload.clone());
        Ok(PutOutcome::Written)
    }

    async fn get(
        &self,
        collection: Collection,
        key: &RecordKey,
    ) -> Result<Option<Record>, StorageError> {
        let map = self.data.read().await;
        Ok(map.get(&(collection, key.clone())).map(|payload| Record {
            collection,
            key: key.clone(),
            payload: payload.clone(),
        }))
    }

    async fn list_keys(&self, collection: Collection) -> Result<Vec<RecordKey>, StorageError> {
        let map = self.data.read().await;
        let mut keys: Vec<RecordKey> = map
            .keys()
            .filter(|(c, _)| *c == collection)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
