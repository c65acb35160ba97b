// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};

/// 并发闸门已关闭
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("concurrency gate is closed")]
pub struct GateClosed;

/// 并发闸门
///
/// 限制整个运行中同时在途的远程请求数。所有阶段共享同一个闸门；
/// 许可在 `GatePermit` 被丢弃时归还，包括出错和 panic 的路径。
#[derive(Clone, Debug)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    closed: Arc<watch::Sender<bool>>,
    limit: usize,
}

/// 闸门许可，丢弃即释放
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyGate {
    /// 创建新的并发闸门
    ///
    /// # 参数
    ///
    /// * `limit` - 同时在途请求上限，最小为 1
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        let (closed, _) = watch::channel(false);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            closed: Arc::new(closed),
            limit,
        }
    }

    /// 获取一个许可
    ///
    /// 闸门关闭后，等待中和新的获取都会立即返回 `GateClosed`
    pub async fn acquire(&self) -> Result<GatePermit, GateClosed> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| GateClosed)?;
        // A released permit may be handed to a waiter before close() runs.
        if self.semaphore.is_closed() {
            return Err(GateClosed);
        }
        Ok(GatePermit { _permit: permit })
    }

    /// 关闭闸门，不再准入新的请求；已发出的请求不受影响
    pub fn close(&self) {
        self.semaphore.close();
        self.closed.send_replace(true);
    }

    /// 等待闸门关闭；已关闭时立即返回
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// 当前在途请求数
    pub fn in_flight(&self) -> usize {
        self.limit - self.semaphore.available_permits()
    }
}
