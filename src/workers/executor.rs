// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::domain::models::outcome::{ClassificationOutcome, StageReport, TaskOutcome};
use crate::domain::models::task::{FetchTask, RemoteRequest};
use crate::domain::repositories::cache_repository::{CacheStore, PutOutcome};
use crate::engines::classifier;
use crate::engines::traits::ApiTransport;
use crate::infrastructure::metrics;
use crate::workers::gate::ConcurrencyGate;

/// 抓取执行器
///
/// 一次运行一个实例：所有阶段共享同一个传输、存储和并发闸门
pub struct FetchExecutor {
    transport: Arc<dyn ApiTransport>,
    store: Arc<dyn CacheStore>,
    gate: ConcurrencyGate,
    server_error_pause: Duration,
}

impl FetchExecutor {
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        store: Arc<dyn CacheStore>,
        gate: ConcurrencyGate,
        server_error_pause: Duration,
    ) -> Self {
        Self {
            transport,
            store,
            gate,
            server_error_pause,
        }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// 并发执行一个阶段的全部任务，等待全部结束后返回汇总
    ///
    /// 并发度由闸门限制；出现致命错误后闸门关闭，尚未准入的任务记为取消
    pub async fn run_tasks(&self, tasks: Vec<FetchTask>, mut report: StageReport) -> StageReport {
        let mut pending: FuturesUnordered<_> =
            tasks.into_iter().map(|task| self.execute(task)).collect();

        while let Some(outcome) = pending.next().await {
            report.record(outcome);
        }

        report
    }

    /// 执行单个任务：获取许可、发送请求、分类、存储
    pub async fn execute(&self, task: FetchTask) -> TaskOutcome {
        let outcome = self.execute_inner(&task).await;
        metrics::record_task(task.collection, &outcome);
        outcome
    }

    async fn execute_inner(&self, task: &FetchTask) -> TaskOutcome {
        let permit = match self.gate.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                debug!(collection = %task.collection, key = %task.key, "Run aborted, task not admitted");
                return TaskOutcome::Cancelled;
            }
        };
        metrics::set_in_flight(self.gate.in_flight());

        let response = match &task.request {
            RemoteRequest::Get { path } => self.transport.get(path).await,
            RemoteRequest::Post { path, body } => self.transport.post_json(path, body).await,
        };

        drop(permit);
        metrics::set_in_flight(self.gate.in_flight());

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!(collection = %task.collection, key = %task.key, "Request failed: {}", e);
                return TaskOutcome::Skipped(format!("transport error: {}", e));
            }
        };

        match classifier::classify(&response) {
            ClassificationOutcome::Accept(payload) => {
                match self.store.put(task.collection, &task.key, &payload).await {
                    Ok(PutOutcome::Written) => {
                        info!(collection = %task.collection, key = %task.key, "Record stored");
                        TaskOutcome::Stored
                    }
                    Ok(PutOutcome::AlreadyPresent) => {
                        debug!(collection = %task.collection, key = %task.key, "Record stored by another writer");
                        TaskOutcome::AlreadyCached
                    }
                    Err(e) => {
                        error!(collection = %task.collection, key = %task.key, "Failed to store record: {}", e);
                        TaskOutcome::WriteFailed(e.to_string())
                    }
                }
            }
            ClassificationOutcome::Skip(reason) => {
                warn!(collection = %task.collection, key = %task.key, "Skipping: {}", reason);
                TaskOutcome::Skipped(reason)
            }
            ClassificationOutcome::PauseAndRetryOnce => {
                warn!(
                    collection = %task.collection,
                    key = %task.key,
                    status = response.status_code,
                    "Server error, pausing {:?} before moving on",
                    self.server_error_pause
                );
                tokio::select! {
                    _ = sleep(self.server_error_pause) => {}
                    _ = self.gate.closed() => {
                        debug!(collection = %task.collection, key = %task.key, "Run aborted, pause cut short");
                    }
                }
                TaskOutcome::Paused
            }
            ClassificationOutcome::FatalAbort(reason) => {
                error!(collection = %task.collection, key = %task.key, "Aborting run: {}", reason);
                self.gate.close();
                TaskOutcome::Aborted(reason)
            }
        }
    }
}
