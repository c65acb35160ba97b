// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

use crate::domain::models::collection::{Collection, RecordKey};
use crate::domain::models::outcome::StageReport;
use crate::domain::models::task::FetchTask;
use crate::domain::services::extraction::ExtractionRule;
use crate::utils::errors::PipelineError;
use crate::workers::executor::FetchExecutor;

/// 详情抓取阶段
///
/// 从上游集合读取已持久化的记录，抽取去重后的键，过滤掉已缓存的键，
/// 其余键并发抓取并写入目标集合
pub struct DetailFetcher<'a> {
    executor: &'a FetchExecutor,
}

impl<'a> DetailFetcher<'a> {
    pub fn new(executor: &'a FetchExecutor) -> Self {
        Self { executor }
    }

    /// 运行一个详情阶段，目标集合由抽取规则决定
    ///
    /// 只有列出上游集合失败才返回错误；单条记录或单个任务的失败记录在报告中
    #[instrument(skip(self), fields(target = %rule.target()))]
    pub async fn run(
        &self,
        source: Collection,
        rule: ExtractionRule,
    ) -> Result<StageReport, PipelineError> {
        let target = rule.target();
        let mut report = StageReport::new(target.dir_name());

        let keys = self.extract_keys(source, rule).await?;
        report.discovered = keys.len();

        let mut tasks = Vec::with_capacity(keys.len());
        for key in keys {
            match self.executor.store().exists(target, &key).await {
                Ok(true) => {
                    debug!(collection = %target, key = %key, "Already cached, skipping request");
                    report.cached += 1;
                    continue;
                }
                Ok(false) => {}
                // put re-checks presence, so scheduling is still safe
                Err(e) => warn!(collection = %target, key = %key, "Presence check failed: {}", e),
            }
            if let Some(task) = FetchTask::detail(target, key) {
                tasks.push(task);
            }
        }
        report.scheduled = tasks.len();

        info!(
            "Stage {}: {} keys from {}, {} cached, {} to fetch",
            target,
            report.discovered,
            source,
            report.cached,
            report.scheduled
        );

        Ok(self.executor.run_tasks(tasks, report).await)
    }

    /// 按上游枚举顺序抽取键，重复键保留第一次出现
    async fn extract_keys(
        &self,
        source: Collection,
        rule: ExtractionRule,
    ) -> Result<Vec<RecordKey>, PipelineError> {
        let store = self.executor.store();
        let mut seen = HashSet::new();
        let mut keys = Vec::new();

        for source_key in store.list_keys(source).await? {
            let record = match store.get(source, &source_key).await {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    warn!(collection = %source, key = %source_key, "Unreadable upstream record: {}", e);
                    continue;
                }
            };

            for key in rule.extract(&record) {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }
        }

        Ok(keys)
    }
}
