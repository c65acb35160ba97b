// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::config::settings::{ListingSettings, Settings};
use crate::domain::models::collection::Collection;
use crate::domain::models::outcome::{RunOutcome, StageReport};
use crate::domain::repositories::cache_repository::CacheStore;
use crate::domain::services::extraction::ExtractionRule;
use crate::engines::reqwest_engine::ReqwestTransport;
use crate::engines::traits::ApiTransport;
use crate::infrastructure::storage::LocalCacheStore;
use crate::utils::errors::PipelineError;
use crate::workers::detail_worker::DetailFetcher;
use crate::workers::executor::FetchExecutor;
use crate::workers::gate::ConcurrencyGate;
use crate::workers::listing_worker::ListingFetcher;

/// 详情阶段配置：上游集合 + 抽取规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSpec {
    pub source: Collection,
    pub rule: ExtractionRule,
}

impl StageSpec {
    pub fn new(source: Collection, rule: ExtractionRule) -> Self {
        Self { source, rule }
    }

    pub fn target(&self) -> Collection {
        self.rule.target()
    }

    /// 标准阶段顺序，列表阶段之后依次执行
    pub fn standard() -> Vec<StageSpec> {
        vec![
            StageSpec::new(Collection::Pages, ExtractionRule::LoadNumbers),
            StageSpec::new(Collection::Loads, ExtractionRule::TravelOrderNumbers),
            StageSpec::new(Collection::Loads, ExtractionRule::FirstTruckNumber),
            StageSpec::new(Collection::Loads, ExtractionRule::DispatcherId),
            StageSpec::new(Collection::Loads, ExtractionRule::CustomerId),
        ]
    }
}

/// 流水线选项
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub listing: ListingSettings,
    pub concurrency_limit: usize,
    pub server_error_pause: Duration,
}

impl From<&Settings> for PipelineOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            listing: settings.listing.clone(),
            concurrency_limit: settings.concurrency.limit,
            server_error_pause: settings.backoff.server_error_pause(),
        }
    }
}

/// 流水线管理器
///
/// 严格按顺序执行列表阶段和各详情阶段：后续阶段从存储中读取前一阶段的结果，
/// 因此每个阶段的任务必须全部结束后才能开始下一个阶段。
/// 任何阶段出现致命错误都会终止整个运行。
pub struct PipelineManager {
    transport: Arc<dyn ApiTransport>,
    store: Arc<dyn CacheStore>,
    options: PipelineOptions,
    stages: Vec<StageSpec>,
}

impl PipelineManager {
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        store: Arc<dyn CacheStore>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            transport,
            store,
            options,
            stages: StageSpec::standard(),
        }
    }

    /// 按配置构建基于 HTTP 传输和本地文件缓存的管理器
    ///
    /// # 返回值
    ///
    /// * `Err(PipelineError::Configuration)` - 配置校验失败
    /// * `Err(PipelineError::Transport)` - HTTP 客户端构建失败
    pub fn from_settings(settings: &Settings) -> Result<Self, PipelineError> {
        settings
            .validate()
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;
        let transport = Arc::new(ReqwestTransport::new(&settings.api)?);
        let store = Arc::new(LocalCacheStore::new(&settings.storage.root));
        Ok(Self::new(transport, store, PipelineOptions::from(settings)))
    }

    /// 替换详情阶段列表
    pub fn with_stages(mut self, stages: Vec<StageSpec>) -> Self {
        self.stages = stages;
        self
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// 执行一次完整运行
    ///
    /// 每次运行使用新的并发闸门，因此上一次运行的终止不会影响本次
    pub async fn run(&self) -> Result<RunOutcome, PipelineError> {
        let executor = FetchExecutor::new(
            self.transport.clone(),
            self.store.clone(),
            ConcurrencyGate::new(self.options.concurrency_limit),
            self.options.server_error_pause,
        );
        info!(
            "Starting run with concurrency limit {} and {} detail stages",
            executor.gate().limit(),
            self.stages.len()
        );

        let mut reports = Vec::with_capacity(self.stages.len() + 1);

        let listing = &self.options.listing;
        let report = ListingFetcher::new(&executor, listing)
            .run(listing.start_page, listing.page_count)
            .await?;
        if let Some(aborted) = Self::finish_stage(report, &mut reports) {
            return Ok(aborted);
        }

        for spec in &self.stages {
            let report = DetailFetcher::new(&executor)
                .run(spec.source, spec.rule)
                .await?;
            if let Some(aborted) = Self::finish_stage(report, &mut reports) {
                return Ok(aborted);
            }
        }

        info!("Run completed");
        Ok(RunOutcome::Completed(reports))
    }

    fn finish_stage(report: StageReport, reports: &mut Vec<StageReport>) -> Option<RunOutcome> {
        info!(
            stage = %report.stage,
            stored = report.stored,
            cached = report.cached,
            skipped = report.skipped,
            paused = report.paused,
            cancelled = report.cancelled,
            write_failures = report.write_failures,
            "Stage finished"
        );

        let abort = report.abort.clone();
        let stage = report.stage.clone();
        reports.push(report);

        abort.map(|reason| {
            error!(stage = %stage, "Run aborted: {}", reason);
            RunOutcome::Aborted {
                stage,
                reason,
                reports: std::mem::take(reports),
            }
        })
    }
}
