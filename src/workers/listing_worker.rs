// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing::{debug, info, instrument, warn};

use crate::config::settings::ListingSettings;
use crate::domain::models::collection::{Collection, RecordKey};
use crate::domain::models::outcome::StageReport;
use crate::domain::models::task::{FetchTask, ListingQuery, RemoteRequest, SortBy};
use crate::utils::errors::PipelineError;
use crate::workers::executor::FetchExecutor;

/// 列表分页阶段
///
/// 没有上游集合，按页号 POST 搜索接口，每页原样写入 `pages` 集合
pub struct ListingFetcher<'a> {
    executor: &'a FetchExecutor,
    settings: &'a ListingSettings,
}

impl<'a> ListingFetcher<'a> {
    pub fn new(executor: &'a FetchExecutor, settings: &'a ListingSettings) -> Self {
        Self { executor, settings }
    }

    /// 抓取 `[start_page, start_page + page_count]` 范围内（含两端）尚未缓存的页
    #[instrument(skip(self))]
    pub async fn run(&self, start_page: u32, page_count: u32) -> Result<StageReport, PipelineError> {
        let collection = Collection::Pages;
        let mut report = StageReport::new(collection.dir_name());
        let last_page = start_page.saturating_add(page_count);

        let mut tasks = Vec::new();
        for page in start_page..=last_page {
            report.discovered += 1;
            let key = RecordKey::from(page);
            match self.executor.store().exists(collection, &key).await {
                Ok(true) => {
                    debug!(page, "Page already cached, skipping request");
                    report.cached += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => warn!(page, "Presence check failed: {}", e),
            }

            tasks.push(FetchTask {
                collection,
                key,
                request: RemoteRequest::Post {
                    path: ListingQuery::PATH.to_string(),
                    body: serde_json::to_value(self.query(page))?,
                },
            });
        }
        report.scheduled = tasks.len();

        info!(
            "Stage {}: pages {}..={}, {} cached, {} to fetch",
            collection, start_page, last_page, report.cached, report.scheduled
        );

        Ok(self.executor.run_tasks(tasks, report).await)
    }

    fn query(&self, page: u32) -> ListingQuery {
        ListingQuery {
            page,
            per_page: self.settings.per_page,
            sort_by: SortBy {
                last_delivery: self.settings.sort_order,
            },
            load_status: self.settings.load_status.clone(),
        }
    }
}
