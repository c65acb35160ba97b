// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::collection::{Collection, RecordKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 远程请求形态
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteRequest {
    /// GET 详情资源
    Get { path: String },
    /// POST JSON 请求体
    Post { path: String, body: Value },
}

impl RemoteRequest {
    pub fn path(&self) -> &str {
        match self {
            RemoteRequest::Get { path } | RemoteRequest::Post { path, .. } => path,
        }
    }
}

/// 抓取任务
///
/// 键通过缓存存在性过滤后创建，由一个并发工作单元消费，结果分类后即丢弃
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTask {
    pub collection: Collection,
    pub key: RecordKey,
    pub request: RemoteRequest,
}

impl FetchTask {
    /// 构建详情抓取任务，列表集合没有详情路径时返回 `None`
    pub fn detail(collection: Collection, key: RecordKey) -> Option<Self> {
        let path = collection.detail_path(&key)?;
        Some(Self {
            collection,
            key,
            request: RemoteRequest::Get { path },
        })
    }
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// 列表排序字段
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortBy {
    pub last_delivery: SortOrder,
}

/// 列表分页查询请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    pub page: u32,
    pub per_page: u32,
    pub sort_by: SortBy,
    pub load_status: Vec<String>,
}

impl ListingQuery {
    pub const PATH: &'static str = "/api/sp-loads";
}
