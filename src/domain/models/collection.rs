// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// 集合类型
///
/// 每个流水线阶段对应一个持久化集合，一个集合对应存储根目录下的一个子目录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// 列表分页
    Pages,
    /// 货运单详情
    Loads,
    /// 行程单详情
    TravelOrders,
    /// 卡车详情
    Trucks,
    /// 车主详情
    Owners,
    /// 客户详情
    Customers,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Pages,
        Collection::Loads,
        Collection::TravelOrders,
        Collection::Trucks,
        Collection::Owners,
        Collection::Customers,
    ];

    /// 集合在存储根目录下的目录名
    pub fn dir_name(&self) -> &'static str {
        match self {
            Collection::Pages => "pages",
            Collection::Loads => "load_details",
            Collection::TravelOrders => "travel_order_details",
            Collection::Trucks => "truck_details",
            Collection::Owners => "owner_details",
            Collection::Customers => "customer_details",
        }
    }

    /// 记录文件名前缀，文件名格式为 `{prefix}{key}.json`
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Collection::Pages => "sp_loads_page_",
            Collection::Loads => "load_",
            Collection::TravelOrders => "travel_order_",
            Collection::Trucks => "truck_",
            Collection::Owners => "owner_",
            Collection::Customers => "customer_",
        }
    }

    /// 根据键生成记录文件名
    pub fn file_name(&self, key: &RecordKey) -> String {
        format!("{}{}.json", self.file_prefix(), key.as_str())
    }

    /// 从文件名反解出记录键
    ///
    /// 隐藏文件、临时文件以及不符合本集合命名规则的文件返回 `None`
    pub fn key_from_file_name(&self, file_name: &str) -> Option<RecordKey> {
        if file_name.starts_with('.') {
            return None;
        }
        let raw = file_name
            .strip_prefix(self.file_prefix())?
            .strip_suffix(".json")?;
        RecordKey::parse(raw).ok()
    }

    /// 详情资源的远程路径
    ///
    /// 列表分页通过 POST 请求获取，没有按键寻址的路径
    pub fn detail_path(&self, key: &RecordKey) -> Option<String> {
        let prefix = match self {
            Collection::Pages => return None,
            Collection::Loads => "/api/sp-loads",
            Collection::TravelOrders => "/api/travel-order",
            Collection::Trucks => "/api/trucks/search",
            Collection::Owners => "/api/owners",
            Collection::Customers => "/api/customers",
        };
        Some(format!("{}/{}", prefix, urlencoding::encode(key.as_str())))
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// 非法记录键
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid record key {0:?}")]
pub struct InvalidKey(pub String);

/// 记录键
///
/// 键直接用作文件名的一部分，因此禁止空串、路径分隔符、`..` 和控制字符。
/// 不做任何规范化：`"007"` 与 `"7"` 是两个不同的键。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn parse(raw: &str) -> Result<Self, InvalidKey> {
        let valid = !raw.is_empty()
            && !raw.contains(['/', '\\'])
            && !raw.contains("..")
            && !raw.chars().any(char::is_control);
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidKey(raw.to_string()))
        }
    }

    /// 从 JSON 值中取键，只接受字符串和整数
    pub fn from_json(value: &Value) -> Option<Result<Self, InvalidKey>> {
        match value {
            Value::String(s) => Some(Self::parse(s)),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(Self::parse(&n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u32> for RecordKey {
    fn from(page: u32) -> Self {
        Self(page.to_string())
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 已持久化的记录
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub collection: Collection,
    pub key: RecordKey,
    pub payload: Value,
}
