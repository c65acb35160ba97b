// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::Value;
use tracing::warn;

use crate::domain::models::collection::{Collection, Record, RecordKey};

/// 键抽取规则
///
/// 从上游记录中纯函数式地推导下游集合的键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionRule {
    /// 分页 -> 货运单：数组中每个元素的 `number`
    LoadNumbers,
    /// 货运单 -> 行程单：`travelOrders[*].number`
    TravelOrderNumbers,
    /// 货运单 -> 卡车：仅取 `travelOrders[0].truck.number`
    FirstTruckNumber,
    /// 货运单 -> 车主：`bookedByDispatcher.id`
    DispatcherId,
    /// 货运单 -> 客户：`bookedWithCustomer.id`
    CustomerId,
}

impl ExtractionRule {
    /// 规则产出的键所属的目标集合
    pub fn target(&self) -> Collection {
        match self {
            ExtractionRule::LoadNumbers => Collection::Loads,
            ExtractionRule::TravelOrderNumbers => Collection::TravelOrders,
            ExtractionRule::FirstTruckNumber => Collection::Trucks,
            ExtractionRule::DispatcherId => Collection::Owners,
            ExtractionRule::CustomerId => Collection::Customers,
        }
    }

    /// 对一条记录应用规则
    ///
    /// 字段缺失或类型不符时不产出键；非法键记录警告后丢弃
    pub fn extract(&self, record: &Record) -> Vec<RecordKey> {
        let payload = &record.payload;
        let raw: Vec<&Value> = match self {
            ExtractionRule::LoadNumbers => payload
                .as_array()
                .map(|items| items.iter().filter_map(|item| item.get("number")).collect())
                .unwrap_or_default(),
            ExtractionRule::TravelOrderNumbers => travel_orders(payload)
                .iter()
                .filter_map(|order| order.get("number"))
                .collect(),
            // Later travel orders on the same load are never inspected.
            ExtractionRule::FirstTruckNumber => travel_orders(payload)
                .first()
                .and_then(|order| order.get("truck"))
                .and_then(|truck| truck.get("number"))
                .into_iter()
                .collect(),
            ExtractionRule::DispatcherId => payload
                .get("bookedByDispatcher")
                .and_then(|v| v.get("id"))
                .into_iter()
                .collect(),
            ExtractionRule::CustomerId => payload
                .get("bookedWithCustomer")
                .and_then(|v| v.get("id"))
                .into_iter()
                .collect(),
        };

        raw.into_iter()
            .filter_map(|value| match RecordKey::from_json(value)? {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!(
                        source = %record.collection,
                        source_key = %record.key,
                        "Ignoring extracted key: {}",
                        e
                    );
                    None
                }
            })
            .collect()
    }
}

fn travel_orders(payload: &Value) -> &[Value] {
    payload
        .get("travelOrders")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}
