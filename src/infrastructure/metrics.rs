// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::config::settings::MetricsSettings;
use crate::domain::models::collection::Collection;
use crate::domain::models::outcome::TaskOutcome;

/// 安装 Prometheus 导出器
///
/// 未启用时不安装记录器，指标宏为空操作
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", settings.listen_addr, e);
            return;
        }
    };

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}", e);
        return;
    }

    info!("Metrics exporter listening on {}", addr);
}

pub fn record_task(collection: Collection, outcome: &TaskOutcome) {
    counter!(
        "harvest_tasks_total",
        "collection" => collection.dir_name(),
        "outcome" => outcome.label()
    )
    .increment(1);
}

pub fn set_in_flight(in_flight: usize) {
    gauge!("harvest_gate_in_flight").set(in_flight as f64);
}
