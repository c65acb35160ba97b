// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` 未设置时使用的过滤规则
pub const DEFAULT_FILTER: &str = "info,harvestrs=debug";

/// 选择日志输出格式的环境变量
pub const LOG_FORMAT_ENV: &str = "HARVESTRS_LOG_FORMAT";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 人类可读的单行输出
    Text,
    /// 每条事件一行 JSON，便于日志收集
    Json,
}

impl LogFormat {
    /// 解析格式名称，无法识别时回退为文本
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref())
    }
}

/// 初始化全局 tracing 订阅者
///
/// 过滤规则取自 `RUST_LOG`，格式取自 `HARVESTRS_LOG_FORMAT`
pub fn init_telemetry() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match LogFormat::from_env() {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}
