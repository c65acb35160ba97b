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

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::domain::models::task::SortOrder;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.0.1 Safari/605.1.15";

/// 应用程序配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 远程 API 配置
    pub api: ApiSettings,
    /// 列表分页配置
    pub listing: ListingSettings,
    /// 并发控制配置
    pub concurrency: ConcurrencySettings,
    /// 服务端错误暂停配置
    pub backoff: BackoffSettings,
    /// 存储配置
    pub storage: StorageSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 远程 API 配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// 基础 URL
    pub base_url: String,
    /// Bearer 令牌，未设置时不发送 Authorization 头
    pub token: Option<String>,
    /// 每次请求附带的 Cookie
    #[serde(default)]
    pub cookies: HashMap<String, String>,
    pub user_agent: String,
    pub accept_language: String,
    /// 是否跳过TLS验证
    pub accept_invalid_certs: bool,
    /// 单次请求超时时间（秒），未设置时使用传输层默认值
    pub timeout_secs: Option<u64>,
}

impl ApiSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// 列表分页配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ListingSettings {
    /// 起始页
    pub start_page: u32,
    /// 抓取页数，抓取范围为 `[start_page, start_page + page_count]`
    pub page_count: u32,
    /// 每页条数
    pub per_page: u32,
    /// 按最后交付时间排序的方向
    pub sort_order: SortOrder,
    /// 货运单状态过滤
    pub load_status: Vec<String>,
}

/// 并发控制配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ConcurrencySettings {
    /// 同时在途的远程请求上限
    pub limit: usize,
}

/// 服务端错误暂停配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BackoffSettings {
    /// 5xx 之后的固定暂停时间（秒）
    pub server_error_pause_secs: u64,
}

impl BackoffSettings {
    pub fn server_error_pause(&self) -> Duration {
        Duration::from_secs(self.server_error_pause_secs)
    }
}

/// 存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// 各集合目录所在的根目录
    pub root: String,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加默认值、`config/default`、`config/{HARVESTRS_ENV}` 和 `HARVESTRS__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载并校验的配置
    /// * `Err(ConfigError)` - 配置加载或校验失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("HARVESTRS_ENV").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("HARVESTRS").separator("__"));

        Self::from_builder(builder)
    }

    /// 内置默认值
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("api.user_agent", DEFAULT_USER_AGENT)?
            .set_default("api.accept_language", "en")?
            .set_default("api.accept_invalid_certs", true)?
            .set_default("listing.start_page", 1)?
            .set_default("listing.page_count", 3)?
            .set_default("listing.per_page", 50)?
            .set_default("listing.sort_order", "desc")?
            .set_default("listing.load_status", vec!["Completed"])?
            .set_default("concurrency.limit", 3)?
            .set_default("backoff.server_error_pause_secs", 30)?
            .set_default("storage.root", ".")?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }

    /// 从给定的配置构建器加载并校验
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 校验配置项
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.api.base_url)
            .map_err(|e| ConfigError::Message(format!("api.base_url is invalid: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Message(format!(
                "api.base_url must be http(s), got {}",
                url.scheme()
            )));
        }
        if self.concurrency.limit == 0 {
            return Err(ConfigError::Message(
                "concurrency.limit must be at least 1".to_string(),
            ));
        }
        if self.listing.per_page == 0 {
            return Err(ConfigError::Message(
                "listing.per_page must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
