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

use crate::config::settings::ApiSettings;
use crate::engines::traits::{ApiResponse, ApiTransport, TransportError};
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use url::Url;

/// 远程 API 传输
///
/// 基于reqwest实现，整个运行共享一个客户端；认证头和 Cookie 在构建时固定
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// 根据 API 配置构建传输
    ///
    /// # 参数
    ///
    /// * `settings` - API 配置
    ///
    /// # 返回值
    ///
    /// * `Ok(ReqwestTransport)` - 构建成功
    /// * `Err(TransportError)` - URL 或请求头非法，或客户端构建失败
    pub fn new(settings: &ApiSettings) -> Result<Self, TransportError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", settings.base_url, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_str(&settings.accept_language)
                .map_err(|e| TransportError::Other(format!("Invalid Accept-Language: {}", e)))?,
        );
        if let Some(token) = &settings.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| TransportError::Other(format!("Invalid token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let jar = Jar::default();
        for (name, value) in &settings.cookies {
            jar.add_cookie_str(&format!("{}={}", name, value), &base_url);
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .cookie_provider(Arc::new(jar));

        if let Some(timeout) = settings.timeout() {
            builder = builder.timeout(timeout);
        }

        // Handle TLS verification
        if settings.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        // Paths are absolute API paths; keep any prefix the base URL carries.
        let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", joined, e)))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<ApiResponse, TransportError> {
        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        debug!(
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Response received"
        );

        Ok(ApiResponse {
            status_code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            body: body.to_vec(),
        })
    }
}

#[async_trait]
impl ApiTransport for ReqwestTransport {
    async fn get(&self, path: &str) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(path)?;
        self.send(self.client.get(url)).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(path)?;
        self.send(self.client.post(url).json(body)).await
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
