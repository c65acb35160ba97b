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

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// 传输层错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// URL 非法
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// 远程 API 响应
///
/// 响应体保持原始字节，由分类器决定是否解码
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP状态码
    pub status_code: u16,
    /// 状态原因短语
    pub reason: String,
    /// 响应内容
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status_code: u16, body: impl Into<Vec<u8>>) -> Self {
        let reason = reqwest::StatusCode::from_u16(status_code)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
            .to_string();
        Self {
            status_code,
            reason,
            body: body.into(),
        }
    }

    pub fn json(status_code: u16, body: &Value) -> Self {
        Self::new(status_code, body.to_string())
    }
}

/// 远程 API 传输特质
///
/// 基础 URL、认证和 Cookie 在实现内部固定，调用方只提供路径
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// 发送 GET 请求
    async fn get(&self, path: &str) -> Result<ApiResponse, TransportError>;

    /// 发送带 JSON 请求体的 POST 请求
    async fn post_json(&self, path: &str, body: &Value) -> Result<ApiResponse, TransportError>;
}
