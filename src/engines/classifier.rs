// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::outcome::ClassificationOutcome;
use crate::engines::traits::ApiResponse;
use serde_json::Value;

/// 按状态码决定的处理动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseAction {
    Accept,
    Warn,
    PauseRetry,
    FatalAbort,
}

/// 根据 HTTP 状态码决定处理动作
///
/// 认证失败不是瞬时错误，重试只会浪费并发额度；5xx 视为瞬时错误
pub fn action_for(status_code: u16) -> ResponseAction {
    match status_code {
        200 => ResponseAction::Accept,
        401 | 403 => ResponseAction::FatalAbort,
        s if s >= 500 => ResponseAction::PauseRetry,
        _ => ResponseAction::Warn,
    }
}

/// 空载荷不缓存，下次运行会重新请求
fn is_empty(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

/// 对响应进行分类
///
/// 只有 200 且响应体能解码为非空 JSON 时才会被接受
pub fn classify(response: &ApiResponse) -> ClassificationOutcome {
    let status = format!("{} {}", response.status_code, response.reason)
        .trim_end()
        .to_string();

    match action_for(response.status_code) {
        ResponseAction::Accept => match serde_json::from_slice::<Value>(&response.body) {
            Ok(payload) if is_empty(&payload) => {
                ClassificationOutcome::Skip("empty response body".to_string())
            }
            Ok(payload) => ClassificationOutcome::Accept(payload),
            Err(e) => ClassificationOutcome::Skip(format!("malformed response body: {}", e)),
        },
        ResponseAction::Warn => ClassificationOutcome::Skip(format!("unexpected status {}", status)),
        ResponseAction::PauseRetry => ClassificationOutcome::PauseAndRetryOnce,
        ResponseAction::FatalAbort => {
            ClassificationOutcome::FatalAbort(format!("authentication rejected: {}", status))
        }
    }
}
