//! HTTP 基础设施
//!
//! 共享的 `reqwest::Client` 以及 HTTP 状态码 → `ProviderError` 的统一映射，
//! 所有生成服务适配器都走这里，不各自判断状态码。

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::error::ProviderError;

/// 错误信息里最多保留的响应体长度
const MAX_ERROR_BODY_CHARS: usize = 200;

/// 构建共享 HTTP 客户端
///
/// 超时由编排层统一控制，这里只设置连接超时
pub fn build_http_client(connect_timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .user_agent(concat!("exam_grader/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// 解析 `Retry-After`（只支持秒数）
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// 状态码 → 错误类型
pub fn status_to_error(status: StatusCode, retry_after: Option<Duration>, body: &str) -> ProviderError {
    let message = crate::utils::truncate_text(body.trim(), MAX_ERROR_BODY_CHARS);
    match status.as_u16() {
        401 | 403 => ProviderError::Unauthorized(message),
        402 | 429 => ProviderError::RateLimited { retry_after },
        code => ProviderError::ServerError {
            status: Some(code),
            message,
        },
    }
}

/// 非 2xx 响应转成错误，2xx 原样返回
pub async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let retry_after = parse_retry_after(response.headers());
    let body = response.text().await.unwrap_or_default();
    debug!("HTTP 请求失败: status={}, body={}", status, body);
    Err(status_to_error(status, retry_after, &body))
}

/// 传输层错误映射
pub fn map_reqwest_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else if err.is_decode() {
        ProviderError::server(format!("响应解析失败: {}", err))
    } else if let Some(status) = err.status() {
        status_to_error(status, None, &err.to_string())
    } else {
        ProviderError::NetworkError(err.to_string())
    }
}
