//! 错误类型
//!
//! 分层错误：生成路径上的 `ProviderError` 全部在编排层内部消化，
//! 只有评分输入校验错误 `ScoringError` 会返回给调用方。

use std::time::Duration;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 文本生成服务错误
    #[error("生成服务错误: {0}")]
    Provider(#[from] ProviderError),
    /// 评分输入错误
    #[error("评分错误: {0}")]
    Scoring(#[from] ScoringError),
    /// OCR 服务错误
    #[error("OCR错误: {0}")]
    Ocr(#[from] OcrError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 文本生成服务错误
///
/// 编排器根据错误种类决定重试还是直接切换到下一个服务。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// 请求超时
    #[error("请求超时")]
    Timeout,
    /// 请求频率限制
    #[error("请求频率限制, 建议等待: {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },
    /// 鉴权失败
    #[error("鉴权失败: {0}")]
    Unauthorized(String),
    /// 服务端错误
    #[error("服务端错误 (status={status:?}): {message}")]
    ServerError {
        status: Option<u16>,
        message: String,
    },
    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// 同一服务重试是否有意义
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Timeout | ProviderError::NetworkError(_) | ProviderError::ServerError { .. }
        )
    }

    /// 构造无状态码的服务端错误
    pub fn server(message: impl Into<String>) -> Self {
        ProviderError::ServerError {
            status: None,
            message: message.into(),
        }
    }
}

/// 评分输入错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// 缺少标准答案或学生答案
    #[error("评分输入无效: {field} 不能为空")]
    InputInvalid { field: &'static str },
}

/// OCR 服务错误
#[derive(Debug, Error)]
pub enum OcrError {
    /// 网络请求失败
    #[error("OCR请求失败: {0}")]
    Request(#[from] reqwest::Error),
    /// 响应格式无法解析
    #[error("OCR响应解析失败: {0}")]
    Parse(String),
    /// 服务拒绝处理
    #[error("OCR服务拒绝处理: {0}")]
    Rejected(String),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 解析文件失败
    #[error("解析文件失败 ({path}): {message}")]
    ParseFailed { path: String, message: String },
}

/// 配置错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 配置项取值无效
    #[error("配置项 {key} 无效: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    /// 未知的生成服务名称
    #[error("未知的生成服务: {0}")]
    UnknownProvider(String),
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Other(format!("TOML解析失败: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(format!("JSON解析失败: {}", err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取失败错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建配置取值错误
    pub fn invalid_config(key: &'static str, reason: impl Into<String>) -> Self {
        AppError::Config(ConfigError::InvalidValue {
            key,
            reason: reason.into(),
        })
    }
}

/// 结果类型别名
pub type AppResult<T> = Result<T, AppError>;
