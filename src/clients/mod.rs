//! 外部服务客户端
//!
//! - 生成服务：统一的 [`ProviderAdapter`] 接口，各家 HTTP 协议差异都封装在适配器内部
//! - OCR 服务：[`OcrProvider`]

pub mod gemini;
pub mod huggingface;
pub mod local_llm;
pub mod ocr;
pub mod openai_compat;
pub mod reasoning;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, ProviderError};
use crate::infrastructure::build_http_client;
use crate::models::GenerationOptions;

pub use gemini::GeminiAdapter;
pub use huggingface::HuggingFaceAdapter;
pub use local_llm::LocalLlmAdapter;
pub use ocr::{OcrOutcome, OcrProvider, OcrSpaceClient};
pub use openai_compat::OpenAiCompatAdapter;
pub use reasoning::strip_reasoning;

/// 连接超时
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// 一次生成请求
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// 用户消息（题目）
    pub prompt: String,
    pub system_prompt: String,
    pub options: GenerationOptions,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, system_prompt: impl Into<String>, options: GenerationOptions) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: system_prompt.into(),
            options,
        }
    }
}

/// 生成服务适配器
///
/// 适配器只负责一次请求，不做重试、不做缓存，失败时返回分类好的 [`ProviderError`]。
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// 服务名称，用于日志和答案来源
    fn name(&self) -> &str;

    /// 优先级，数字越小越先尝试
    fn priority(&self) -> u32;

    /// 轻量探测服务是否可用
    async fn is_available(&self) -> bool;

    /// 发送请求，返回原始文本
    async fn request(&self, request: &GenerationRequest) -> Result<String, ProviderError>;

    /// 生成答案：原始文本去掉推理片段后返回
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let raw = self.request(request).await?;
        let text = strip_reasoning(&raw);
        if text.is_empty() {
            debug!("[{}] 回复只有推理片段", self.name());
            return Err(ProviderError::server("reasoning only"));
        }
        Ok(text)
    }
}

/// 按配置构建生成服务列表
///
/// 顺序与 `provider_order` 一致；未配置密钥的服务不注册
pub fn build_providers(config: &Config) -> Result<Vec<Arc<dyn ProviderAdapter>>, AppError> {
    let http = build_http_client(CONNECT_TIMEOUT)
        .map_err(|e| AppError::Other(format!("HTTP 客户端创建失败: {}", e)))?;

    let mut providers: Vec<Arc<dyn ProviderAdapter>> = Vec::new();
    for (index, name) in config.provider_order.iter().enumerate() {
        let priority = index as u32;
        let provider: Option<Arc<dyn ProviderAdapter>> = match name.as_str() {
            "groq" => keyed(&config.groq_api_key).then(|| {
                Arc::new(OpenAiCompatAdapter::new(
                    "groq",
                    priority,
                    http.clone(),
                    &config.groq_api_key,
                    &config.groq_api_base_url,
                    &config.groq_model,
                )) as Arc<dyn ProviderAdapter>
            }),
            "together" => keyed(&config.together_api_key).then(|| {
                Arc::new(OpenAiCompatAdapter::new(
                    "together",
                    priority,
                    http.clone(),
                    &config.together_api_key,
                    &config.together_api_base_url,
                    &config.together_model,
                )) as Arc<dyn ProviderAdapter>
            }),
            "openai" => keyed(&config.openai_api_key).then(|| {
                Arc::new(OpenAiCompatAdapter::new(
                    "openai",
                    priority,
                    http.clone(),
                    &config.openai_api_key,
                    &config.openai_api_base_url,
                    &config.openai_model,
                )) as Arc<dyn ProviderAdapter>
            }),
            "gemini" => keyed(&config.gemini_api_key).then(|| {
                Arc::new(GeminiAdapter::new(
                    priority,
                    http.clone(),
                    &config.gemini_api_key,
                    &config.gemini_api_base_url,
                    &config.gemini_model,
                )) as Arc<dyn ProviderAdapter>
            }),
            "huggingface" => keyed(&config.huggingface_api_key).then(|| {
                Arc::new(HuggingFaceAdapter::new(
                    priority,
                    http.clone(),
                    &config.huggingface_api_key,
                    &config.huggingface_api_base_url,
                    &config.huggingface_model,
                )) as Arc<dyn ProviderAdapter>
            }),
            "local" => config.local_llm_enabled.then(|| {
                Arc::new(LocalLlmAdapter::new(
                    priority,
                    http.clone(),
                    &config.local_llm_base_url,
                    &config.local_llm_model,
                )) as Arc<dyn ProviderAdapter>
            }),
            other => {
                return Err(crate::error::ConfigError::UnknownProvider(other.to_string()).into());
            }
        };

        match provider {
            Some(provider) => {
                info!("✓ 已注册生成服务: {} (优先级 {})", provider.name(), priority);
                providers.push(provider);
            }
            None => debug!("跳过未配置的生成服务: {}", name),
        }
    }

    Ok(providers)
}

fn keyed(api_key: &str) -> bool {
    !api_key.trim().is_empty()
}
