//! 本地 vLLM 适配器（OpenAI completions 接口，无鉴权）

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerationRequest, ProviderAdapter};
use crate::error::ProviderError;
use crate::infrastructure::{check_status, map_reqwest_error};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: String,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

/// 本地部署的模型服务
pub struct LocalLlmAdapter {
    priority: u32,
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl LocalLlmAdapter {
    pub fn new(priority: u32, http: reqwest::Client, base_url: &str, model: &str) -> Self {
        Self {
            priority,
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for LocalLlmAdapter {
    fn name(&self) -> &str {
        "local"
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    async fn is_available(&self) -> bool {
        match self.http.get(format!("{}/models", self.base_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("[local] 探测失败: {}", e);
                false
            }
        }
    }

    async fn request(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let body = CompletionRequest {
            model: &self.model,
            prompt: format!("{}\n\nQuestion: {}\nAnswer:", request.system_prompt, request.prompt),
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
            top_p: request.options.top_p,
        };

        let response = self
            .http
            .post(format!("{}/completions", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response).await?;
        let parsed: CompletionResponse = response.json().await.map_err(map_reqwest_error)?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ProviderError::server("empty response"))
    }
}
