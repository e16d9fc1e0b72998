//! HuggingFace Inference API 适配器

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerationRequest, ProviderAdapter};
use crate::error::ProviderError;
use crate::infrastructure::{check_status, map_reqwest_error};

/// 探测请求只生成几个 token
const AVAILABILITY_MAX_NEW_TOKENS: u32 = 5;

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_new_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// 返回体可能是数组也可能是单个对象
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Many(Vec<GeneratedText>),
    One(GeneratedText),
}

impl InferenceResponse {
    fn into_text(self) -> Option<String> {
        match self {
            InferenceResponse::Many(items) => items.into_iter().next().map(|item| item.generated_text),
            InferenceResponse::One(item) => Some(item.generated_text),
        }
    }
}

/// 按指令模型的对话格式拼接输入
fn format_inputs(system_prompt: &str, prompt: &str) -> String {
    format!("<|system|>\n{}\n<|user|>\nQuestion: {}\n<|assistant|>", system_prompt, prompt)
}

/// HuggingFace 文本生成服务
pub struct HuggingFaceAdapter {
    priority: u32,
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model: String,
}

impl HuggingFaceAdapter {
    pub fn new(priority: u32, http: reqwest::Client, api_key: &str, api_base_url: &str, model: &str) -> Self {
        Self {
            priority,
            http,
            api_key: api_key.to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    fn url(&self) -> String {
        format!("{}/{}", self.api_base_url, self.model)
    }

    async fn post(&self, body: &InferenceRequest<'_>) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response).await?;
        let parsed: InferenceResponse = response.json().await.map_err(map_reqwest_error)?;
        parsed
            .into_text()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ProviderError::server("empty response"))
    }
}

#[async_trait]
impl ProviderAdapter for HuggingFaceAdapter {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    async fn is_available(&self) -> bool {
        let body = InferenceRequest {
            inputs: "Hello",
            parameters: InferenceParameters {
                temperature: None,
                max_new_tokens: AVAILABILITY_MAX_NEW_TOKENS,
                top_p: None,
                return_full_text: false,
            },
        };
        match self.post(&body).await {
            Ok(_) => true,
            Err(e) => {
                debug!("[huggingface] 探测失败: {}", e);
                false
            }
        }
    }

    async fn request(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let inputs = format_inputs(&request.system_prompt, &request.prompt);
        let body = InferenceRequest {
            inputs: &inputs,
            parameters: InferenceParameters {
                temperature: Some(request.options.temperature),
                max_new_tokens: request.options.max_tokens,
                top_p: Some(request.options.top_p),
                return_full_text: false,
            },
        };
        debug!("[huggingface] 调用模型: {}", self.model);
        self.post(&body).await
    }
}
