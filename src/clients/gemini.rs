//! Google Gemini 适配器

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerationRequest, ProviderAdapter};
use crate::error::ProviderError;
use crate::infrastructure::{check_status, map_reqwest_error};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

/// Gemini generateContent 接口
pub struct GeminiAdapter {
    priority: u32,
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model: String,
}

impl GeminiAdapter {
    pub fn new(priority: u32, http: reqwest::Client, api_key: &str, api_base_url: &str, model: &str) -> Self {
        Self {
            priority,
            http,
            api_key: api_key.to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn name(&self) -> &str {
        "gemini"
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/models/{}", self.api_base_url, self.model);
        match self.http.get(&url).query(&[("key", &self.api_key)]).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("[gemini] 探测失败: {}", e);
                false
            }
        }
    }

    async fn request(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let body = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: &request.system_prompt,
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart { text: &request.prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: request.options.temperature,
                max_output_tokens: request.options.max_tokens,
                top_p: request.options.top_p,
            },
        };

        let url = format!("{}/models/{}:generateContent", self.api_base_url, self.model);
        debug!("[gemini] 调用模型: {}", self.model);

        let response = self
            .http
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response).await?;
        let parsed: GeminiResponse = response.json().await.map_err(map_reqwest_error)?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::server("empty response"));
        }
        Ok(text.trim().to_string())
    }
}
