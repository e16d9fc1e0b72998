//! OpenAI 兼容接口适配器（Groq / Together / OpenAI）
//!
//! 请求体用 `async-openai` 的类型构建，发送走共享的 `reqwest::Client`，
//! 这样可以拿到状态码和 `Retry-After` 做错误分类。

use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{GenerationRequest, ProviderAdapter};
use crate::error::ProviderError;
use crate::infrastructure::{check_status, map_reqwest_error};

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// OpenAI 兼容的聊天补全服务
pub struct OpenAiCompatAdapter {
    name: String,
    priority: u32,
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model: String,
}

impl OpenAiCompatAdapter {
    pub fn new(
        name: impl Into<String>,
        priority: u32,
        http: reqwest::Client,
        api_key: &str,
        api_base_url: &str,
        model: &str,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            http,
            api_key: api_key.to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    fn build_request(&self, request: &GenerationRequest) -> Result<CreateChatCompletionRequest, ProviderError> {
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system_prompt.as_str())
            .build()
            .map_err(|e| ProviderError::server(format!("请求构建失败: {}", e)))?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(request.prompt.as_str())
            .build()
            .map_err(|e| ProviderError::server(format!("请求构建失败: {}", e)))?;

        let messages = vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ];

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(request.options.temperature)
            .max_tokens(request.options.max_tokens)
            .top_p(request.options.top_p)
            .build()
            .map_err(|e| ProviderError::server(format!("请求构建失败: {}", e)))
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/models", self.api_base_url);
        match self.http.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("[{}] 探测失败: {}", self.name, e);
                false
            }
        }
    }

    async fn request(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let body = self.build_request(request)?;
        let url = format!("{}/chat/completions", self.api_base_url);
        debug!("[{}] 调用模型: {}", self.name, self.model);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response).await?;
        let parsed: ChatResponse = response.json().await.map_err(map_reqwest_error)?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty());

        match content {
            Some(content) => Ok(content.trim().to_string()),
            None => {
                warn!("[{}] 返回内容为空", self.name);
                Err(ProviderError::server("empty response"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenerationOptions;

    fn adapter(base_url: &str) -> OpenAiCompatAdapter {
        OpenAiCompatAdapter::new("groq", 0, reqwest::Client::new(), "test-key", base_url, "test-model")
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("Which gas do plants absorb?", "Answer with one letter.", GenerationOptions::for_mcq())
    }

    #[tokio::test]
    async fn test_chat_completion_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"model":"test-model","max_tokens":5}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"<think>CO2 is C</think> C"}}]}"#)
            .create_async()
            .await;

        let text = adapter(&format!("{}/v1/", server.url())).generate(&request()).await.unwrap();
        assert_eq!(text, "C");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_carries_retry_after() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_header("retry-after", "30")
            .with_body(r#"{"error":"slow down"}"#)
            .create_async()
            .await;

        let err = adapter(&format!("{}/v1", server.url())).generate(&request()).await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::RateLimited {
                retry_after: Some(std::time::Duration::from_secs(30))
            }
        );
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;

        let err = adapter(&format!("{}/v1", server.url())).generate(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_empty_choices_is_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let err = adapter(&format!("{}/v1", server.url())).generate(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::ServerError { status: None, .. }));
    }

    #[tokio::test]
    async fn test_availability_check_lists_models() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/models")
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        assert!(adapter(&format!("{}/v1", server.url())).is_available().await);
        assert!(!adapter(&format!("{}/missing", server.url())).is_available().await);
    }
}
