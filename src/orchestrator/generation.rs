//! 标准答案生成编排器 - 编排层
//!
//! 单题状态机：
//!
//! ```text
//! 查缓存 → 命中：返回
//!        → 未命中：按优先级逐个尝试生成服务
//!                  → 成功：写缓存并返回
//!                  → 全部失败：模板 → 默认文案
//! ```
//!
//! - 探测不可用或处于熔断中的服务直接跳过
//! - 超时/网络/服务端错误在同一服务上指数退避重试
//! - 限流、鉴权失败立即切换到下一个服务
//! - 任何错误都在这里消化，调用方总能拿到一个答案

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use super::circuit::ProviderCircuit;
use super::prompts::{build_prompt, refine_answer, system_prompt};
use crate::clients::{GenerationRequest, ProviderAdapter};
use crate::config::Config;
use crate::error::ProviderError;
use crate::models::{AnswerSource, GenerationOptions, ModelAnswer, Question, QuestionType};
use crate::services::templates::default_answer;
use crate::services::{AnswerStore, TemplateLibrary};
use crate::utils::truncate_text;

/// 生成相关的超时与重试参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSettings {
    pub generation_timeout: Duration,
    pub availability_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub open_ended_max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            generation_timeout: Duration::from_secs(30),
            availability_timeout: Duration::from_secs(5),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1000),
            open_ended_max_tokens: 150,
        }
    }
}

impl GenerationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            generation_timeout: config.generation_timeout(),
            availability_timeout: config.availability_timeout(),
            max_retries: config.max_retries,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
            open_ended_max_tokens: config.open_ended_max_tokens,
        }
    }

    /// 第 `attempt` 次重试前的等待时间（从 0 开始）：1s, 2s, 4s ...
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_base_delay.saturating_mul(1u32 << attempt.min(16))
    }

    fn options_for(&self, question_type: QuestionType) -> GenerationOptions {
        match question_type {
            QuestionType::Mcq => GenerationOptions::for_mcq(),
            QuestionType::OpenEnded => GenerationOptions::for_open_ended(self.open_ended_max_tokens),
        }
    }
}

/// 标准答案生成编排器
pub struct GenerationOrchestrator {
    providers: Vec<Arc<dyn ProviderAdapter>>,
    cache: Arc<dyn AnswerStore>,
    templates: TemplateLibrary,
    circuit: ProviderCircuit,
    settings: GenerationSettings,
}

impl GenerationOrchestrator {
    /// 创建编排器，服务按优先级排序
    pub fn new(
        mut providers: Vec<Arc<dyn ProviderAdapter>>,
        cache: Arc<dyn AnswerStore>,
        templates: TemplateLibrary,
        settings: GenerationSettings,
    ) -> Self {
        providers.sort_by_key(|p| p.priority());
        Self {
            providers,
            cache,
            templates,
            circuit: ProviderCircuit::new(),
            settings,
        }
    }

    /// 已注册的服务名称（按优先级）
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// 只查缓存
    pub fn cached(&self, question: &Question) -> Option<ModelAnswer> {
        self.cache
            .get(&question.normalized_text)
            .map(|text| ModelAnswer::new(question.key(), text, AnswerSource::Cache))
    }

    /// 生成标准答案，永不失败
    pub async fn generate(&self, question: &Question) -> ModelAnswer {
        if let Some(answer) = self.cached(question) {
            debug!("[{}] 💾 命中缓存", question.id);
            return answer;
        }

        if let Some((provider, text)) = self.try_providers(question).await {
            self.cache.put(&question.normalized_text, &text);
            info!("[{}] ✓ {} 生成答案: {}", question.id, provider, truncate_text(&text, 60));
            return ModelAnswer::new(question.key(), text, AnswerSource::Provider(provider));
        }

        self.fallback(question)
    }

    /// 按优先级逐个尝试，返回 (服务名, 整理后的答案)
    async fn try_providers(&self, question: &Question) -> Option<(String, String)> {
        let request = GenerationRequest::new(
            build_prompt(&question.normalized_text, question.question_type),
            system_prompt(question.question_type),
            self.settings.options_for(question.question_type),
        );

        for provider in &self.providers {
            let name = provider.name();
            if self.circuit.is_open(name) {
                debug!("[{}] 跳过熔断中的服务: {}", question.id, name);
                continue;
            }

            let available = timeout(self.settings.availability_timeout, provider.is_available())
                .await
                .unwrap_or(false);
            if !available {
                warn!("[{}] ⚠️ {} 不可用，跳过", question.id, name);
                continue;
            }

            match self.call_with_retry(provider.as_ref(), &request).await {
                Ok(raw) => match refine_answer(&raw, question.question_type) {
                    Some(answer) => return Some((name.to_string(), answer)),
                    None => warn!(
                        "[{}] ⚠️ {} 的回复无法使用: {}",
                        question.id,
                        name,
                        truncate_text(&raw, 60)
                    ),
                },
                Err(e) => {
                    warn!(provider = %name, "[{}] ❌ 生成失败: {}", question.id, e);
                    self.circuit.record_failure(name, &e);
                }
            }
        }

        None
    }

    /// 单个服务：超时控制 + 指数退避重试
    async fn call_with_retry(
        &self,
        provider: &dyn ProviderAdapter,
        request: &GenerationRequest,
    ) -> Result<String, ProviderError> {
        let mut attempt = 0u32;
        loop {
            let result = match timeout(self.settings.generation_timeout, provider.generate(request)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout),
            };

            match result {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.settings.max_retries => {
                    let delay = self.settings.backoff(attempt);
                    attempt += 1;
                    warn!(
                        provider = %provider.name(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "🔄 {}，稍后重试",
                        e
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// 所有服务都失败：模板 → 默认文案
    fn fallback(&self, question: &Question) -> ModelAnswer {
        if let Some(answer) = self.templates.lookup(&question.normalized_text, question.question_type) {
            warn!("[{}] ⚠️ 所有生成服务失败，使用模板答案", question.id);
            return ModelAnswer::new(question.key(), answer, AnswerSource::Template);
        }

        warn!("[{}] ⚠️ 所有生成服务失败且无匹配模板，使用默认文案", question.id);
        ModelAnswer::new(
            question.key(),
            default_answer(question.question_type),
            AnswerSource::Default,
        )
    }
}
