//! 集成测试共用的脚本化生成服务

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use exam_grader::clients::{GenerationRequest, ProviderAdapter};
use exam_grader::orchestrator::GenerationSettings;
use exam_grader::services::{AnswerCache, ManualClock, QuestionClassifier, TemplateLibrary, TextNormalizer};
use exam_grader::{GenerationOrchestrator, ProviderError, Question};

/// 按脚本依次返回结果的生成服务，脚本用完后返回 `fallback`
pub struct ScriptedProvider {
    name: &'static str,
    priority: u32,
    available: bool,
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    fallback: Result<String, ProviderError>,
    /// 每次调用前的延迟，用于模拟超时
    latency: Duration,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(name: &'static str, priority: u32) -> Self {
        Self {
            name,
            priority,
            available: true,
            script: Mutex::new(VecDeque::new()),
            fallback: Err(ProviderError::server("script exhausted")),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, result: Result<&str, ProviderError>) -> Self {
        self.script.lock().unwrap().push_back(result.map(str::to_string));
        self
    }

    pub fn always(mut self, result: Result<&str, ProviderError>) -> Self {
        self.fallback = result.map(str::to_string);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn request(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

pub fn rate_limited() -> ProviderError {
    ProviderError::RateLimited { retry_after: None }
}

pub fn test_cache() -> (Arc<AnswerCache<Arc<ManualClock>>>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let cache = AnswerCache::with_clock(Duration::from_secs(24 * 60 * 60), None, clock.clone());
    (Arc::new(cache), clock)
}

/// 用给定的服务组装编排器
pub fn orchestrator(providers: Vec<Arc<ScriptedProvider>>) -> Arc<GenerationOrchestrator> {
    let (cache, _) = test_cache();
    orchestrator_with_cache(providers, cache)
}

pub fn orchestrator_with_cache(
    providers: Vec<Arc<ScriptedProvider>>,
    cache: Arc<AnswerCache<Arc<ManualClock>>>,
) -> Arc<GenerationOrchestrator> {
    let providers = providers
        .into_iter()
        .map(|p| p as Arc<dyn ProviderAdapter>)
        .collect();
    Arc::new(GenerationOrchestrator::new(
        providers,
        cache,
        TemplateLibrary::builtin(),
        GenerationSettings::default(),
    ))
}

/// 规整并识别题型后构造题目
pub fn question(id: &str, raw_text: &str) -> Question {
    let normalized = TextNormalizer::new().normalize(raw_text, true);
    let question_type = QuestionClassifier::new().classify(&normalized);
    Question::new(id, raw_text, normalized, question_type, 0)
}

pub const MCQ_TEXT: &str =
    "Which gas do plants absorb from the air? A) Oxygen B) Carbon dioxide C) Nitrogen D) Helium";
pub const PHOTOSYNTHESIS_TEXT: &str = "Describe the process of photosynthesis.";
