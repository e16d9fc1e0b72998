use std::time::Duration;

use crate::error::ConfigError;

/// 已知的生成服务名称（按默认优先级排列）
pub const KNOWN_PROVIDERS: [&str; 6] = ["groq", "together", "openai", "gemini", "huggingface", "local"];

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 试卷 TOML 文件存放目录
    pub exam_folder: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 同时评分的题目数量
    pub max_concurrent_evaluations: usize,
    /// 生成服务的回退顺序
    pub provider_order: Vec<String>,
    // --- Groq ---
    pub groq_api_key: String,
    pub groq_api_base_url: String,
    pub groq_model: String,
    // --- Together ---
    pub together_api_key: String,
    pub together_api_base_url: String,
    pub together_model: String,
    // --- OpenAI ---
    pub openai_api_key: String,
    pub openai_api_base_url: String,
    pub openai_model: String,
    // --- Gemini ---
    pub gemini_api_key: String,
    pub gemini_api_base_url: String,
    pub gemini_model: String,
    // --- HuggingFace ---
    pub huggingface_api_key: String,
    pub huggingface_api_base_url: String,
    pub huggingface_model: String,
    // --- 本地 vLLM ---
    pub local_llm_enabled: bool,
    pub local_llm_base_url: String,
    pub local_llm_model: String,
    // --- OCR ---
    pub ocr_api_key: String,
    pub ocr_api_url: String,
    // --- 超时与重试 ---
    pub generation_timeout_secs: u64,
    pub availability_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    // --- 批量节流 ---
    pub batch_size: usize,
    pub question_delay_ms: u64,
    pub batch_delay_ms: u64,
    // --- 缓存 ---
    pub cache_ttl_secs: u64,
    /// 0 表示不限容量
    pub cache_capacity: usize,
    /// 开放题生成的最大 token 数
    pub open_ended_max_tokens: u32,
    /// 额外模板文件
    pub template_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exam_folder: "exams".to_string(),
            output_log_file: "evaluation_log.txt".to_string(),
            verbose_logging: false,
            max_concurrent_evaluations: 4,
            provider_order: ["groq", "together", "gemini", "huggingface", "local"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            groq_api_key: String::new(),
            groq_api_base_url: "https://api.groq.com/openai/v1".to_string(),
            groq_model: "llama3-70b-8192".to_string(),
            together_api_key: String::new(),
            together_api_base_url: "https://api.together.xyz/v1".to_string(),
            together_model: "Qwen/Qwen3-235B-A22B-fp8-tput".to_string(),
            openai_api_key: String::new(),
            openai_api_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            gemini_api_key: String::new(),
            gemini_api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            gemini_model: "gemini-1.5-flash".to_string(),
            huggingface_api_key: String::new(),
            huggingface_api_base_url: "https://api-inference.huggingface.co/models".to_string(),
            huggingface_model: "mistralai/Mistral-7B-Instruct-v0.2".to_string(),
            local_llm_enabled: false,
            local_llm_base_url: "http://localhost:8000/v1".to_string(),
            local_llm_model: "meta-llama/Llama-3.1-8B-Instruct".to_string(),
            ocr_api_key: String::new(),
            ocr_api_url: "https://api.ocr.space/parse/image".to_string(),
            generation_timeout_secs: 30,
            availability_timeout_secs: 5,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            batch_size: 2,
            question_delay_ms: 2000,
            batch_delay_ms: 5000,
            cache_ttl_secs: 24 * 60 * 60,
            cache_capacity: 512,
            open_ended_max_tokens: 150,
            template_file: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            exam_folder: std::env::var("EXAM_FOLDER").unwrap_or(default.exam_folder),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            max_concurrent_evaluations: std::env::var("MAX_CONCURRENT_EVALUATIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_evaluations),
            provider_order: std::env::var("PROVIDER_ORDER").ok().map(|v| parse_list(&v)).unwrap_or(default.provider_order),
            groq_api_key: std::env::var("GROQ_API_KEY").unwrap_or(default.groq_api_key),
            groq_api_base_url: std::env::var("GROQ_API_BASE_URL").unwrap_or(default.groq_api_base_url),
            groq_model: std::env::var("GROQ_MODEL").unwrap_or(default.groq_model),
            together_api_key: std::env::var("TOGETHER_API_KEY").unwrap_or(default.together_api_key),
            together_api_base_url: std::env::var("TOGETHER_API_BASE_URL").unwrap_or(default.together_api_base_url),
            together_model: std::env::var("TOGETHER_MODEL").unwrap_or(default.together_model),
            openai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or(default.openai_api_key),
            openai_api_base_url: std::env::var("OPENAI_API_BASE_URL").unwrap_or(default.openai_api_base_url),
            openai_model: std::env::var("OPENAI_MODEL").unwrap_or(default.openai_model),
            gemini_api_key: std::env::var("GEMINI_API_KEY").unwrap_or(default.gemini_api_key),
            gemini_api_base_url: std::env::var("GEMINI_API_BASE_URL").unwrap_or(default.gemini_api_base_url),
            gemini_model: std::env::var("GEMINI_MODEL").unwrap_or(default.gemini_model),
            huggingface_api_key: std::env::var("HUGGINGFACE_API_KEY").unwrap_or(default.huggingface_api_key),
            huggingface_api_base_url: std::env::var("HUGGINGFACE_API_BASE_URL").unwrap_or(default.huggingface_api_base_url),
            huggingface_model: std::env::var("HUGGINGFACE_MODEL").unwrap_or(default.huggingface_model),
            local_llm_enabled: std::env::var("LOCAL_LLM_ENABLED").ok().and_then(|v| v.parse().ok()).unwrap_or(default.local_llm_enabled),
            local_llm_base_url: std::env::var("LOCAL_LLM_BASE_URL").unwrap_or(default.local_llm_base_url),
            local_llm_model: std::env::var("LOCAL_LLM_MODEL").unwrap_or(default.local_llm_model),
            ocr_api_key: std::env::var("OCR_API_KEY").unwrap_or(default.ocr_api_key),
            ocr_api_url: std::env::var("OCR_API_URL").unwrap_or(default.ocr_api_url),
            generation_timeout_secs: std::env::var("GENERATION_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.generation_timeout_secs),
            availability_timeout_secs: std::env::var("AVAILABILITY_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.availability_timeout_secs),
            max_retries: std::env::var("MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_retries),
            retry_base_delay_ms: std::env::var("RETRY_BASE_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_base_delay_ms),
            batch_size: std::env::var("BATCH_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.batch_size),
            question_delay_ms: std::env::var("QUESTION_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.question_delay_ms),
            batch_delay_ms: std::env::var("BATCH_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.batch_delay_ms),
            cache_ttl_secs: std::env::var("CACHE_TTL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.cache_ttl_secs),
            cache_capacity: std::env::var("CACHE_CAPACITY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.cache_capacity),
            open_ended_max_tokens: std::env::var("OPEN_ENDED_MAX_TOKENS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.open_ended_max_tokens).clamp(150, 800),
            template_file: std::env::var("TEMPLATE_FILE").ok().filter(|v| !v.trim().is_empty()),
        }
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(invalid("BATCH_SIZE", "必须大于 0"));
        }
        if self.max_concurrent_evaluations == 0 {
            return Err(invalid("MAX_CONCURRENT_EVALUATIONS", "必须大于 0"));
        }
        if self.generation_timeout_secs == 0 || self.availability_timeout_secs == 0 {
            return Err(invalid("GENERATION_TIMEOUT_SECS/AVAILABILITY_TIMEOUT_SECS", "超时必须大于 0"));
        }
        if self.provider_order.is_empty() {
            return Err(invalid("PROVIDER_ORDER", "至少需要一个生成服务"));
        }
        if let Some(unknown) = self
            .provider_order
            .iter()
            .find(|name| !KNOWN_PROVIDERS.contains(&name.as_str()))
        {
            return Err(ConfigError::UnknownProvider(unknown.clone()));
        }
        Ok(())
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn availability_timeout(&self) -> Duration {
        Duration::from_secs(self.availability_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// 缓存容量上限，0 视为不限
    pub fn cache_capacity(&self) -> Option<usize> {
        (self.cache_capacity > 0).then_some(self.cache_capacity)
    }
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        reason: reason.to_string(),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
