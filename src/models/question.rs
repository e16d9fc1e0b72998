use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// 选择题，答案是单个选项字母
    Mcq,
    /// 开放题
    OpenEnded,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Mcq => write!(f, "选择题"),
            QuestionType::OpenEnded => write!(f, "开放题"),
        }
    }
}

/// 题目
///
/// 分类完成后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub raw_text: String,
    pub normalized_text: String,
    pub question_type: QuestionType,
    pub total_marks: u32,
}

impl Question {
    pub fn new(
        id: impl Into<String>,
        raw_text: impl Into<String>,
        normalized_text: impl Into<String>,
        question_type: QuestionType,
        total_marks: u32,
    ) -> Self {
        Self {
            id: id.into(),
            raw_text: raw_text.into(),
            normalized_text: normalized_text.into(),
            question_type,
            total_marks,
        }
    }

    /// 缓存键
    pub fn key(&self) -> String {
        question_key(&self.normalized_text)
    }
}

/// 题目文本 → 缓存键（去首尾空白并小写）
pub fn question_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// 标准答案来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "provider", rename_all = "snake_case")]
pub enum AnswerSource {
    /// 命中缓存
    Cache,
    /// 某个生成服务
    Provider(String),
    /// 静态模板
    Template,
    /// 默认兜底文案
    Default,
}

impl fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerSource::Cache => write!(f, "cache"),
            AnswerSource::Provider(name) => write!(f, "{}", name),
            AnswerSource::Template => write!(f, "template"),
            AnswerSource::Default => write!(f, "default"),
        }
    }
}

/// 标准答案
///
/// 重新生成时整体替换，不做修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAnswer {
    pub question_key: String,
    pub text: String,
    pub source: AnswerSource,
    pub generated_at: DateTime<Utc>,
}

impl ModelAnswer {
    pub fn new(question_key: impl Into<String>, text: impl Into<String>, source: AnswerSource) -> Self {
        Self {
            question_key: question_key.into(),
            text: text.into(),
            source,
            generated_at: Utc::now(),
        }
    }

    /// 是否为兜底结果（模板或默认文案）
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, AnswerSource::Template | AnswerSource::Default)
    }
}

/// 生成参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl GenerationOptions {
    /// 选择题：只要一个字母
    pub fn for_mcq() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 5,
            top_p: 0.95,
        }
    }

    /// 开放题：关键词列表
    pub fn for_open_ended(max_tokens: u32) -> Self {
        Self {
            temperature: 0.3,
            max_tokens,
            top_p: 0.95,
        }
    }
}
