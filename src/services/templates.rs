//! 模板答案 - 业务能力层
//!
//! 所有生成服务都失败后的兜底：按关键词子串匹配题干，返回预置答案；
//! 都不匹配时返回按题型区分的默认文案。

use serde::Deserialize;
use std::path::Path;

use crate::error::{AppError, AppResult};
use crate::models::QuestionType;

/// 选择题默认文案
pub const MCQ_DEFAULT_ANSWER: &str =
    "Unable to determine the correct answer due to API rate limits. Please try again later.";

/// 开放题默认文案
pub const OPEN_ENDED_DEFAULT_ANSWER: &str =
    "Unable to generate an answer at this time due to API rate limits. Please try again later.";

/// 内置模板：(关键词, 答案)，适用于开放题
const BUILTIN_OPEN_ENDED: &[(&str, &str)] = &[
    ("photosynthesis", "chlorophyll, sunlight, carbon dioxide, water, glucose, oxygen, light-dependent reactions, calvin cycle"),
    ("respiration", "glucose, oxygen, carbon dioxide, water, energy, ATP, mitochondria"),
    ("osmosis", "water molecules, semi-permeable membrane, concentration gradient, high to low water potential, diffusion"),
    ("mitosis", "cell division, two identical daughter cells, prophase, metaphase, anaphase, telophase, chromosomes"),
    ("water cycle", "evaporation, condensation, precipitation, collection, transpiration, sun energy"),
    ("newton's first law", "inertia, object at rest stays at rest, uniform motion, unbalanced force"),
    ("newton's second law", "force equals mass times acceleration, F = ma, acceleration proportional to force"),
    ("gravity", "attractive force, mass, distance, inverse square law, weight, acceleration 9.8 m/s2"),
    ("democracy", "government by the people, free elections, rule of law, citizen rights, majority rule, accountability"),
    ("climate change", "greenhouse gases, global warming, carbon dioxide, fossil fuels, rising sea levels, extreme weather"),
    ("algorithm", "finite sequence of steps, input, output, definiteness, effectiveness, termination"),
];

/// 一条模板
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemplateEntry {
    /// 小写关键词
    pub keyword: String,
    pub answer: String,
    /// 适用题型
    #[serde(default = "default_template_type")]
    pub question_type: QuestionType,
}

fn default_template_type() -> QuestionType {
    QuestionType::OpenEnded
}

#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    templates: Vec<TemplateEntry>,
}

/// 模板库，按插入顺序匹配
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    entries: Vec<TemplateEntry>,
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateLibrary {
    /// 内置模板
    pub fn builtin() -> Self {
        let entries = BUILTIN_OPEN_ENDED
            .iter()
            .map(|(keyword, answer)| TemplateEntry {
                keyword: keyword.to_string(),
                answer: answer.to_string(),
                question_type: QuestionType::OpenEnded,
            })
            .collect();
        Self { entries }
    }

    /// 空模板库
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// 从 TOML 文本追加模板（追加的条目优先匹配）
    ///
    /// ```toml
    /// [[templates]]
    /// keyword = "ohm's law"
    /// answer = "voltage, current, resistance, V = IR"
    /// ```
    pub fn extend_from_toml(&mut self, content: &str) -> AppResult<usize> {
        let file: TemplateFile = toml::from_str(content)?;
        let count = file.templates.len();
        let mut added: Vec<TemplateEntry> = file
            .templates
            .into_iter()
            .map(|mut entry| {
                entry.keyword = entry.keyword.trim().to_lowercase();
                entry
            })
            .filter(|entry| !entry.keyword.is_empty())
            .collect();
        added.append(&mut self.entries);
        self.entries = added;
        Ok(count)
    }

    /// 从文件追加模板
    pub fn extend_from_file(&mut self, path: &Path) -> AppResult<usize> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        self.extend_from_toml(&content)
    }

    /// 查找模板答案
    pub fn lookup(&self, normalized_question: &str, question_type: QuestionType) -> Option<&str> {
        let haystack = normalized_question.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| entry.question_type == question_type)
            .find(|entry| haystack.contains(&entry.keyword))
            .map(|entry| entry.answer.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 按题型返回默认文案
pub fn default_answer(question_type: QuestionType) -> &'static str {
    match question_type {
        QuestionType::Mcq => MCQ_DEFAULT_ANSWER,
        QuestionType::OpenEnded => OPEN_ENDED_DEFAULT_ANSWER,
    }
}

/// 是否为默认文案
pub fn is_default_answer(text: &str) -> bool {
    let text = text.trim();
    text == MCQ_DEFAULT_ANSWER || text == OPEN_ENDED_DEFAULT_ANSWER
}
