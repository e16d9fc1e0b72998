//! 提示词构建与答案整理

use regex::Regex;
use std::sync::LazyLock;

use crate::models::QuestionType;
use crate::utils::patterns;

/// 选择题系统提示词
pub const MCQ_SYSTEM_PROMPT: &str = "You are an expert exam assistant. For the following multiple-choice question, \
carefully analyze the question and all options. Respond with ONLY the single uppercase letter (A, B, C or D) of the \
correct option, with no explanation, workings or additional text.";

/// 开放题系统提示词
pub const OPEN_ENDED_SYSTEM_PROMPT: &str = "You are an expert exam assistant. For the following question, respond \
with ONLY a comma-separated list of the essential keywords and concepts a correct answer must contain. Do not write \
sentences, explanations or numbering.";

/// 选项标记：`A)` `A.` `(A)`，前面是行首或空白
static OPTION_LABEL: LazyLock<Option<Regex>> =
    LazyLock::new(|| patterns::compile(r"(?:^|\s)(?:\(([A-Da-d])\)|([A-Da-d])[).])\s+"));
static ANSWER_IS: LazyLock<Option<Regex>> =
    LazyLock::new(|| patterns::compile(r"(?i)\b(?:answer|option)\s*(?:is\s*)?[:\-]?\s*\(?([a-d])\b"));
static STANDALONE_LETTER: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"\b([A-D])\b"));
static ANSWER_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| patterns::compile(r"(?i)^\s*(?:answer|keywords?)\s*:\s*"));
static LIST_BULLET: LazyLock<Option<Regex>> =
    LazyLock::new(|| patterns::compile(r"(?m)^[ \t]*(?:[-*•]|\d+[.)])[ \t]+"));
static PARENTHESISED: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"\s*\([^)]*\)"));
static SENTENCE_BREAK: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"[.;\n]+"));
static SPACES: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"\s+"));

/// 按题型选择系统提示词
pub fn system_prompt(question_type: QuestionType) -> &'static str {
    match question_type {
        QuestionType::Mcq => MCQ_SYSTEM_PROMPT,
        QuestionType::OpenEnded => OPEN_ENDED_SYSTEM_PROMPT,
    }
}

/// 构建用户提示词
///
/// 选择题把选项拆成每行一个，放在 `Options:` 下面
pub fn build_prompt(question_text: &str, question_type: QuestionType) -> String {
    let text = question_text.trim();
    if question_type != QuestionType::Mcq {
        return text.to_string();
    }
    let Some(re) = (*OPTION_LABEL).as_ref() else {
        return text.to_string();
    };

    let labels: Vec<(usize, usize, char)> = re
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let letter = caps.get(1).or_else(|| caps.get(2))?.as_str().chars().next()?;
            Some((whole.start(), whole.end(), letter.to_ascii_uppercase()))
        })
        .collect();
    if labels.len() < 2 {
        return text.to_string();
    }

    let stem = text[..labels[0].0].trim();
    let mut lines = vec![stem.to_string(), String::new(), "Options:".to_string()];
    for (i, &(_, end, letter)) in labels.iter().enumerate() {
        let next_start = labels.get(i + 1).map_or(text.len(), |next| next.0);
        lines.push(format!("{}) {}", letter, text[end..next_start].trim()));
    }
    lines.join("\n")
}

/// 整理模型回复
///
/// - 选择题：取第一个独立的选项字母；找不到返回 `None`
/// - 开放题：去掉 `Answer:` 前缀、列表符号和括号注释，没有逗号时把句子边界换成逗号
pub fn refine_answer(text: &str, question_type: QuestionType) -> Option<String> {
    match question_type {
        QuestionType::Mcq => refine_mcq(text),
        QuestionType::OpenEnded => refine_open_ended(text),
    }
}

fn refine_mcq(text: &str) -> Option<String> {
    let trimmed = text.trim().trim_end_matches(['.', ')']).trim_start_matches('(');
    let mut chars = trimmed.chars();
    if let (Some(c @ ('A'..='D' | 'a'..='d')), None) = (chars.next(), chars.next()) {
        return Some(c.to_ascii_uppercase().to_string());
    }

    [&*ANSWER_IS, &*STANDALONE_LETTER].into_iter().find_map(|re: &Option<Regex>| {
        re.as_ref()?
            .captures(text)?
            .get(1)
            .map(|m| m.as_str().to_ascii_uppercase())
    })
}

fn refine_open_ended(text: &str) -> Option<String> {
    let text = patterns::replace_all(&ANSWER_PREFIX, text.trim(), "");
    let text = patterns::replace_all(&LIST_BULLET, &text, "");
    let text = patterns::replace_all(&PARENTHESISED, &text, "");
    let text = if text.contains(',') {
        text
    } else {
        patterns::replace_all(&SENTENCE_BREAK, text.trim(), ", ")
    };
    let text = patterns::replace_all(&SPACES, &text, " ");
    let text = text.trim().trim_matches([',', '.', ' ']).to_string();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mcq_prompt_lays_out_options() {
        let prompt = build_prompt(
            "Which gas do plants absorb? A) Oxygen B) Carbon dioxide (C) Nitrogen d. Helium",
            QuestionType::Mcq,
        );
        assert_eq!(
            prompt,
            "Which gas do plants absorb?\n\nOptions:\nA) Oxygen\nB) Carbon dioxide\nC) Nitrogen\nD) Helium"
        );
    }

    #[test]
    fn test_prompt_without_options_is_unchanged() {
        assert_eq!(build_prompt("  Choose the best answer. ", QuestionType::Mcq), "Choose the best answer.");
        assert_eq!(build_prompt("Explain A) and B)", QuestionType::OpenEnded), "Explain A) and B)");
    }

    #[test]
    fn test_refine_mcq() {
        assert_eq!(refine_answer("c", QuestionType::Mcq).as_deref(), Some("C"));
        assert_eq!(refine_answer("(B).", QuestionType::Mcq).as_deref(), Some("B"));
        assert_eq!(refine_answer("The answer is d because", QuestionType::Mcq).as_deref(), Some("D"));
        assert_eq!(refine_answer("Option C is right", QuestionType::Mcq).as_deref(), Some("C"));
        assert_eq!(refine_answer("I am not sure", QuestionType::Mcq), None);
    }

    #[test]
    fn test_refine_open_ended() {
        assert_eq!(
            refine_answer("Answer: evaporation (heat), condensation.", QuestionType::OpenEnded).as_deref(),
            Some("evaporation, condensation")
        );
        assert_eq!(
            refine_answer("- chlorophyll\n- sunlight\n- glucose", QuestionType::OpenEnded).as_deref(),
            Some("chlorophyll, sunlight, glucose")
        );
        assert_eq!(
            refine_answer("Cells divide. Chromosomes split", QuestionType::OpenEnded).as_deref(),
            Some("Cells divide, Chromosomes split")
        );
        assert_eq!(refine_answer("  (nothing)  ", QuestionType::OpenEnded), None);
    }
}
