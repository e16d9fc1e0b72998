//! 评语与评分理由模板

use crate::models::PerformanceLabel;

/// 最多输出的评语条数
pub const MAX_FEEDBACK_LINES: usize = 3;

/// 理由中最多列出的短语数
const MAX_NAMED_PHRASES: usize = 3;

/// `a` / `a and b` / `a, b and c`
pub fn join_with_and(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}

fn band_sentence(label: PerformanceLabel, coverage: f64) -> String {
    let percent = (coverage * 100.0).round() as u32;
    match label {
        PerformanceLabel::Excellent => format!("Excellent answer covering {}% of the key points.", percent),
        PerformanceLabel::Good => format!("Good answer covering {}% of the key points.", percent),
        PerformanceLabel::Average => format!("Average answer covering {}% of the key points.", percent),
        PerformanceLabel::Poor => format!("Poor answer covering only {}% of the key points.", percent),
    }
}

/// 开放题评分理由
pub fn open_ended_reason(
    label: PerformanceLabel,
    coverage: f64,
    covered: &[String],
    missing: &[String],
    marks: u32,
    total: u32,
) -> String {
    let mut parts = vec![band_sentence(label, coverage)];
    if !covered.is_empty() {
        let named: Vec<String> = covered.iter().take(MAX_NAMED_PHRASES).cloned().collect();
        parts.push(format!("Covered: {}.", join_with_and(&named)));
    }
    if !missing.is_empty() {
        let named: Vec<String> = missing.iter().take(MAX_NAMED_PHRASES).cloned().collect();
        parts.push(format!("Missing: {}.", join_with_and(&named)));
    }
    parts.push(format!("{}/{} marks awarded.", marks, total));
    parts.join(" ")
}

/// 标准答案中抽不出任何关键短语时的理由
pub fn no_key_points_reason(total: u32) -> String {
    format!(
        "No key points could be extracted from the model answer, so coverage is 0. 0/{} marks awarded.",
        total
    )
}

/// 开放题评语：等级一句，缺失要点一句，再按题干动词补充
pub fn open_ended_feedback(label: PerformanceLabel, missing: &[String], question_text: &str) -> Vec<String> {
    let mut lines = vec![match label {
        PerformanceLabel::Excellent => "Excellent coverage of the key concepts.",
        PerformanceLabel::Good => "Good answer; review the missing points to make it complete.",
        PerformanceLabel::Average => "Covers some key points, but several important concepts are missing.",
        PerformanceLabel::Poor => "Most key concepts are missing; revisit this topic.",
    }
    .to_string()];

    if !missing.is_empty() {
        let named: Vec<String> = missing.iter().take(MAX_NAMED_PHRASES).cloned().collect();
        lines.push(format!("Consider including: {}.", join_with_and(&named)));
    }

    if label != PerformanceLabel::Excellent {
        lines.extend(verb_prompts(question_text));
    }

    lines.truncate(MAX_FEEDBACK_LINES);
    lines
}

fn verb_prompts(question_text: &str) -> Vec<String> {
    let words: Vec<String> = question_text
        .to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    let mut prompts = Vec::new();
    if has_any(&words, &["explain", "describe", "discuss", "elaborate"]) {
        prompts.push("Add more detail and explanation to fully address the question.".to_string());
    }
    if has_any(&words, &["compare", "contrast", "distinguish", "differentiate"]) {
        prompts.push("Include a clear comparison of the similarities and differences.".to_string());
    }
    if has_any(&words, &["define"]) {
        prompts.push("Start with a precise definition of the key term.".to_string());
    }
    if has_any(&words, &["list", "name", "identify", "state"]) {
        prompts.push("Make sure every required item is named.".to_string());
    }
    prompts
}

fn has_any(words: &[String], verbs: &[&str]) -> bool {
    words.iter().any(|w| verbs.contains(&w.as_str()))
}
