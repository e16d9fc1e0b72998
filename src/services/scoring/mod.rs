//! 评分引擎 - 业务能力层
//!
//! 纯计算、无 I/O，可在任意线程并发调用。
//!
//! - 选择题：比较选项字母，无部分分
//! - 开放题：从标准答案抽取关键短语，与学生答案做精确/模糊匹配，按覆盖率给分
//! - 标准答案是兜底文案时给出 50% 的默认分并标记为降级

pub mod feedback;
pub mod matching;
pub mod phrases;
pub mod vocabulary;

use tracing::{debug, warn};

use crate::error::ScoringError;
use crate::models::{EvaluationResult, PerformanceLabel, QuestionType};
use crate::services::classifier::{is_option_letter, QuestionClassifier};
use crate::services::templates::is_default_answer;

use matching::{match_phrase, StudentText};
use phrases::extract_key_phrases;

/// 降级评分比例
const DEGRADED_SCORE_RATIO: f64 = 0.5;

/// 评分引擎
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine {
    classifier: QuestionClassifier,
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 评分
    ///
    /// # 参数
    /// - `question_text`: 题干，用于判断题型和生成评语
    /// - `total_marks`: 满分；`None` 时选择题为 1，开放题为关键短语数
    /// - `model_answer`: 标准答案
    /// - `student_answer`: 学生答案
    ///
    /// # 返回
    /// 只有标准答案或学生答案为空时返回错误
    pub fn score(
        &self,
        question_text: &str,
        total_marks: Option<u32>,
        model_answer: &str,
        student_answer: &str,
    ) -> Result<EvaluationResult, ScoringError> {
        if model_answer.trim().is_empty() {
            return Err(ScoringError::InputInvalid { field: "model_answer" });
        }
        if student_answer.trim().is_empty() {
            return Err(ScoringError::InputInvalid { field: "student_answer" });
        }

        if is_default_answer(model_answer) {
            return Ok(self.score_degraded(total_marks));
        }

        // 标准答案本身就是单个字母时强制按选择题评分
        let question_type = if is_option_letter(model_answer) {
            QuestionType::Mcq
        } else {
            self.classifier.classify(question_text)
        };

        match question_type {
            QuestionType::Mcq => match leading_option_letter(model_answer) {
                Some(model_letter) => Ok(self.score_mcq(model_letter, total_marks, student_answer)),
                None => {
                    debug!("标准答案中没有选项字母，按开放题评分");
                    Ok(self.score_open_ended(question_text, total_marks, model_answer, student_answer))
                }
            },
            QuestionType::OpenEnded => {
                Ok(self.score_open_ended(question_text, total_marks, model_answer, student_answer))
            }
        }
    }

    fn score_mcq(&self, model_letter: char, total_marks: Option<u32>, student_answer: &str) -> EvaluationResult {
        let total = total_marks.unwrap_or(1);
        let student_letter = student_option_letter(student_answer);
        let is_correct = student_letter == Some(model_letter);
        let marks = if is_correct { total } else { 0 };
        let key_point = format!("Correct option ({})", model_letter);

        let (reason, feedback) = match (is_correct, student_letter) {
            (true, _) => (
                format!("Correct answer selected: option {}. {}/{} marks awarded.", model_letter, marks, total),
                vec!["Correct option selected.".to_string()],
            ),
            (false, Some(chosen)) => (
                format!(
                    "Incorrect answer: option {} was selected but the correct answer is option {}. {}/{} marks awarded.",
                    chosen, model_letter, marks, total
                ),
                vec![format!("The correct answer was option {}; review this topic.", model_letter)],
            ),
            (false, None) => (
                format!(
                    "No option letter could be read from the answer; the correct answer is option {}. {}/{} marks awarded.",
                    model_letter, marks, total
                ),
                vec!["Write a single option letter (A, B, C or D) clearly.".to_string()],
            ),
        };

        EvaluationResult {
            marks_awarded: marks,
            total_marks: total,
            key_points_covered: if is_correct { vec![key_point.clone()] } else { vec![] },
            key_points_missing: if is_correct { vec![] } else { vec![key_point] },
            matched_keywords: if is_correct { vec![model_letter.to_string()] } else { vec![] },
            is_correct: Some(is_correct),
            performance_label: if is_correct { PerformanceLabel::Excellent } else { PerformanceLabel::Poor },
            evaluation_reason: reason,
            feedback,
            coverage: if is_correct { 1.0 } else { 0.0 },
            degraded: false,
        }
    }

    fn score_open_ended(
        &self,
        question_text: &str,
        total_marks: Option<u32>,
        model_answer: &str,
        student_answer: &str,
    ) -> EvaluationResult {
        let phrases = extract_key_phrases(model_answer);
        let total = total_marks.unwrap_or_else(|| phrases.len().max(1) as u32);

        if phrases.is_empty() {
            return EvaluationResult {
                marks_awarded: 0,
                total_marks: total,
                key_points_covered: vec![],
                key_points_missing: vec![],
                matched_keywords: vec![],
                is_correct: None,
                performance_label: PerformanceLabel::Poor,
                evaluation_reason: feedback::no_key_points_reason(total),
                feedback: vec!["The model answer has no gradable key points; ask a teacher to review.".to_string()],
                coverage: 0.0,
                degraded: false,
            };
        }

        let student = StudentText::new(student_answer);
        let matches: Vec<_> = phrases.iter().map(|p| match_phrase(p, &student)).collect();

        for m in &matches {
            debug!(phrase = %m.phrase, kind = ?m.kind, score = m.score, "关键短语匹配");
        }
        let covered_count = matches.iter().filter(|m| m.is_covered()).count();
        let coverage = covered_count as f64 / matches.len() as f64;
        let marks = (total as f64 * coverage).round() as u32;
        let label = PerformanceLabel::from_coverage(coverage);

        let covered: Vec<String> = matches.iter().filter(|m| m.is_covered()).map(|m| m.phrase.clone()).collect();
        let missing: Vec<String> = matches.iter().filter(|m| !m.is_covered()).map(|m| m.phrase.clone()).collect();
        let mut matched_keywords: Vec<String> = Vec::new();
        for word in matches.iter().flat_map(|m| m.matched_words.iter()) {
            if !matched_keywords.contains(word) {
                matched_keywords.push(word.clone());
            }
        }

        debug!(
            phrases = matches.len(),
            covered = covered.len(),
            coverage,
            marks,
            "开放题评分完成"
        );

        EvaluationResult {
            marks_awarded: marks,
            total_marks: total,
            evaluation_reason: feedback::open_ended_reason(label, coverage, &covered, &missing, marks, total),
            feedback: feedback::open_ended_feedback(label, &missing, question_text),
            key_points_covered: covered,
            key_points_missing: missing,
            matched_keywords,
            is_correct: None,
            performance_label: label,
            coverage,
            degraded: false,
        }
    }

    fn score_degraded(&self, total_marks: Option<u32>) -> EvaluationResult {
        let total = total_marks.unwrap_or(1);
        let marks = (total as f64 * DEGRADED_SCORE_RATIO).round() as u32;
        warn!("⚠️ 标准答案不可用，使用 50% 默认评分: {}/{}", marks, total);

        EvaluationResult {
            marks_awarded: marks,
            total_marks: total,
            key_points_covered: vec![],
            key_points_missing: vec![],
            matched_keywords: vec![],
            is_correct: None,
            performance_label: PerformanceLabel::Average,
            evaluation_reason: format!(
                "The model answer was unavailable, so a default 50% score was applied. {}/{} marks awarded.",
                marks, total
            ),
            feedback: vec!["This answer needs manual review.".to_string()],
            coverage: DEGRADED_SCORE_RATIO,
            degraded: true,
        }
    }
}

/// 标准答案的选项字母：单个字母，或字母后紧跟 `)` `.` `]`（`C) Paris`、`(B)`、`[D]`）
///
/// `A cell wall is rigid` 这类以冠词开头的句子不算
fn leading_option_letter(answer: &str) -> Option<char> {
    let upper = answer.trim().to_uppercase();
    let trimmed = upper.trim_start_matches(['(', '[']);
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    let is_label = ('A'..='D').contains(&first) && matches!(chars.next(), None | Some(')' | '.' | ']'));
    is_label.then_some(first)
}

/// 学生答案的选项字母：多于一个字符时取开头的 A-D
fn student_option_letter(answer: &str) -> Option<char> {
    let upper = answer.trim().to_uppercase();
    upper.chars().next().filter(|c| ('A'..='D').contains(c))
}
