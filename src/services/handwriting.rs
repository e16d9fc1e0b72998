//! 书写工整度分析
//!
//! 基于 OCR 文本的启发式打分，1-10 分。

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::utils::patterns;

const BASE_SCORE: i32 = 8;
const MAX_STRAY_SYMBOLS: usize = 5;
/// 句长（字符数）平均绝对偏差的上限
const MAX_SENTENCE_LENGTH_DEVIATION: f64 = 20.0;

static WIDE_GAP: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"\s{3,}"));
static MIXED_CASE_WORD: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"[A-Z][a-z]+[A-Z]"));
static STRAY_SYMBOL: LazyLock<Option<Regex>> =
    LazyLock::new(|| patterns::compile(r#"[^a-zA-Z0-9\s.,;:?!'"()\-]"#));
static SENTENCE_END: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"[.!?]+"));

/// 工整度分析结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandwritingAnalysis {
    pub neatness_score: u8,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HandwritingAnalyzer;

impl HandwritingAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, text: &str) -> HandwritingAnalysis {
        let wide_gap = patterns::is_match(&WIDE_GAP, text);
        let mixed_case = patterns::is_match(&MIXED_CASE_WORD, text);
        let stray = (*STRAY_SYMBOL).as_ref().map_or(0, |re| re.find_iter(text).count());

        let mut score = BASE_SCORE;
        if wide_gap {
            score -= 1;
        }
        if mixed_case {
            score -= 1;
        }
        if stray > MAX_STRAY_SYMBOLS {
            score -= 2;
        } else if stray > 0 {
            score -= 1;
        }
        if sentence_length_deviation(text) > MAX_SENTENCE_LENGTH_DEVIATION {
            score -= 1;
        }

        let neatness_score = score.clamp(1, 10) as u8;

        let mut reasons = vec![summary_for(neatness_score)];
        if wide_gap {
            reasons.push("Inconsistent spacing detected.");
        }
        if mixed_case {
            reasons.push("Irregular capitalization observed.");
        }
        if stray > 0 {
            reasons.push("Some unusual symbols or corrections present.");
        }

        HandwritingAnalysis {
            neatness_score,
            reason: reasons.join(" "),
        }
    }
}

/// 句子字符数的平均绝对偏差
fn sentence_length_deviation(text: &str) -> f64 {
    let lengths: Vec<f64> = match (*SENTENCE_END).as_ref() {
        Some(re) => re.split(text).collect::<Vec<_>>(),
        None => vec![text],
    }
    .into_iter()
    .filter(|s| !s.trim().is_empty())
    .map(|s| s.chars().count() as f64)
    .collect();

    if lengths.is_empty() {
        return 0.0;
    }
    let count = lengths.len() as f64;
    let mean = lengths.iter().sum::<f64>() / count;
    lengths.iter().map(|len| (len - mean).abs()).sum::<f64>() / count
}

fn summary_for(score: u8) -> &'static str {
    match score {
        9.. => "The handwriting appears very neat and consistent.",
        7..=8 => "The handwriting is generally clear and legible.",
        5..=6 => "The handwriting is readable but shows some inconsistencies.",
        _ => "The handwriting shows significant clarity issues.",
    }
}
