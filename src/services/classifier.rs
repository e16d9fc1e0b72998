//! 题型识别 - 业务能力层
//!
//! 纯函数：根据题干文本判断选择题还是开放题，永不失败。

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::models::QuestionType;
use crate::utils::patterns;

/// 选项标记：`A)` `A.` `(A)` `[A]` `Option A` `Choice A`
static OPTION_MARKER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    patterns::compile(
        r"(?i)\(([a-d])\)|\[([a-d])\]|\b(?:option|choice)\s+([a-d])\b|\b([a-d])[.)]",
    )
});

/// 选择题提示语
static MCQ_PHRASE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    patterns::compile(
        r"(?i)\bmultiple[\s-]+choice\b|\b(?:choose|select|pick)\s+the\s+(?:correct|best|right)\b",
    )
});

/// 识别依据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evidence {
    /// 出现了连续的选项标记
    OptionMarkers,
    /// 出现了选择题提示语
    Phrase,
    /// 没有任何依据，按开放题处理
    None,
}

/// 题型识别器
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionClassifier;

impl QuestionClassifier {
    pub fn new() -> Self {
        Self
    }

    /// 判断题型
    pub fn classify(&self, text: &str) -> QuestionType {
        match self.evidence(text) {
            Evidence::None => QuestionType::OpenEnded,
            _ => QuestionType::Mcq,
        }
    }

    /// 返回识别依据，任一规则命中即视为选择题
    pub fn evidence(&self, text: &str) -> Evidence {
        if text.trim().is_empty() {
            return Evidence::None;
        }
        if has_consecutive_options(text) {
            return Evidence::OptionMarkers;
        }
        if patterns::is_match(&MCQ_PHRASE, text) {
            return Evidence::Phrase;
        }
        debug!("未识别到选择题特征，按开放题处理");
        Evidence::None
    }
}

/// 答案本身是否为单个选项字母
pub fn is_option_letter(answer: &str) -> bool {
    let trimmed = answer.trim();
    let mut chars = trimmed.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('A'..='D' | 'a'..='d'), None)
    )
}

/// 是否存在相邻两个标签按顺序出现（A 在 B 前、B 在 C 前或 C 在 D 前）
fn has_consecutive_options(text: &str) -> bool {
    let Some(re) = (*OPTION_MARKER).as_ref() else {
        return false;
    };

    // 每个标签第一次出现的位置
    let mut first_seen: [Option<usize>; 4] = [None; 4];
    for caps in re.captures_iter(text) {
        let Some(m) = (1..=4).find_map(|i| caps.get(i)) else {
            continue;
        };
        let Some(label) = m.as_str().chars().next() else {
            continue;
        };
        let idx = (label.to_ascii_uppercase() as u8 - b'A') as usize;
        if first_seen[idx].is_none() {
            first_seen[idx] = Some(m.start());
        }
    }

    first_seen.windows(2).any(|pair| match (pair[0], pair[1]) {
        (Some(a), Some(b)) => a < b,
        _ => false,
    })
}
