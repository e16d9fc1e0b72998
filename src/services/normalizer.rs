//! OCR 文本规整 - 业务能力层
//!
//! 纯函数，按固定顺序修复常见的 OCR 瑕疵：
//! 1. 小写→大写处补空格
//! 2. 合并连续空白
//! 3. 字符混淆修复（`0/o` `1/l/I` `5/S` `8/B`）及常见功能词整词修复
//! 4. 标点前后空格
//! 5. 句子边界分段
//! 6. 试卷：题号与选项标记；答卷：合并多余空行
//!
//! 整条流水线会重复执行直到结果不再变化，保证幂等。

use phf::phf_map;
use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::utils::patterns;

/// 流水线最多重复次数
const MAX_PASSES: usize = 4;

static CAMEL_BOUNDARY: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"([a-z])([A-Z])"));
static WHITESPACE_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"\s{2,}"));
static SPACE_BEFORE_PUNCT: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"[ \t]+([.,;:?!])"));
static PUNCT_BEFORE_LETTER: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"([.,;:?!])([A-Za-z])"));
static SENTENCE_BOUNDARY: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"([a-z]{2,})\s+([A-Z][a-z]+)"));
static QUESTION_MARKER: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"\b[Qq][ \t]*(\d+)[ \t]*[.)]?[ \t]*"));
static QUESTION_NUMBER: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"(\d+)[ \t]*\.([ \t]*)(\D|$)"));
static OPTION_PAREN: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"\b([A-D])[ \t]*\)[ \t]*"));
static OPTION_DASH: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"(^|\s)([A-D])(?:[ \t]+[-–—]|[-–—][ \t])[ \t]*"));
static BLANK_LINES: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"\n(?:[ \t]*\n)+"));
static TRAILING_SPACE: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"[ \t]+\n"));
static MISREAD_WORD: LazyLock<Option<Regex>> = LazyLock::new(|| patterns::compile(r"\b(?:0ne|0f|1n|1s|1t|1f|5o|8e|8y)\b"));

/// 常见功能词的整词修复
static WORD_FIXES: phf::Map<&'static str, &'static str> = phf_map! {
    "0ne" => "One",
    "0f" => "of",
    "1n" => "In",
    "1s" => "is",
    "1t" => "it",
    "1f" => "if",
    "5o" => "So",
    "8e" => "Be",
    "8y" => "By",
};

/// 字符所处的上下文
#[derive(Debug, Clone, Copy)]
pub struct CharContext<'a> {
    pub prev: Option<char>,
    pub next: Option<char>,
    /// 字符所在的整个词
    pub token: &'a [char],
}

/// 字符混淆规则：`pattern` 在 `context` 成立时替换为 `lower`/`upper`（跟随相邻字母的大小写）
#[derive(Clone, Copy)]
pub struct ConfusionRule {
    pub pattern: char,
    pub context: fn(&CharContext<'_>) -> bool,
    pub lower: char,
    pub upper: char,
}

/// 字符混淆规则表，按顺序匹配，第一条命中的规则生效
pub const CONFUSION_RULES: &[ConfusionRule] = &[
    ConfusionRule { pattern: '0', context: inside_word, lower: 'o', upper: 'O' },
    ConfusionRule { pattern: '1', context: inside_word, lower: 'l', upper: 'I' },
    ConfusionRule { pattern: '|', context: inside_word, lower: 'l', upper: 'I' },
    ConfusionRule { pattern: '5', context: inside_word, lower: 's', upper: 'S' },
    ConfusionRule { pattern: '8', context: inside_word, lower: 'b', upper: 'B' },
];

/// 紧挨字母，且所在的词看起来是个单词而不是数字/单位（`1st`、`5kg`、`H2O`）
pub fn inside_word(ctx: &CharContext<'_>) -> bool {
    let adjacent = ctx.prev.is_some_and(char::is_alphabetic) || ctx.next.is_some_and(char::is_alphabetic);
    adjacent && looks_like_word(ctx.token)
}

fn looks_like_word(token: &[char]) -> bool {
    let letters = token.iter().filter(|c| c.is_alphabetic()).count();
    if letters < 2 {
        return false;
    }
    let confusable = |c: &char| CONFUSION_RULES.iter().any(|r| r.pattern == *c);
    if token.iter().any(|c| c.is_ascii_digit() && !confusable(c)) {
        return false;
    }
    // 数字 + 1~2 个字母的后缀，如 1st、8am、5kg
    let digits = token.iter().take_while(|c| c.is_ascii_digit()).count();
    let suffix = &token[digits..];
    !(digits > 0 && (1..=2).contains(&suffix.len()) && suffix.iter().all(|c| c.is_alphabetic()))
}

/// OCR 文本规整器
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// 规整 OCR 文本
    ///
    /// # 参数
    /// - `raw_text`: OCR 原始文本
    /// - `is_question_paper`: 是否为试卷（否则按答卷处理）
    pub fn normalize(&self, raw_text: &str, is_question_paper: bool) -> String {
        if raw_text.is_empty() {
            return raw_text.to_string();
        }

        let mut current = self.pass(raw_text, is_question_paper);
        for _ in 1..MAX_PASSES {
            let next = self.pass(&current, is_question_paper);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    fn pass(&self, text: &str, is_question_paper: bool) -> String {
        // 1. 小写→大写处补空格
        let text = patterns::replace_all(&CAMEL_BOUNDARY, text, "$1 $2");

        // 2. 合并连续空白（含换行的保留为一个换行）
        let text = collapse_whitespace(&text);

        // 3. 字符混淆
        let text = fix_misread_words(&text);
        let text = apply_confusion_rules(&text, CONFUSION_RULES);

        // 4. 标点空格
        let text = patterns::replace_all(&SPACE_BEFORE_PUNCT, &text, "$1");
        let text = patterns::replace_all(&PUNCT_BEFORE_LETTER, &text, "$1 $2");

        // 5. 句子边界分段
        let text = patterns::replace_all(&SENTENCE_BOUNDARY, &text, "$1\n\n$2");

        // 6. 试卷 / 答卷
        let text = if is_question_paper {
            let text = patterns::replace_all(&QUESTION_MARKER, &text, "Q$1. ");
            let text = normalize_question_numbers(&text);
            let text = patterns::replace_all(&OPTION_PAREN, &text, "$1) ");
            patterns::replace_all(&OPTION_DASH, &text, "${1}${2}) ")
        } else {
            patterns::replace_all(&BLANK_LINES, &text, "\n")
        };

        patterns::replace_all(&TRAILING_SPACE, &text, "\n").trim().to_string()
    }
}

fn collapse_whitespace(text: &str) -> String {
    match (*WHITESPACE_RUN).as_ref() {
        Some(re) => re
            .replace_all(text, |caps: &Captures| {
                if caps[0].contains('\n') {
                    "\n"
                } else {
                    " "
                }
            })
            .into_owned(),
        None => text.to_string(),
    }
}

fn fix_misread_words(text: &str) -> String {
    match (*MISREAD_WORD).as_ref() {
        Some(re) => re
            .replace_all(text, |caps: &Captures| {
                WORD_FIXES.get(&caps[0]).copied().unwrap_or(&caps[0]).to_string()
            })
            .into_owned(),
        None => text.to_string(),
    }
}

/// `12 .` → `12. `，小数不受影响
fn normalize_question_numbers(text: &str) -> String {
    match (*QUESTION_NUMBER).as_ref() {
        Some(re) => re
            .replace_all(text, |caps: &Captures| {
                let number = &caps[1];
                let next = caps.get(3).map_or("", |m| m.as_str());
                if next.is_empty() {
                    format!("{}.", number)
                } else if next.chars().all(char::is_whitespace) {
                    format!("{}.{}", number, next)
                } else {
                    format!("{}. {}", number, next)
                }
            })
            .into_owned(),
        None => text.to_string(),
    }
}

/// 单次遍历应用字符混淆规则
pub fn apply_confusion_rules(text: &str, rules: &[ConfusionRule]) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    let is_token_char = |c: char| c.is_alphanumeric() || c == '|';

    let mut start = 0;
    while start < chars.len() {
        if !is_token_char(chars[start]) {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < chars.len() && is_token_char(chars[end]) {
            end += 1;
        }

        let token: Vec<char> = chars[start..end].to_vec();
        for i in start..end {
            let Some(rule) = rules.iter().find(|r| r.pattern == chars[i]) else {
                continue;
            };
            let ctx = CharContext {
                prev: (i > start).then(|| chars[i - 1]),
                next: (i + 1 < end).then(|| chars[i + 1]),
                token: &token,
            };
            if (rule.context)(&ctx) {
                chars[i] = if prefers_upper(&ctx) { rule.upper } else { rule.lower };
            }
        }
        start = end;
    }

    chars.into_iter().collect()
}

/// 相邻字母全是大写时用大写
fn prefers_upper(ctx: &CharContext<'_>) -> bool {
    let neighbours: Vec<char> = [ctx.prev, ctx.next]
        .into_iter()
        .flatten()
        .filter(|c| c.is_alphabetic())
        .collect();
    !neighbours.is_empty() && neighbours.iter().all(|c| c.is_uppercase())
}
