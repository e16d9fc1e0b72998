//! 关键短语抽取

use super::vocabulary::{is_important_term, is_stop_word};

/// 停用词占比超过该值的子句直接丢弃
const MAX_STOP_WORD_RATIO: f64 = 0.7;

/// 小写、去标点、按空白切分（连字符和斜杠视为空格）
pub fn normalize_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                Some(c)
            } else if c == '-' || c == '/' {
                Some(' ')
            } else {
                None
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// 从标准答案抽取关键短语
///
/// 含逗号时视为关键词列表，按逗号切分；否则按子句切分并过滤。结果去重且保持顺序。
pub fn extract_key_phrases(model_answer: &str) -> Vec<String> {
    let candidates: Vec<String> = if model_answer.contains(',') {
        model_answer
            .split(',')
            .map(|part| normalize_words(part).join(" "))
            .filter(|phrase| !phrase.is_empty())
            .collect()
    } else {
        model_answer
            .split(['.', ';', ':', '\n'])
            .filter_map(|clause| {
                let words = normalize_words(clause);
                keep_clause(&words).then(|| words.join(" "))
            })
            .collect()
    };

    let mut phrases: Vec<String> = Vec::with_capacity(candidates.len());
    for phrase in candidates {
        if !phrases.contains(&phrase) {
            phrases.push(phrase);
        }
    }
    phrases
}

fn keep_clause(words: &[String]) -> bool {
    if words.is_empty() {
        return false;
    }
    let stop_words = words.iter().filter(|w| is_stop_word(w)).count();
    if stop_words as f64 / words.len() as f64 > MAX_STOP_WORD_RATIO {
        return false;
    }
    words.len() > 2 || words.iter().any(|w| is_important_term(w))
}
