//! 关键短语与学生答案的匹配
//!
//! 先找完整出现（按词边界），否则逐词做归一化编辑距离相似度：
//! - 相似度 > 0.8 记为完整匹配（权重 0.9）
//! - 相似度在 (0.6, 0.8] 记为部分匹配（权重 0.7）
//!
//! 短语得分 = 0.7 × 精确词比例 + 0.3 × 相似度比例，只用于展示。
//! 相似度比例 > 0.8 的短语记为模糊覆盖，> 0.6 记为部分覆盖，两者都算作已覆盖。

use std::collections::HashSet;

use super::phrases::normalize_words;
use super::vocabulary::is_stop_word;

const FULL_MATCH_SIMILARITY: f64 = 0.8;
const PARTIAL_MATCH_SIMILARITY: f64 = 0.6;
const FULL_MATCH_WEIGHT: f64 = 0.9;
const PARTIAL_MATCH_WEIGHT: f64 = 0.7;
const EXACT_SHARE: f64 = 0.7;
const SIMILARITY_SHARE: f64 = 0.3;

/// 预处理后的学生答案
#[derive(Debug, Clone)]
pub struct StudentText {
    /// 以空格包裹的规范化文本，便于按词边界查找
    padded: String,
    word_set: HashSet<String>,
    content_words: Vec<String>,
}

impl StudentText {
    pub fn new(answer: &str) -> Self {
        let words = normalize_words(answer);
        let content_words = words.iter().filter(|w| !is_stop_word(w)).cloned().collect();
        Self {
            padded: format!(" {} ", words.join(" ")),
            word_set: words.into_iter().collect(),
            content_words,
        }
    }

    fn contains_phrase(&self, phrase: &str) -> bool {
        !phrase.is_empty() && self.padded.contains(&format!(" {} ", phrase))
    }

    /// 与学生答案中最相近的实词
    fn best_match(&self, word: &str) -> Option<(&str, f64)> {
        self.content_words
            .iter()
            .map(|candidate| (candidate.as_str(), strsim::normalized_levenshtein(word, candidate)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// 匹配程度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// 短语完整出现
    Exact,
    /// 逐词相似，视为覆盖
    Fuzzy,
    /// 部分覆盖
    Partial,
    Missing,
}

/// 单个短语的匹配结果
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseMatch {
    pub phrase: String,
    pub kind: MatchKind,
    /// 0.7 × 精确词比例 + 0.3 × 相似度比例
    pub score: f64,
    /// 学生答案中对应上的词
    pub matched_words: Vec<String>,
}

impl PhraseMatch {
    pub fn is_covered(&self) -> bool {
        self.kind != MatchKind::Missing
    }
}

/// 匹配一个关键短语
pub fn match_phrase(phrase: &str, student: &StudentText) -> PhraseMatch {
    if student.contains_phrase(phrase) {
        return PhraseMatch {
            phrase: phrase.to_string(),
            kind: MatchKind::Exact,
            score: 1.0,
            matched_words: vec![phrase.to_string()],
        };
    }

    let all_words: Vec<&str> = phrase.split_whitespace().collect();
    let content: Vec<&str> = all_words.iter().copied().filter(|w| !is_stop_word(w)).collect();
    let words = if content.is_empty() { all_words } else { content };
    if words.is_empty() {
        return missing(phrase);
    }

    let mut exact = 0usize;
    let mut weight_sum = 0.0;
    let mut matched_words = Vec::new();
    for word in &words {
        if student.word_set.contains(*word) {
            exact += 1;
            weight_sum += 1.0;
            matched_words.push(word.to_string());
            continue;
        }
        match student.best_match(word) {
            Some((candidate, similarity)) if similarity > FULL_MATCH_SIMILARITY => {
                weight_sum += FULL_MATCH_WEIGHT;
                matched_words.push(candidate.to_string());
            }
            Some((candidate, similarity)) if similarity > PARTIAL_MATCH_SIMILARITY => {
                weight_sum += PARTIAL_MATCH_WEIGHT;
                matched_words.push(candidate.to_string());
            }
            _ => {}
        }
    }

    let total = words.len() as f64;
    let exact_fraction = exact as f64 / total;
    let similarity_fraction = weight_sum / total;
    let score = EXACT_SHARE * exact_fraction + SIMILARITY_SHARE * similarity_fraction;

    let kind = if similarity_fraction > FULL_MATCH_SIMILARITY {
        MatchKind::Fuzzy
    } else if similarity_fraction > PARTIAL_MATCH_SIMILARITY {
        MatchKind::Partial
    } else {
        return PhraseMatch { score, ..missing(phrase) };
    };

    PhraseMatch {
        phrase: phrase.to_string(),
        kind,
        score,
        matched_words,
    }
}

fn missing(phrase: &str) -> PhraseMatch {
    PhraseMatch {
        phrase: phrase.to_string(),
        kind: MatchKind::Missing,
        score: 0.0,
        matched_words: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_phrase_on_word_boundary() {
        let student = StudentText::new("Plants take in Carbon Dioxide.");
        let m = match_phrase("carbon dioxide", &student);
        assert_eq!(m.kind, MatchKind::Exact);
        assert_eq!(m.score, 1.0);

        // 子串但不在词边界上
        let m = match_phrase("ant", &StudentText::new("plants"));
        assert_ne!(m.kind, MatchKind::Exact);
    }

    #[test]
    fn test_ocr_typo_counts_as_fuzzy_match() {
        let student = StudentText::new("the leaves contain chlorophyl");
        let m = match_phrase("chlorophyll", &student);
        assert_eq!(m.kind, MatchKind::Fuzzy);
        assert_eq!(m.matched_words, vec!["chlorophyl"]);
        // 0.7 * 0 + 0.3 * 0.9
        assert!((m.score - 0.27).abs() < 1e-9);
    }

    #[test]
    fn test_partial_match() {
        // carbon 精确，dioxide 无对应：相似度比例 0.5
        let m = match_phrase("carbon dioxide", &StudentText::new("carbon atoms"));
        assert_eq!(m.kind, MatchKind::Missing);

        // evaporation / evaporate 相似度 1 - 3/11 ≈ 0.73
        let m = match_phrase("evaporation", &StudentText::new("water will evaporate"));
        assert_eq!(m.kind, MatchKind::Partial);
        assert!(m.is_covered());

        // 只差一个字母
        let m = match_phrase("glucose", &StudentText::new("glucoze"));
        assert_eq!(m.kind, MatchKind::Fuzzy);
    }

    #[test]
    fn test_unrelated_phrase_is_missing() {
        let m = match_phrase("photosynthesis", &StudentText::new("Plants use sunlight and chlorophyll for energy."));
        assert_eq!(m.kind, MatchKind::Missing);
        assert!(!m.is_covered());
    }
}
