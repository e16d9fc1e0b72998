//! 固定词表：停用词与学术重要词

use phf::{phf_set, Set};

/// 常见停用词：冠词、代词、介词、连词、助动词
pub static STOP_WORDS: Set<&'static str> = phf_set! {
    "a", "an", "the",
    "i", "me", "my", "we", "our", "you", "your", "he", "him", "his", "she", "her",
    "it", "its", "they", "them", "their", "this", "that", "these", "those", "which",
    "who", "whom", "what", "there", "here",
    "in", "on", "at", "by", "for", "with", "about", "against", "between", "into",
    "through", "during", "before", "after", "above", "below", "to", "from", "up",
    "down", "of", "off", "over", "under", "as", "per", "via",
    "and", "but", "or", "nor", "so", "yet", "if", "because", "while", "although",
    "than", "then", "also", "such",
    "is", "am", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "can", "could", "will", "would", "shall", "should", "may",
    "might", "must",
    "not", "no", "all", "any", "some", "each", "very", "more", "most", "other",
};

/// 与领域无关的学术重要词，出现即保留该子句
pub static IMPORTANT_TERMS: Set<&'static str> = phf_set! {
    "algorithm", "analysis", "cause", "concept", "definition", "effect", "energy",
    "equation", "evidence", "example", "factor", "formula", "function", "hypothesis",
    "law", "mechanism", "method", "model", "principle", "process", "property",
    "reaction", "result", "structure", "system", "theory",
};

/// 是否停用词（参数需为小写）
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// 是否学术重要词（参数需为小写）
pub fn is_important_term(word: &str) -> bool {
    IMPORTANT_TERMS.contains(word)
}
