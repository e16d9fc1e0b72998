//! 静态正则辅助
//!
//! 规则里的正则都是字面量，编译失败只记录日志并跳过该规则，不会 panic。

use regex::Regex;
use tracing::error;

/// 编译一个静态正则
pub fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            error!("正则编译失败 `{}`: {}", pattern, e);
            None
        }
    }
}

/// 判断是否匹配；正则不可用时视为不匹配
pub fn is_match(re: &Option<Regex>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

/// 全量替换；正则不可用时原样返回
pub fn replace_all(re: &Option<Regex>, text: &str, replacement: &str) -> String {
    match re {
        Some(re) => re.replace_all(text, replacement).into_owned(),
        None => text.to_string(),
    }
}
