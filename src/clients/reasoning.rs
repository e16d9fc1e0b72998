//! 推理片段剥离
//!
//! 部分模型会把思考过程包在 `<think>...</think>` 里返回，评分只需要最终答案。

const OPEN_TAG: &str = "<think>";
const CLOSE_TAG: &str = "</think>";

/// 删除所有 `<think>...</think>` 片段；未闭合的 `<think>` 删除到文本末尾
pub fn strip_reasoning(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(OPEN_TAG) {
        cleaned.push_str(&rest[..start]);
        let inner = &rest[start + OPEN_TAG.len()..];
        match inner.find(CLOSE_TAG) {
            Some(end) => rest = &inner[end + CLOSE_TAG.len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    cleaned.push_str(rest);

    cleaned.trim().to_string()
}
