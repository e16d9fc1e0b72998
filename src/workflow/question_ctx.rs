//! 题目处理上下文
//!
//! 封装"我正在批改哪份试卷的第几题"这一信息

use std::fmt::Display;

/// 题目处理上下文
#[derive(Debug, Clone)]
pub struct QuestionCtx {
    /// 试卷名称
    pub exam_name: String,

    /// 试卷索引（仅用于日志显示）
    pub exam_index: usize,

    /// 题目在试卷中的索引（从1开始）
    pub question_index: usize,

    /// 题目 ID
    pub question_id: String,
}

impl QuestionCtx {
    pub fn new(exam_name: String, exam_index: usize, question_index: usize, question_id: String) -> Self {
        Self {
            exam_name,
            exam_index,
            question_index,
            question_id,
        }
    }
}

impl Display for QuestionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[试卷#{} {} 题目#{} ID#{}]",
            self.exam_index, self.exam_name, self.question_index, self.question_id
        )
    }
}
