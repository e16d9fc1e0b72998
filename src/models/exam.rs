use serde::{Deserialize, Serialize};

/// 一份试卷（来自 TOML 文件）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSheet {
    pub name: String,
    #[serde(default)]
    pub questions: Vec<ExamQuestion>,
    /// 加载时填入
    #[serde(skip)]
    pub file_path: Option<String>,
}

/// 试卷中的一道题及学生作答
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamQuestion {
    pub id: String,
    pub text: String,
    /// 0 表示未指定
    #[serde(default)]
    pub total_marks: u32,
    #[serde(default)]
    pub student_answer: String,
    /// 缺省时自动生成
    #[serde(default)]
    pub model_answer: Option<String>,
}
