use serde::{Deserialize, Serialize};
use std::fmt;

/// 表现等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceLabel {
    Excellent,
    Good,
    Average,
    Poor,
}

impl PerformanceLabel {
    /// 按覆盖率划分等级
    ///
    /// Average 从 0.40 起算而不是 0.50：只覆盖 5 个关键点中 2 个的答案应评为 Average
    pub fn from_coverage(coverage: f64) -> Self {
        if coverage >= 0.85 {
            PerformanceLabel::Excellent
        } else if coverage >= 0.70 {
            PerformanceLabel::Good
        } else if coverage >= 0.40 {
            PerformanceLabel::Average
        } else {
            PerformanceLabel::Poor
        }
    }
}

impl fmt::Display for PerformanceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PerformanceLabel::Excellent => "Excellent",
            PerformanceLabel::Good => "Good",
            PerformanceLabel::Average => "Average",
            PerformanceLabel::Poor => "Poor",
        };
        write!(f, "{}", label)
    }
}

/// 评分结果
///
/// 每次评分新建，构造后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub marks_awarded: u32,
    pub total_marks: u32,
    pub key_points_covered: Vec<String>,
    pub key_points_missing: Vec<String>,
    pub matched_keywords: Vec<String>,
    /// 仅选择题
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    pub performance_label: PerformanceLabel,
    pub evaluation_reason: String,
    pub feedback: Vec<String>,
    pub coverage: f64,
    /// 标准答案不可用时的 50% 默认评分
    pub degraded: bool,
}

impl EvaluationResult {
    /// 导出给展示层的 JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
