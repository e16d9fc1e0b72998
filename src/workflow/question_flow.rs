//! 题目处理流程 - 流程层
//!
//! 核心职责：对外提供"一道题"的评分入口
//!
//! - `evaluate`：题干 + 满分 + 标准答案 + 学生答案 → 评分结果
//! - `generate_model_answer`：题干 → 标准答案（缓存 → 生成服务 → 模板 → 默认文案）
//! - `read_scan`：扫描图片 → OCR → 规整后的文本

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::clients::{OcrOutcome, OcrProvider};
use crate::error::{AppError, ScoringError};
use crate::models::{EvaluationResult, Question};
use crate::orchestrator::GenerationOrchestrator;
use crate::services::{
    HandwritingAnalysis, HandwritingAnalyzer, QuestionClassifier, ScoringEngine, TextNormalizer,
};
use crate::utils::truncate_text;
use crate::workflow::question_ctx::QuestionCtx;

/// 题目评分结果
#[derive(Debug, Clone, PartialEq)]
pub enum GradeOutcome {
    /// 正常评分
    Graded(EvaluationResult),
    /// 标准答案不可用，给了默认分
    Degraded(EvaluationResult),
    /// 输入无效
    Invalid(ScoringError),
}

/// 题目处理流程
///
/// - 只依赖业务能力（services）和编排器
/// - 不持有任何文件或网络资源
/// - 不关心试卷层面的批量与并发
pub struct QuestionFlow {
    normalizer: TextNormalizer,
    classifier: QuestionClassifier,
    scoring: ScoringEngine,
    handwriting: HandwritingAnalyzer,
    orchestrator: Arc<GenerationOrchestrator>,
    ocr: Option<Arc<dyn OcrProvider>>,
}

impl QuestionFlow {
    pub fn new(orchestrator: Arc<GenerationOrchestrator>, ocr: Option<Arc<dyn OcrProvider>>) -> Self {
        Self {
            normalizer: TextNormalizer::new(),
            classifier: QuestionClassifier::new(),
            scoring: ScoringEngine::new(),
            handwriting: HandwritingAnalyzer::new(),
            orchestrator,
            ocr,
        }
    }

    /// 规整题干并识别题型
    pub fn prepare_question(&self, id: impl Into<String>, raw_text: &str, total_marks: u32) -> Question {
        let normalized = self.normalizer.normalize(raw_text, true);
        let question_type = self.classifier.classify(&normalized);
        Question::new(id, raw_text, normalized, question_type, total_marks)
    }

    /// 评分
    ///
    /// `total_marks` 为 0 表示未指定：选择题按 1 分，开放题按关键短语数
    pub fn evaluate(
        &self,
        question_text: &str,
        total_marks: u32,
        model_answer: &str,
        student_answer: &str,
    ) -> Result<EvaluationResult, ScoringError> {
        let total = (total_marks > 0).then_some(total_marks);
        let student = self.normalizer.normalize(student_answer, false);
        self.scoring.score(question_text, total, model_answer, &student)
    }

    /// 生成标准答案，永不失败
    pub async fn generate_model_answer(&self, question_text: &str) -> String {
        let question = self.prepare_question("adhoc", question_text, 0);
        self.orchestrator.generate(&question).await.text
    }

    /// 识别扫描件并规整文本
    ///
    /// OCR 只调用一次，失败不重试
    pub async fn read_scan(&self, image: &[u8], is_question_paper: bool) -> Result<OcrOutcome, AppError> {
        let Some(ocr) = self.ocr.as_ref() else {
            return Err(AppError::invalid_config("OCR_API_KEY", "未配置 OCR 服务"));
        };

        let mut outcome = ocr.extract(image, is_question_paper).await?;
        if outcome.success {
            outcome.parsed_text = self.normalizer.normalize(&outcome.parsed_text, is_question_paper);
            debug!("OCR 规整后文本: {}", truncate_text(&outcome.parsed_text, 80));
        } else {
            warn!("⚠️ OCR 识别失败: {:?}", outcome.error_message);
        }
        Ok(outcome)
    }

    /// 书写工整度
    pub fn analyze_handwriting(&self, text: &str) -> HandwritingAnalysis {
        self.handwriting.analyze(text)
    }

    /// 带上下文日志的评分，供批量阅卷使用
    pub fn grade(
        &self,
        ctx: &QuestionCtx,
        question_text: &str,
        total_marks: u32,
        model_answer: &str,
        student_answer: &str,
    ) -> GradeOutcome {
        match self.evaluate(question_text, total_marks, model_answer, student_answer) {
            Ok(result) if result.degraded => {
                warn!("{} ⚠️ 降级评分: {}/{}", ctx, result.marks_awarded, result.total_marks);
                GradeOutcome::Degraded(result)
            }
            Ok(result) => {
                info!(
                    "{} ✓ 得分 {}/{} ({})",
                    ctx, result.marks_awarded, result.total_marks, result.performance_label
                );
                GradeOutcome::Graded(result)
            }
            Err(e) => {
                error!("{} ❌ {}", ctx, e);
                GradeOutcome::Invalid(e)
            }
        }
    }
}
