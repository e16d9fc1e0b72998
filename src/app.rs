//! 批量阅卷 - 应用入口
//!
//! 1. 初始化：校验配置、创建日志文件、注册生成服务、组装缓存与模板
//! 2. 加载 `exam_folder` 下的所有试卷
//! 3. 每份试卷：批量生成缺失的标准答案，再用 Semaphore 限制并发逐题评分
//! 4. 每道题写一行日志，最后输出统计

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::clients::{build_providers, OcrProvider, OcrSpaceClient};
use crate::config::Config;
use crate::infrastructure::build_http_client;
use crate::models::{load_all_exam_sheets, ExamSheet};
use crate::orchestrator::{error_placeholder, BatchProcessor, BatchSettings, GenerationOrchestrator, GenerationSettings};
use crate::services::templates::default_answer;
use crate::services::{AnswerCache, SystemClock, TemplateLibrary};
use crate::utils::logging::{append_log_line, init_log_file, log_exams_loaded, log_startup, print_final_stats};
use crate::workflow::{GradeOutcome, QuestionCtx, QuestionFlow};

/// 阅卷统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub graded: usize,
    pub degraded: usize,
    pub invalid: usize,
}

impl RunStats {
    fn record(&mut self, outcome: &GradeOutcome) {
        match outcome {
            GradeOutcome::Graded(_) => self.graded += 1,
            GradeOutcome::Degraded(_) => self.degraded += 1,
            GradeOutcome::Invalid(_) => self.invalid += 1,
        }
    }

    fn merge(&mut self, other: RunStats) {
        self.graded += other.graded;
        self.degraded += other.degraded;
        self.invalid += other.invalid;
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    flow: Arc<QuestionFlow>,
    batch: BatchProcessor,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate().context("配置校验失败")?;

        init_log_file(&config.output_log_file)
            .with_context(|| format!("无法创建日志文件: {}", config.output_log_file))?;

        let providers = build_providers(&config)?;

        let cache = Arc::new(AnswerCache::with_clock(
            config.cache_ttl(),
            config.cache_capacity(),
            SystemClock,
        ));

        let mut templates = TemplateLibrary::builtin();
        if let Some(path) = &config.template_file {
            let added = templates.extend_from_file(Path::new(path))?;
            info!("📚 从 {} 加载了 {} 条模板答案", path, added);
        }

        let orchestrator = Arc::new(GenerationOrchestrator::new(
            providers,
            cache,
            templates,
            GenerationSettings::from_config(&config),
        ));
        log_startup(&orchestrator.provider_names(), config.max_concurrent_evaluations);

        let ocr: Option<Arc<dyn OcrProvider>> = if config.ocr_api_key.trim().is_empty() {
            None
        } else {
            let http = build_http_client(Duration::from_secs(10)).context("HTTP 客户端创建失败")?;
            Some(Arc::new(OcrSpaceClient::new(http, &config.ocr_api_key, &config.ocr_api_url)))
        };

        let flow = Arc::new(QuestionFlow::new(orchestrator.clone(), ocr));
        let batch = BatchProcessor::new(orchestrator, BatchSettings::from_config(&config));

        Ok(Self { config, flow, batch })
    }

    /// 单题评分入口，供其它调用方复用
    pub fn flow(&self) -> Arc<QuestionFlow> {
        self.flow.clone()
    }

    /// 运行应用主逻辑
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunStats> {
        info!("\n📁 正在扫描待批改的试卷...");
        let sheets = load_all_exam_sheets(&self.config.exam_folder).await?;

        if sheets.is_empty() {
            warn!("⚠️ 没有找到待批改的TOML文件，程序结束");
            return Ok(RunStats::default());
        }

        let total_questions = sheets.iter().map(|s| s.questions.len()).sum();
        log_exams_loaded(sheets.len(), total_questions);

        let mut stats = RunStats::default();
        for (index, sheet) in sheets.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!("⏹️ 已取消，剩余 {} 份试卷未批改", sheets.len() - index);
                break;
            }
            info!("\n📄 开始批改第 {}/{} 份试卷: {}", index + 1, sheets.len(), sheet.name);

            let model_answers = self.resolve_model_answers(sheet, &cancel).await;
            let sheet_stats = self.grade_sheet(index + 1, sheet, model_answers).await?;
            stats.merge(sheet_stats);
        }

        print_final_stats(stats.graded, stats.degraded, stats.invalid, &self.config.output_log_file);
        Ok(stats)
    }

    /// 补齐试卷中缺失的标准答案
    ///
    /// 生成失败的占位文本换成默认文案，评分时按降级处理
    async fn resolve_model_answers(&self, sheet: &ExamSheet, cancel: &CancellationToken) -> Vec<String> {
        let missing: Vec<usize> = sheet
            .questions
            .iter()
            .enumerate()
            .filter(|(_, q)| q.model_answer.as_deref().map_or(true, |a| a.trim().is_empty()))
            .map(|(i, _)| i)
            .collect();

        let prepared: Vec<_> = missing
            .iter()
            .map(|&i| {
                let q = &sheet.questions[i];
                self.flow.prepare_question(q.id.clone(), &q.text, q.total_marks)
            })
            .collect();

        let generated = if prepared.is_empty() {
            Vec::new()
        } else {
            info!("🤖 {} 道题缺少标准答案，开始生成", prepared.len());
            self.batch.generate_batch(&prepared, cancel).await
        };

        let mut answers: Vec<String> = sheet
            .questions
            .iter()
            .map(|q| q.model_answer.clone().unwrap_or_default())
            .collect();
        for (slot, (&question_index, text)) in missing.iter().zip(generated).enumerate() {
            answers[question_index] = if text == error_placeholder(slot) {
                default_answer(prepared[slot].question_type).to_string()
            } else {
                text
            };
        }
        answers
    }

    /// 并发评分一份试卷
    async fn grade_sheet(&self, exam_index: usize, sheet: &ExamSheet, model_answers: Vec<String>) -> Result<RunStats> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_evaluations));
        let mut handles = Vec::new();

        for (idx, (question, model_answer)) in sheet.questions.iter().zip(model_answers).enumerate() {
            let permit = semaphore.clone().acquire_owned().await?;
            let flow = self.flow.clone();
            let ctx = QuestionCtx::new(sheet.name.clone(), exam_index, idx + 1, question.id.clone());
            let question = question.clone();
            let task_ctx = ctx.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                flow.grade(
                    &task_ctx,
                    &question.text,
                    question.total_marks,
                    &model_answer,
                    &question.student_answer,
                )
            });
            handles.push((ctx, handle));
        }

        let mut stats = RunStats::default();
        for (ctx, handle) in handles {
            match handle.await {
                Ok(outcome) => {
                    stats.record(&outcome);
                    if let Err(e) = append_log_line(&self.config.output_log_file, &log_line(&ctx, &outcome)) {
                        warn!("{} 写入日志失败: {}", ctx, e);
                    }
                }
                Err(e) => {
                    error!("{} 评分任务执行失败: {}", ctx, e);
                    stats.invalid += 1;
                }
            }
        }

        info!(
            "✓ 试卷 {} 批改完成: 正常 {}，降级 {}，无效 {}",
            sheet.name, stats.graded, stats.degraded, stats.invalid
        );
        Ok(stats)
    }
}

fn log_line(ctx: &QuestionCtx, outcome: &GradeOutcome) -> String {
    match outcome {
        GradeOutcome::Graded(result) | GradeOutcome::Degraded(result) => format!(
            "{} {}/{} {} | {}",
            ctx, result.marks_awarded, result.total_marks, result.performance_label, result.evaluation_reason
        ),
        GradeOutcome::Invalid(e) => format!("{} 无效: {}", ctx, e),
    }
}
