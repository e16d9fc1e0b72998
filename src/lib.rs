//! # Exam Grader
//!
//! 自动阅卷：生成标准答案并对学生答案评分
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 共享 HTTP 客户端，状态码到错误类型的映射
//! - `clients/` - 外部服务：生成服务适配器、OCR 服务
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 纯计算能力，只处理单道题
//! - `QuestionClassifier` - 题型识别
//! - `TextNormalizer` - OCR 文本规整
//! - `AnswerCache` - 标准答案缓存
//! - `ScoringEngine` - 评分
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 对外的评分入口
//! - `QuestionCtx` - 上下文封装（试卷 + 题号）
//! - `QuestionFlow` - evaluate / generate_model_answer / read_scan
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/generation` - 单题生成：缓存 → 生成服务 → 模板 → 默认文案
//! - `orchestrator/batch_processor` - 批量生成，节流与取消
//! - `app` - 批量阅卷入口
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::{App, RunStats};
pub use clients::{GenerationRequest, ProviderAdapter};
pub use config::Config;
pub use error::{AppError, AppResult, ProviderError, ScoringError};
pub use models::{EvaluationResult, ModelAnswer, PerformanceLabel, Question, QuestionType};
pub use orchestrator::{BatchProcessor, GenerationOrchestrator};
pub use services::ScoringEngine;
pub use workflow::{GradeOutcome, QuestionCtx, QuestionFlow};
