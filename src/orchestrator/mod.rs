//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `generation` - 单题生成编排器
//! - 缓存 → 生成服务（按优先级、带重试） → 模板 → 默认文案
//! - 所有生成错误在这里消化
//!
//! ### `batch_processor` - 批量生成
//! - 先取缓存，再分批节流生成
//! - 支持取消，每道题都有结果
//!
//! ### `circuit` / `prompts`
//! - 服务熔断状态
//! - 提示词与模型回复整理
//!
//! ## 层次关系
//!
//! ```text
//! app::App (处理 Vec<ExamSheet>)
//!     ↓
//! workflow::QuestionFlow (处理单道题的评分请求)
//!     ↓
//! orchestrator (生成标准答案)
//!     ↓
//! services / clients (能力层：评分、规整、缓存 / 外部服务)
//!     ↓
//! infrastructure (HTTP)
//! ```

pub mod batch_processor;
pub mod circuit;
pub mod generation;
pub mod prompts;

pub use batch_processor::{error_placeholder, BatchProcessor, BatchSettings};
pub use circuit::ProviderCircuit;
pub use generation::{GenerationOrchestrator, GenerationSettings};
