//! 业务能力层
//!
//! 纯计算能力，不关心流程，不做网络请求。

pub mod answer_cache;
pub mod classifier;
pub mod handwriting;
pub mod normalizer;
pub mod scoring;
pub mod templates;

pub use answer_cache::{AnswerCache, AnswerStore, Clock, ManualClock, SystemClock};
pub use classifier::{is_option_letter, QuestionClassifier};
pub use handwriting::{HandwritingAnalysis, HandwritingAnalyzer};
pub use normalizer::TextNormalizer;
pub use scoring::ScoringEngine;
pub use templates::{default_answer, is_default_answer, TemplateLibrary};
