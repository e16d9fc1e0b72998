pub mod evaluation;
pub mod exam;
pub mod loaders;
pub mod question;

pub use evaluation::{EvaluationResult, PerformanceLabel};
pub use exam::{ExamQuestion, ExamSheet};
pub use loaders::{load_all_exam_sheets, load_exam_sheet};
pub use question::{question_key, AnswerSource, GenerationOptions, ModelAnswer, Question, QuestionType};
