mod common;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use common::{orchestrator, ScriptedProvider, MCQ_TEXT, PHOTOSYNTHESIS_TEXT};
use exam_grader::clients::{OcrOutcome, OcrProvider};
use exam_grader::error::OcrError;
use exam_grader::services::templates::OPEN_ENDED_DEFAULT_ANSWER;
use exam_grader::{App, AppError, Config, GradeOutcome, PerformanceLabel, QuestionCtx, QuestionFlow, RunStats, ScoringError};

fn flow_without_providers() -> QuestionFlow {
    QuestionFlow::new(orchestrator(vec![]), None)
}

fn temp_folder(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("exam_grader_it_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

struct FixedOcr(OcrOutcome);

#[async_trait]
impl OcrProvider for FixedOcr {
    async fn extract(&self, _image: &[u8], _is_question_paper: bool) -> Result<OcrOutcome, OcrError> {
        Ok(self.0.clone())
    }
}

#[test]
fn test_evaluate_mcq() {
    let flow = flow_without_providers();

    let right = flow.evaluate(MCQ_TEXT, 2, "B", "B").unwrap();
    assert_eq!(right.marks_awarded, 2);
    assert_eq!(right.is_correct, Some(true));

    let wrong = flow.evaluate(MCQ_TEXT, 2, "B", "A").unwrap();
    assert_eq!(wrong.marks_awarded, 0);
    assert_eq!(wrong.performance_label, PerformanceLabel::Poor);
}

#[test]
fn test_evaluate_open_ended_partial_credit() {
    let flow = flow_without_providers();
    let result = flow
        .evaluate(
            PHOTOSYNTHESIS_TEXT,
            5,
            "photosynthesis, chlorophyll, carbon dioxide, oxygen, sunlight",
            "Plants use sunlight and chlorophyll for energy.",
        )
        .unwrap();

    assert_eq!(result.marks_awarded, 2);
    assert_eq!(result.total_marks, 5);
    assert!(result.key_points_missing.contains(&"oxygen".to_string()));
    assert!(!result.feedback.is_empty());
}

#[test]
fn test_evaluate_zero_total_uses_defaults() {
    let flow = flow_without_providers();
    assert_eq!(flow.evaluate(MCQ_TEXT, 0, "C", "C").unwrap().total_marks, 1);
    assert_eq!(
        flow.evaluate("Name the gases", 0, "oxygen, nitrogen, argon", "argon").unwrap().total_marks,
        3
    );
}

#[test]
fn test_evaluate_rejects_blank_student_answer() {
    let flow = flow_without_providers();
    assert_eq!(
        flow.evaluate(MCQ_TEXT, 1, "B", "   "),
        Err(ScoringError::InputInvalid { field: "student_answer" })
    );
}

#[test]
fn test_grade_reports_degraded_result() {
    let flow = flow_without_providers();
    let ctx = QuestionCtx::new("Biology".to_string(), 1, 1, "q1".to_string());
    let outcome = flow.grade(&ctx, "Explain osmosis.", 4, OPEN_ENDED_DEFAULT_ANSWER, "water moves");
    match outcome {
        GradeOutcome::Degraded(result) => assert_eq!(result.marks_awarded, 2),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_generate_model_answer_without_providers_uses_template() {
    let answer = flow_without_providers().generate_model_answer(PHOTOSYNTHESIS_TEXT).await;
    assert!(answer.contains("chlorophyll"));
}

#[tokio::test(start_paused = true)]
async fn test_generate_model_answer_uses_provider() {
    let groq = Arc::new(ScriptedProvider::new("groq", 1).always(Ok("(D)")));
    let flow = QuestionFlow::new(orchestrator(vec![groq]), None);
    assert_eq!(flow.generate_model_answer(MCQ_TEXT).await, "D");
}

#[tokio::test]
async fn test_read_scan_normalizes_text() {
    let ocr = Arc::new(FixedOcr(OcrOutcome::parsed("Plants   use\nsunlight  and chlorophyll")));
    let flow = QuestionFlow::new(orchestrator(vec![]), Some(ocr));

    let outcome = flow.read_scan(b"fake image", false).await.unwrap();

    assert!(outcome.success);
    assert!(outcome.parsed_text.contains("sunlight"));
    assert!(!outcome.parsed_text.contains("  "));
}

#[tokio::test]
async fn test_read_scan_passes_through_failure() {
    let ocr = Arc::new(FixedOcr(OcrOutcome::failed("Unable to recognize image")));
    let flow = QuestionFlow::new(orchestrator(vec![]), Some(ocr));

    let outcome = flow.read_scan(b"fake image", true).await.unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.error_message.as_deref(), Some("Unable to recognize image"));
}

#[tokio::test]
async fn test_read_scan_without_ocr_is_config_error() {
    let result = flow_without_providers().read_scan(b"fake image", true).await;
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[tokio::test]
async fn test_app_grades_every_question_in_folder() {
    let dir = temp_folder("app");
    std::fs::write(
        dir.join("biology.toml"),
        r#"
name = "Biology mock"

[[questions]]
id = "q1"
text = "Which gas do plants absorb from the air? A) Oxygen B) Carbon dioxide C) Nitrogen D) Helium"
total_marks = 1
student_answer = "B"
model_answer = "B"

[[questions]]
id = "q2"
text = "Describe the process of photosynthesis."
total_marks = 4
student_answer = "Chlorophyll absorbs sunlight and the plant makes glucose and oxygen."

[[questions]]
id = "q3"
text = "Describe the causes of volcanic eruptions."
total_marks = 4
student_answer = "Magma rises through the crust."

[[questions]]
id = "q4"
text = "Explain mitosis."
total_marks = 2
student_answer = ""
model_answer = "cell division, chromosomes"
"#,
    )
    .unwrap();

    let log_file = dir.join("evaluation_log.txt");
    let config = Config {
        exam_folder: dir.to_string_lossy().to_string(),
        output_log_file: log_file.to_string_lossy().to_string(),
        question_delay_ms: 0,
        batch_delay_ms: 0,
        ..Config::default()
    };

    let app = App::initialize(config).await.unwrap();
    let stats = app.run(CancellationToken::new()).await.unwrap();

    assert_eq!(
        stats,
        RunStats {
            graded: 2,
            degraded: 1,
            invalid: 1
        }
    );
    let log = std::fs::read_to_string(&log_file).unwrap();
    assert!(log.contains("ID#q1"));
    assert!(log.contains("ID#q4"));
}

#[tokio::test]
async fn test_app_initialize_rejects_unknown_provider() {
    let config = Config {
        provider_order: vec!["groq".to_string(), "mystery".to_string()],
        ..Config::default()
    };
    assert!(App::initialize(config).await.is_err());
}
