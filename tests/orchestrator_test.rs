mod common;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use common::{orchestrator, orchestrator_with_cache, question, rate_limited, test_cache, ScriptedProvider, MCQ_TEXT, PHOTOSYNTHESIS_TEXT};
use exam_grader::models::AnswerSource;
use exam_grader::orchestrator::{error_placeholder, BatchSettings};
use exam_grader::services::templates::{MCQ_DEFAULT_ANSWER, OPEN_ENDED_DEFAULT_ANSWER};
use exam_grader::services::AnswerStore;
use exam_grader::{BatchProcessor, ProviderError, QuestionType};

#[tokio::test(start_paused = true)]
async fn test_mcq_answer_is_reduced_to_letter() {
    let groq = Arc::new(ScriptedProvider::new("groq", 1).then(Ok("<think>oxygen is released</think>The answer is B.")));
    let orchestrator = orchestrator(vec![groq.clone()]);

    let q = question("q1", MCQ_TEXT);
    assert_eq!(q.question_type, QuestionType::Mcq);

    let answer = orchestrator.generate(&q).await;
    assert_eq!(answer.text, "B");
    assert_eq!(answer.source, AnswerSource::Provider("groq".to_string()));
    assert!(groq.prompts()[0].contains("Options:"));
}

#[tokio::test(start_paused = true)]
async fn test_second_request_is_served_from_cache() {
    let groq = Arc::new(ScriptedProvider::new("groq", 1).then(Ok("chlorophyll, sunlight, glucose")));
    let orchestrator = orchestrator(vec![groq.clone()]);
    let q = question("q1", PHOTOSYNTHESIS_TEXT);

    let first = orchestrator.generate(&q).await;
    let second = orchestrator.generate(&q).await;

    assert_eq!(first.text, "chlorophyll, sunlight, glucose");
    assert_eq!(second.text, first.text);
    assert_eq!(second.source, AnswerSource::Cache);
    assert_eq!(groq.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retryable_errors_back_off_then_succeed() {
    let groq = Arc::new(
        ScriptedProvider::new("groq", 1)
            .then(Err(ProviderError::Timeout))
            .then(Err(ProviderError::NetworkError("connection reset".into())))
            .then(Ok("glucose, oxygen")),
    );
    let orchestrator = orchestrator(vec![groq.clone()]);

    let started = Instant::now();
    let answer = orchestrator.generate(&question("q1", PHOTOSYNTHESIS_TEXT)).await;

    assert_eq!(answer.text, "glucose, oxygen");
    assert_eq!(groq.calls(), 3);
    // 1s + 2s
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_secs(4), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_moves_to_next_provider_without_retry() {
    let groq = Arc::new(ScriptedProvider::new("groq", 1).always(Err(rate_limited())));
    let gemini = Arc::new(ScriptedProvider::new("gemini", 2).always(Ok("sunlight, chlorophyll")));
    let orchestrator = orchestrator(vec![gemini.clone(), groq.clone()]);

    let started = Instant::now();
    let answer = orchestrator.generate(&question("q1", PHOTOSYNTHESIS_TEXT)).await;

    assert_eq!(answer.source, AnswerSource::Provider("gemini".to_string()));
    assert_eq!(groq.calls(), 1);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_unauthorized_provider_is_not_called_again() {
    let groq = Arc::new(ScriptedProvider::new("groq", 1).always(Err(ProviderError::Unauthorized("bad key".into()))));
    let gemini = Arc::new(ScriptedProvider::new("gemini", 2).always(Ok("energy, ATP")));
    let orchestrator = orchestrator(vec![groq.clone(), gemini.clone()]);

    orchestrator.generate(&question("q1", "Explain respiration.")).await;
    orchestrator.generate(&question("q2", "Explain osmosis.")).await;

    assert_eq!(groq.calls(), 1);
    assert_eq!(gemini.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_cooldown_skips_provider_until_expiry() {
    let groq = Arc::new(
        ScriptedProvider::new("groq", 1)
            .then(Err(ProviderError::RateLimited { retry_after: Some(Duration::from_secs(30)) }))
            .always(Ok("from groq")),
    );
    let gemini = Arc::new(ScriptedProvider::new("gemini", 2).always(Ok("from gemini")));
    let orchestrator = orchestrator(vec![groq.clone(), gemini.clone()]);

    orchestrator.generate(&question("q1", "Explain respiration.")).await;
    let during = orchestrator.generate(&question("q2", "Explain osmosis.")).await;
    assert_eq!(during.text, "from gemini");
    assert_eq!(groq.calls(), 1);

    tokio::time::advance(Duration::from_secs(31)).await;
    let after = orchestrator.generate(&question("q3", "Explain mitosis.")).await;
    assert_eq!(after.text, "from groq");
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_provider_is_skipped() {
    let local = Arc::new(ScriptedProvider::new("local", 1).unavailable().always(Ok("never")));
    let groq = Arc::new(ScriptedProvider::new("groq", 2).always(Ok("evaporation, condensation")));
    let orchestrator = orchestrator(vec![local.clone(), groq]);

    let answer = orchestrator.generate(&question("q1", "Describe the water cycle.")).await;

    assert_eq!(answer.text, "evaporation, condensation");
    assert_eq!(local.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_mcq_reply_without_letter_moves_on() {
    let groq = Arc::new(ScriptedProvider::new("groq", 1).always(Ok("I cannot tell from the options given.")));
    let gemini = Arc::new(ScriptedProvider::new("gemini", 2).always(Ok("C")));
    let orchestrator = orchestrator(vec![groq.clone(), gemini]);

    let answer = orchestrator.generate(&question("q1", MCQ_TEXT)).await;

    assert_eq!(answer.text, "C");
    assert_eq!(groq.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_all_providers_failing_uses_template_then_default() {
    let groq = Arc::new(ScriptedProvider::new("groq", 1).always(Err(ProviderError::Unauthorized("expired".into()))));
    let orchestrator = orchestrator(vec![groq]);

    let open = orchestrator.generate(&question("q1", PHOTOSYNTHESIS_TEXT)).await;
    assert_eq!(open.source, AnswerSource::Template);
    assert!(open.text.contains("chlorophyll"));

    let unknown = orchestrator.generate(&question("q2", "Describe the causes of volcanic eruptions.")).await;
    assert_eq!(unknown.source, AnswerSource::Default);
    assert_eq!(unknown.text, OPEN_ENDED_DEFAULT_ANSWER);

    let mcq = orchestrator.generate(&question("q3", MCQ_TEXT)).await;
    assert_eq!(mcq.source, AnswerSource::Default);
    assert_eq!(mcq.text, MCQ_DEFAULT_ANSWER);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_providers_fall_back_without_delay() {
    let groq = Arc::new(ScriptedProvider::new("groq", 1).always(Err(rate_limited())));
    let gemini = Arc::new(ScriptedProvider::new("gemini", 2).always(Err(rate_limited())));
    let orchestrator = orchestrator(vec![groq.clone(), gemini.clone()]);

    let started = Instant::now();
    let open = orchestrator.generate(&question("q1", PHOTOSYNTHESIS_TEXT)).await;

    assert_eq!(open.source, AnswerSource::Template);
    assert!(!open.text.trim().is_empty());
    assert_eq!(groq.calls(), 1);
    assert_eq!(gemini.calls(), 1);

    let unknown = orchestrator.generate(&question("q2", "Describe the causes of volcanic eruptions.")).await;

    assert_eq!(unknown.source, AnswerSource::Default);
    assert!(!unknown.text.trim().is_empty());
    assert_eq!(groq.calls(), 2);
    assert_eq!(gemini.calls(), 2);
    // 限流不重试，也不退避
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_fallback_answers_are_not_cached() {
    let (cache, _) = test_cache();
    let orchestrator = orchestrator_with_cache(vec![], cache.clone());

    let q = question("q1", PHOTOSYNTHESIS_TEXT);
    orchestrator.generate(&q).await;

    assert!(cache.get(&q.normalized_text).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_slow_provider_times_out() {
    let slow = Arc::new(
        ScriptedProvider::new("groq", 1)
            .with_latency(Duration::from_secs(120))
            .always(Ok("too late")),
    );
    let gemini = Arc::new(ScriptedProvider::new("gemini", 2).always(Ok("inertia")));
    let orchestrator = orchestrator(vec![slow.clone(), gemini]);

    let answer = orchestrator.generate(&question("q1", "State Newton's first law.")).await;

    assert_eq!(answer.text, "inertia");
    // 首次调用 + 3 次重试
    assert_eq!(slow.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_batch_keeps_order_and_fills_every_slot() {
    let groq = Arc::new(
        ScriptedProvider::new("groq", 1)
            .then(Ok("glucose, oxygen, energy"))
            .then(Err(rate_limited()))
            .then(Ok("cell division, chromosomes")),
    );
    let gemini = Arc::new(ScriptedProvider::new("gemini", 2).always(Ok("membrane, diffusion")));
    let processor = BatchProcessor::new(orchestrator(vec![groq, gemini]), BatchSettings::default());

    let questions = vec![
        question("q1", "Explain respiration."),
        question("q2", "Explain osmosis."),
        question("q3", "Explain mitosis."),
    ];
    let started = Instant::now();
    let answers = processor.generate_batch(&questions, &CancellationToken::new()).await;

    assert_eq!(
        answers,
        vec!["glucose, oxygen, energy", "membrane, diffusion", "cell division, chromosomes"]
    );
    // 批内间隔 2s，批间间隔 5s
    assert!(started.elapsed() >= Duration::from_secs(7));
}

#[tokio::test(start_paused = true)]
async fn test_batch_serves_cache_hits_without_calling_providers() {
    let (cache, _) = test_cache();
    let groq = Arc::new(ScriptedProvider::new("groq", 1).always(Ok("fresh answer")));
    let processor = BatchProcessor::new(orchestrator_with_cache(vec![groq.clone()], cache.clone()), BatchSettings::default());

    let questions = vec![question("q1", "Explain respiration."), question("q2", "Explain osmosis.")];
    cache.put(&questions[0].normalized_text, "cached answer");

    let answers = processor.generate_batch(&questions, &CancellationToken::new()).await;

    assert_eq!(answers, vec!["cached answer", "fresh answer"]);
    assert_eq!(groq.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_batch_returns_placeholders() {
    let (cache, _) = test_cache();
    let groq = Arc::new(ScriptedProvider::new("groq", 1).always(Ok("answer")));
    let processor = BatchProcessor::new(orchestrator_with_cache(vec![groq.clone()], cache.clone()), BatchSettings::default());

    let questions = vec![question("q1", "Explain respiration."), question("q2", "Explain osmosis.")];
    cache.put(&questions[1].normalized_text, "cached answer");

    let cancel = CancellationToken::new();
    cancel.cancel();
    let answers = processor.generate_batch(&questions, &cancel).await;

    assert_eq!(answers, vec![error_placeholder(0), "cached answer".to_string()]);
    assert_eq!(groq.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_question_delay_stops_batch() {
    let groq = Arc::new(ScriptedProvider::new("groq", 1).always(Ok("answer")));
    let processor = BatchProcessor::new(orchestrator(vec![groq.clone()]), BatchSettings::default());

    let questions = vec![
        question("q1", "Explain respiration."),
        question("q2", "Explain osmosis."),
        question("q3", "Explain mitosis."),
    ];
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let answers = processor.generate_batch(&questions, &cancel).await;

    assert_eq!(answers.len(), 3);
    assert_eq!(answers[0], "answer");
    assert_eq!(answers[1], error_placeholder(1));
    assert_eq!(answers[2], error_placeholder(2));
    assert_eq!(groq.calls(), 1);
}
