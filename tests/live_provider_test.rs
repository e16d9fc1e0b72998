use exam_grader::clients::build_providers;
use exam_grader::utils::logging;
use exam_grader::workflow::QuestionFlow;
use exam_grader::{App, Config};

#[tokio::test]
#[ignore] // 需要真实的 API 密钥，手动运行：cargo test -- --ignored
async fn test_generate_with_configured_providers() {
    logging::init(true);

    let config = Config::from_env();
    let providers = build_providers(&config).expect("生成服务创建失败");
    assert!(!providers.is_empty(), "请先配置至少一个生成服务的 API 密钥");

    let app = App::initialize(config).await.expect("初始化失败");
    let flow: std::sync::Arc<QuestionFlow> = app.flow();

    let answer = flow
        .generate_model_answer(
            "Which planet is known as the Red Planet? A) Venus B) Mars C) Jupiter D) Saturn",
        )
        .await;
    println!("标准答案: {}", answer);
    assert_eq!(answer, "B");

    let result = flow.evaluate("Which planet is known as the Red Planet?", 1, &answer, "B").unwrap();
    assert_eq!(result.marks_awarded, 1);
}
