use anyhow::Result;
use exam_grader::utils::logging;
use exam_grader::{App, Config};
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    // Ctrl-C 只停止发起新的请求，进行中的题目会完成
    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⏹️ 收到 Ctrl-C，正在停止...");
            signal.cancel();
        }
    });

    // 初始化并运行应用
    App::initialize(config).await?.run(cancel).await?;

    Ok(())
}
