use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 默认级别 `info`，可通过 `RUST_LOG` 覆盖；重复调用不会报错
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n阅卷日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 向日志文件追加一行
pub fn append_log_line(log_file_path: &str, line: &str) -> Result<()> {
    let mut file = OpenOptions::new().append(true).create(true).open(log_file_path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `providers`: 已注册的生成服务名称（按优先级）
/// - `max_concurrent`: 最大评分并发数
pub fn log_startup(providers: &[String], max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 自动阅卷模式");
    if providers.is_empty() {
        info!("🤖 未配置任何生成服务，将只使用模板/默认答案");
    } else {
        info!("🤖 生成服务顺序: {}", providers.join(" → "));
    }
    info!("📊 最大评分并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录试卷加载信息
pub fn log_exams_loaded(total_exams: usize, total_questions: usize) {
    info!("✓ 找到 {} 份待批改的试卷，共 {} 道题", total_exams, total_questions);
}

/// 记录生成批次开始信息
///
/// # 参数
/// - `batch_num`: 批次编号
/// - `total_batches`: 批次总数
/// - `start`: 起始题目编号
/// - `end`: 结束题目编号
/// - `total`: 待生成题目总数
pub fn log_batch_start(
    batch_num: usize,
    total_batches: usize,
    start: usize,
    end: usize,
    total: usize,
) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始生成第 {}/{} 批", batch_num, total_batches);
    info!("📄 本批题目: {}-{} / 共 {} 道", start, end, total);
    info!("{}", "=".repeat(60));
}

/// 记录生成批次完成信息
///
/// # 参数
/// - `batch_num`: 批次编号
/// - `generated`: 由生成服务得到的答案数
/// - `fallback`: 模板或默认文案数
/// - `placeholders`: 错误占位数
pub fn log_batch_complete(batch_num: usize, generated: usize, fallback: usize, placeholders: usize) {
    let total = generated + fallback + placeholders;
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 批完成: 真实答案 {}/{}", batch_num, generated, total);
    if fallback > 0 || placeholders > 0 {
        info!("⚠️ 兜底答案 {}，错误占位 {}", fallback, placeholders);
    }
    info!("{}", "─".repeat(60));
}

/// 记录缓存命中情况
pub fn log_cache_hits(hits: usize, total: usize) {
    info!("💾 缓存命中 {}/{}，剩余 {} 道需要生成", hits, total, total - hits);
}

/// 打印最终统计信息
///
/// # 参数
/// - `graded`: 正常评分数量
/// - `degraded`: 降级评分数量
/// - `invalid`: 输入无效数量
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(graded: usize, degraded: usize, invalid: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部阅卷完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 正常评分: {}/{}", graded, graded + degraded + invalid);
    info!("⚠️ 降级评分: {}", degraded);
    info!("❌ 输入无效: {}", invalid);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("光合作用的产物", 4), "光合作用...");
        assert_eq!(truncate_text("short", 10), "short");
    }

    #[test]
    fn test_append_log_line() {
        let path = std::env::temp_dir().join(format!("exam_grader_log_{}.txt", std::process::id()));
        let path_str = path.to_string_lossy().to_string();
        init_log_file(&path_str).unwrap();
        append_log_line(&path_str, "q1 2/5").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("阅卷日志"));
        assert!(content.ends_with("q1 2/5\n"));
        let _ = fs::remove_file(path);
    }
}
