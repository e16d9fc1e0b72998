//! 批量生成标准答案 - 编排层
//!
//! 1. 先同步取出所有缓存命中的题目
//! 2. 剩余题目按固定大小分批，批内逐题生成，题与题之间、批与批之间留出间隔，避免触发限流
//! 3. 每道题独立走完整的回退链，一道题出问题不影响其它题
//! 4. 取消后不再发起新的生成请求，已在进行中的请求照常完成并写入结果

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::generation::GenerationOrchestrator;
use crate::config::Config;
use crate::models::{AnswerSource, Question};
use crate::utils::logging::{log_batch_complete, log_batch_start, log_cache_hits};

/// 批量节流参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    pub batch_size: usize,
    pub question_delay: Duration,
    pub batch_delay: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_size: 2,
            question_delay: Duration::from_millis(2000),
            batch_delay: Duration::from_millis(5000),
        }
    }
}

impl BatchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            question_delay: Duration::from_millis(config.question_delay_ms),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
        }
    }
}

/// 题目生成失败时的占位文本（题号从 1 开始）
pub fn error_placeholder(index: usize) -> String {
    format!("[Error generating answer for question {}]", index + 1)
}

/// 批次统计
#[derive(Debug, Default)]
struct BatchStats {
    generated: usize,
    fallback: usize,
    placeholders: usize,
}

/// 批量生成器
pub struct BatchProcessor {
    orchestrator: Arc<GenerationOrchestrator>,
    settings: BatchSettings,
}

impl BatchProcessor {
    pub fn new(orchestrator: Arc<GenerationOrchestrator>, settings: BatchSettings) -> Self {
        Self {
            orchestrator,
            settings: BatchSettings {
                batch_size: settings.batch_size.max(1),
                ..settings
            },
        }
    }

    /// 批量生成
    ///
    /// 返回值与输入一一对应，不会有空位
    pub async fn generate_batch(&self, questions: &[Question], cancel: &CancellationToken) -> Vec<String> {
        let total = questions.len();
        let mut slots: Vec<Option<String>> = vec![None; total];

        // 先处理缓存命中
        let mut pending = Vec::new();
        for (index, question) in questions.iter().enumerate() {
            match self.orchestrator.cached(question) {
                Some(answer) => slots[index] = Some(answer.text),
                None => pending.push(index),
            }
        }
        log_cache_hits(total - pending.len(), total);

        let batch_size = self.settings.batch_size;
        let total_batches = pending.len().div_ceil(batch_size);

        'batches: for (batch_index, batch) in pending.chunks(batch_size).enumerate() {
            if batch_index > 0 && !pause(self.settings.batch_delay, cancel).await {
                break;
            }

            let first = batch_index * batch_size;
            log_batch_start(batch_index + 1, total_batches, first + 1, first + batch.len(), pending.len());

            let mut stats = BatchStats::default();
            for (position, &index) in batch.iter().enumerate() {
                if position > 0 && !pause(self.settings.question_delay, cancel).await {
                    log_batch_complete(batch_index + 1, stats.generated, stats.fallback, stats.placeholders);
                    break 'batches;
                }
                if cancel.is_cancelled() {
                    break 'batches;
                }

                let outcome = AssertUnwindSafe(self.orchestrator.generate(&questions[index]))
                    .catch_unwind()
                    .await;
                match outcome {
                    Ok(answer) => {
                        match answer.source {
                            AnswerSource::Template | AnswerSource::Default => stats.fallback += 1,
                            AnswerSource::Cache | AnswerSource::Provider(_) => stats.generated += 1,
                        }
                        slots[index] = Some(answer.text);
                    }
                    Err(_) => {
                        error!("[第 {} 题] ❌ 生成过程中发生 panic", index + 1);
                        stats.placeholders += 1;
                    }
                }
            }

            log_batch_complete(batch_index + 1, stats.generated, stats.fallback, stats.placeholders);
        }

        if cancel.is_cancelled() {
            let unstarted = slots.iter().filter(|slot| slot.is_none()).count();
            warn!("⏹️ 批量生成已取消，{} 道题未生成", unstarted);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.unwrap_or_else(|| error_placeholder(index)))
            .collect()
    }
}

/// 等待一段时间；被取消时提前返回 `false`
async fn pause(delay: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if delay.is_zero() {
        return true;
    }
    tokio::select! {
        _ = cancel.cancelled() => {
            info!("⏹️ 收到取消信号，停止等待");
            false
        }
        _ = sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_one_based() {
        assert_eq!(error_placeholder(0), "[Error generating answer for question 1]");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_is_cut_short_by_cancel() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });
        let started = tokio::time::Instant::now();
        assert!(!pause(Duration::from_secs(60), &cancel).await);
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
