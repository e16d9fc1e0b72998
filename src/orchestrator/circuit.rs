//! 生成服务熔断状态
//!
//! - 鉴权失败：进程生命周期内不再尝试
//! - 限流且给出了 `Retry-After`：冷却期内跳过

use std::collections::HashMap;
use std::sync::Mutex;
use tokio::time::Instant;
use tracing::info;

use crate::error::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CircuitState {
    Disabled,
    CoolingDown(Instant),
}

/// 各服务的熔断状态
#[derive(Debug, Default)]
pub struct ProviderCircuit {
    states: Mutex<HashMap<String, CircuitState>>,
}

impl ProviderCircuit {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否应跳过该服务；冷却到期的状态在这里清除
    pub fn is_open(&self, provider: &str) -> bool {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        match states.get(provider).copied() {
            Some(CircuitState::Disabled) => true,
            Some(CircuitState::CoolingDown(until)) if Instant::now() < until => true,
            Some(CircuitState::CoolingDown(_)) => {
                states.remove(provider);
                false
            }
            None => false,
        }
    }

    /// 记录一次失败
    pub fn record_failure(&self, provider: &str, error: &ProviderError) {
        let state = match error {
            ProviderError::Unauthorized(_) => CircuitState::Disabled,
            ProviderError::RateLimited {
                retry_after: Some(wait),
            } => CircuitState::CoolingDown(Instant::now() + *wait),
            _ => return,
        };

        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        // 已禁用的服务不会被冷却覆盖
        if states.get(provider) == Some(&CircuitState::Disabled) {
            return;
        }
        match state {
            CircuitState::Disabled => info!("🔒 [{}] 鉴权失败，本次运行不再使用", provider),
            CircuitState::CoolingDown(_) => info!("⏸️ [{}] 触发限流，冷却后再试", provider),
        }
        states.insert(provider.to_string(), state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_unauthorized_disables_for_good() {
        let circuit = ProviderCircuit::new();
        circuit.record_failure("groq", &ProviderError::Unauthorized("bad key".into()));
        assert!(circuit.is_open("groq"));
        circuit.record_failure("groq", &ProviderError::RateLimited { retry_after: Some(Duration::from_secs(1)) });
        assert!(circuit.is_open("groq"));
        assert!(!circuit.is_open("gemini"));
    }

    #[test]
    fn test_retryable_errors_keep_circuit_closed() {
        let circuit = ProviderCircuit::new();
        circuit.record_failure("groq", &ProviderError::Timeout);
        circuit.record_failure("groq", &ProviderError::RateLimited { retry_after: None });
        assert!(!circuit.is_open("groq"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_cooldown_expires() {
        let circuit = ProviderCircuit::new();
        circuit.record_failure("together", &ProviderError::RateLimited { retry_after: Some(Duration::from_secs(10)) });
        assert!(circuit.is_open("together"));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(!circuit.is_open("together"));
    }
}
