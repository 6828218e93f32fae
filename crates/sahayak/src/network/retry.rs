//! 网络请求重试策略
//!
//! 支持指数退避、总时长预算和可选抖动

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::error::AgentError;

/// 重试配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// 最大尝试次数（包含第一次）
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// 基础延迟（毫秒）
    #[serde(default = "default_base_delay")]
    pub base_delay: u64,
    /// 最大延迟（毫秒）
    #[serde(default = "default_max_delay")]
    pub max_delay: u64,
    /// 总时长预算（毫秒），仅在两次尝试之间检查
    #[serde(default = "default_max_total_duration")]
    pub max_total_duration: u64,
    /// 抖动因子 (0.0-1.0)，默认关闭
    #[serde(default)]
    pub jitter: f64,
}

fn default_max_attempts() -> u32 {
    10
}
fn default_base_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    5000
}
fn default_max_total_duration() -> u64 {
    120_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        DEFAULT_RETRY_CONFIG
    }
}

/// 默认重试配置
pub const DEFAULT_RETRY_CONFIG: RetryConfig = RetryConfig {
    max_attempts: 10,
    base_delay: 1000,
    max_delay: 5000,
    max_total_duration: 120_000, // 2分钟
    jitter: 0.0,
};

/// 计算重试延迟
///
/// `attempt` 从 0 开始：`min(base_delay * 2^attempt, max_delay)`
pub fn calculate_retry_delay(attempt: u32, config: &RetryConfig) -> u64 {
    let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
    // 限制最大延迟
    let delay = config.base_delay.saturating_mul(factor).min(config.max_delay);

    // 应用抖动（避免惊群效应），结果仍不超过最大延迟
    let jitter_amount = (delay as f64 * config.jitter.clamp(0.0, 1.0)) as i64;
    if jitter_amount == 0 {
        return delay;
    }
    let random_jitter = rand::thread_rng().gen_range(-jitter_amount..=jitter_amount);
    ((delay as i64 + random_jitter).max(0) as u64).min(config.max_delay)
}

/// 重试失败
#[derive(Debug)]
pub enum RetryError<E> {
    /// 所有尝试都失败，保留最后一次错误
    Exhausted { last_error: E, attempts: u32 },
    /// 超出总时长预算
    Timeout {
        elapsed_ms: u64,
        budget_ms: u64,
        attempts: u32,
        last_error: Option<E>,
    },
}

impl<E> RetryError<E> {
    /// 已执行的尝试次数
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::Timeout { attempts, .. } => *attempts,
        }
    }

    pub fn last_error(&self) -> Option<&E> {
        match self {
            Self::Exhausted { last_error, .. } => Some(last_error),
            Self::Timeout { last_error, .. } => last_error.as_ref(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exhausted {
                last_error,
                attempts,
            } => write!(f, "Failed after {} attempts: {}", attempts, last_error),
            Self::Timeout { budget_ms, .. } => write!(f, "Retry timeout after {}ms", budget_ms),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.last_error().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<RetryError<AgentError>> for AgentError {
    fn from(err: RetryError<AgentError>) -> Self {
        match err {
            RetryError::Exhausted { last_error, .. } => last_error,
            RetryError::Timeout {
                elapsed_ms,
                budget_ms,
                attempts,
                ..
            } => AgentError::RetryTimeout {
                budget_ms,
                elapsed_ms,
                attempts,
            },
        }
    }
}

/// 执行带重试的操作，每次失败后回调 `on_retry(attempt, error, delay_ms)`
///
/// 总时长只在每次尝试之前检查，正在进行的尝试不会被中断。
pub async fn with_retry_notify<T, E, F, Fut>(
    mut operation: F,
    config: &RetryConfig,
    on_retry: impl Fn(u32, &E, u64),
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let started = Instant::now();
    let budget = Duration::from_millis(config.max_total_duration);
    let max_attempts = config.max_attempts.max(1);
    let mut last_error: Option<E> = None;
    let mut attempts = 0;

    loop {
        let elapsed = started.elapsed();
        if elapsed > budget {
            return Err(RetryError::Timeout {
                elapsed_ms: elapsed.as_millis() as u64,
                budget_ms: config.max_total_duration,
                attempts,
                last_error,
            });
        }

        attempts += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                // 最后一次尝试失败
                if attempts >= max_attempts {
                    return Err(RetryError::Exhausted {
                        last_error: error,
                        attempts,
                    });
                }

                let delay = calculate_retry_delay(attempts - 1, config);
                tracing::warn!(
                    attempt = attempts,
                    delay_ms = delay,
                    error = %error,
                    "attempt failed, retrying"
                );
                on_retry(attempts, &error, delay);
                last_error = Some(error);

                // 等待后重试
                sleep(Duration::from_millis(delay)).await;
            }
        }
    }
}

/// 简化的重试函数
pub async fn with_retry<T, E, F, Fut>(operation: F, config: &RetryConfig) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    with_retry_notify(operation, config, |_, _, _| {}).await
}
