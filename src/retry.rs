//! 外部重试模块
//!
//! 翻译核心不会自动重试。调用方可以用 `retry_with_backoff` 包装整个调用，
//! 按指数退避重试可重试的错误（传输失败、空翻译结果）。

use crate::error::Result;
use crate::types::RetryConfig;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// 带指数退避的重试机制
///
/// 只有 `TranslationError::is_retryable` 为真的错误会被重试，
/// 其余错误立即返回。
///
/// # 参数
///
/// * `operation` - 要执行的异步操作
/// * `config` - 重试配置
///
/// # 示例
///
/// ```rust,no_run
/// use chunked_translate::{retry_with_backoff, RetryConfig, Translator, TranslationConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let translator = Translator::new(TranslationConfig::for_target("de"))?;
///     let text = "Hello, world!";
///
///     let result = retry_with_backoff(|| translator.translate(text), &RetryConfig::default()).await?;
///     println!("{}", result);
///     Ok(())
/// }
/// ```
pub async fn retry_with_backoff<F, Fut, T>(mut operation: F, config: &RetryConfig) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut delay = config.initial_delay_ms;
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt >= config.max_retries || !e.is_retryable() => return Err(e),
            Err(e) => {
                attempt += 1;
                warn!(
                    attempt,
                    chunk = ?e.chunk_index(),
                    delay_ms = delay,
                    error = %e,
                    "translation attempt failed, retrying"
                );
                sleep(Duration::from_millis(delay)).await;
                delay = std::cmp::min(
                    (delay as f64 * config.backoff_multiplier) as u64,
                    config.max_delay_ms,
                );
            }
        }
    }
}
