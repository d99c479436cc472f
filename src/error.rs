//! 错误处理模块
//!
//! 定义翻译库中使用的错误类型和错误处理机制。

use thiserror::Error;

/// 翻译错误类型
///
/// 包含翻译过程中可能出现的各种错误情况。
///
/// # 变体说明
///
/// * `InvalidLanguageCode` - 语言代码缺失或格式错误，在发起任何请求前返回
/// * `TransportFailed` - 网络、超时或代理错误
/// * `MalformedResponse` - 上游响应结构不符合预期
/// * `EmptyTranslation` - 非空输入得到了空翻译结果
/// * `TranslationFailed` - 某个分块失败，包含失败分块的序号
/// * `Config` - 配置错误
#[derive(Error, Debug)]
pub enum TranslationError {
    /// 语言代码错误
    #[error("Invalid language code: {0}")]
    InvalidLanguageCode(String),

    /// 传输层错误
    #[error("Transport failed: {0}")]
    TransportFailed(String),

    /// 响应格式错误
    #[error("Malformed response for chunk {chunk_index}: {reason}")]
    MalformedResponse {
        /// 分块序号
        chunk_index: usize,
        /// 错误原因
        reason: String,
    },

    /// 空翻译结果
    #[error("Empty translation for non-empty chunk {chunk_index}")]
    EmptyTranslation {
        /// 分块序号
        chunk_index: usize,
    },

    /// 分块翻译失败
    #[error("Translation failed at chunk {chunk_index}: {source}")]
    TranslationFailed {
        /// 失败分块的序号
        chunk_index: usize,
        /// 原始错误
        #[source]
        source: Box<TranslationError>,
    },

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TranslationError {
    /// 包装分块级错误，附带失败分块的序号
    pub fn at_chunk(chunk_index: usize, cause: TranslationError) -> Self {
        TranslationError::TranslationFailed {
            chunk_index,
            source: Box::new(cause),
        }
    }

    /// 返回与错误关联的分块序号（如果有）
    pub fn chunk_index(&self) -> Option<usize> {
        match self {
            TranslationError::MalformedResponse { chunk_index, .. }
            | TranslationError::EmptyTranslation { chunk_index }
            | TranslationError::TranslationFailed { chunk_index, .. } => Some(*chunk_index),
            _ => None,
        }
    }

    /// 返回最内层的错误原因
    pub fn root_cause(&self) -> &TranslationError {
        match self {
            TranslationError::TranslationFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// 外部重试策略是否值得重试此错误
    ///
    /// 只有传输错误和空翻译结果（通常是被限流）可重试；
    /// 语言代码、配置和响应格式错误重试也不会改变结果。
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.root_cause(),
            TranslationError::TransportFailed(_) | TranslationError::EmptyTranslation { .. }
        )
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TranslationError::TransportFailed(format!("request timed out: {}", error))
        } else {
            TranslationError::TransportFailed(error.to_string())
        }
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::Config(error.to_string())
    }
}

impl From<toml::ser::Error> for TranslationError {
    fn from(error: toml::ser::Error) -> Self {
        TranslationError::Config(error.to_string())
    }
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::Config(error.to_string())
    }
}

/// 翻译结果类型别名
///
/// 简化返回类型，使用 `TranslationError` 作为错误类型。
///
/// # 示例
///
/// ```rust
/// use chunked_translate::{Result, TranslationError};
///
/// fn example_function() -> Result<String> {
///     Err(TranslationError::InvalidLanguageCode(String::new()))
/// }
///
/// assert!(example_function().is_err());
/// ```
pub type Result<T> = std::result::Result<T, TranslationError>;
