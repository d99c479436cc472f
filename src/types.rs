//! 类型定义模块
//!
//! 定义翻译库中使用的所有数据结构和配置类型。

use crate::error::{Result, TranslationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// 默认翻译接口地址
pub const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// 上游单次请求允许的最大字符数
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 5000;

/// 默认请求超时（秒）
pub const DEFAULT_TIMEOUT_SECS: f64 = 5.0;

/// 代理配置中允许的协议名
pub const PROXY_SCHEMES: [&str; 3] = ["http", "https", "all"];

/// 翻译配置
///
/// 包含翻译服务的所有配置选项，如接口地址、语言设置、分块和并发参数等。
/// 构造后在 `Translator` 实例内只读共享。
///
/// # 字段说明
///
/// * `source_language` - 源语言代码，"auto"表示自动检测
/// * `target_language` - 目标语言代码，为空时必须在调用时指定
/// * `timeout_secs` - 单个分块请求的超时（秒）
/// * `proxies` - 协议到代理地址的映射，如 `https -> http://proxy:8080`
/// * `endpoint` - 翻译接口地址
/// * `max_chunk_size` - 单次请求的最大字符数
/// * `max_concurrent_requests` - 同时进行的最大请求数，1 表示顺序发送
/// * `user_agent` - 请求使用的 User-Agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// 源语言代码，"auto"表示自动检测
    pub source_language: String,
    /// 目标语言代码
    pub target_language: String,
    /// 单个分块请求的超时（秒）
    pub timeout_secs: f64,
    /// 翻译接口地址
    pub endpoint: String,
    /// 单次请求的最大字符数
    pub max_chunk_size: usize,
    /// 最大并发请求数
    pub max_concurrent_requests: usize,
    /// User-Agent
    pub user_agent: String,
    /// 代理设置，仅在实例级别生效；TOML 中的表必须放在最后
    pub proxies: BTreeMap<String, String>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_language: "auto".to_string(),
            target_language: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            proxies: BTreeMap::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            max_concurrent_requests: 1,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
        }
    }
}

impl TranslationConfig {
    /// 创建指定目标语言的默认配置
    pub fn for_target(target_language: impl Into<String>) -> Self {
        Self {
            target_language: target_language.into(),
            ..Self::default()
        }
    }

    /// 检查配置中与语言无关的部分
    ///
    /// 语言代码可以在调用时覆盖，因此在合并之后才检查。
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(TranslationError::Config(
                "max_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_requests == 0 {
            return Err(TranslationError::Config(
                "max_concurrent_requests must be greater than zero".to_string(),
            ));
        }
        timeout_from_secs(self.timeout_secs)?;
        if self.endpoint.trim().is_empty() {
            return Err(TranslationError::Config("endpoint cannot be empty".to_string()));
        }
        for scheme in self.proxies.keys() {
            if !PROXY_SCHEMES.contains(&scheme.as_str()) {
                return Err(TranslationError::Config(format!(
                    "unsupported proxy scheme '{}', expected one of {:?}",
                    scheme, PROXY_SCHEMES
                )));
            }
        }
        Ok(())
    }

    /// 合并调用级覆盖项，得到本次调用使用的请求参数
    ///
    /// 逐字段合并：覆盖项中给出的字段优先，未给出的使用实例默认值。
    /// 代理不可在调用时覆盖。源语言为空时回退到 "auto"。
    pub fn resolve(&self, overrides: &TranslationOverrides) -> Result<TranslationRequest> {
        let source_language = overrides
            .source_language
            .as_deref()
            .unwrap_or(&self.source_language)
            .trim();
        let target_language = overrides
            .target_language
            .as_deref()
            .unwrap_or(&self.target_language)
            .trim();
        let timeout_secs = overrides.timeout_secs.unwrap_or(self.timeout_secs);

        Ok(TranslationRequest {
            source_language: if source_language.is_empty() {
                "auto".to_string()
            } else {
                source_language.to_string()
            },
            target_language: target_language.to_string(),
            timeout: timeout_from_secs(timeout_secs)?,
            proxies: self.proxies.clone(),
        })
    }
}

fn timeout_from_secs(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(TranslationError::Config(format!(
            "timeout must be a positive number of seconds, got {}",
            secs
        )));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| {
        TranslationError::Config(format!("timeout of {} seconds is out of range: {}", secs, e))
    })
}

/// 调用级覆盖项
///
/// 所有字段可选，`None` 表示沿用实例配置。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationOverrides {
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    pub timeout_secs: Option<f64>,
}

impl TranslationOverrides {
    pub fn target(target_language: impl Into<String>) -> Self {
        Self {
            target_language: Some(target_language.into()),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source_language: impl Into<String>) -> Self {
        self.source_language = Some(source_language.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: f64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }
}

/// 单次调用合并后的请求参数
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    /// 源语言代码，可以是 "auto"
    pub source_language: String,
    /// 目标语言代码
    pub target_language: String,
    /// 每个分块请求各自的超时
    pub timeout: Duration,
    /// 代理设置
    pub proxies: BTreeMap<String, String>,
}

/// 单个分块的翻译结果
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedFragment {
    /// 对应分块的序号
    pub index: usize,
    /// 翻译后的文本
    pub text: String,
    /// 上游检测到的源语言
    pub detected_source_language: Option<String>,
}

/// 完整的翻译结果
///
/// `text` 是按分块顺序重新拼接（包括分块之间的空白）后的译文，
/// `fragments` 保留每个分块的翻译结果。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranslationResult {
    pub text: String,
    pub fragments: Vec<TranslatedFragment>,
}

impl TranslationResult {
    /// 第一个报告了源语言的分块所检测到的语言
    pub fn detected_source_language(&self) -> Option<&str> {
        self.fragments
            .iter()
            .find_map(|fragment| fragment.detected_source_language.as_deref())
    }

    /// 每个分块的译文，按分块顺序
    pub fn segments(&self) -> Vec<String> {
        self.fragments.iter().map(|fragment| fragment.text.clone()).collect()
    }
}

/// 外部重试配置
///
/// 翻译核心不会自动重试，该配置供调用方在外层使用 `retry_with_backoff`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 500,
            max_delay_ms: 8000,
            backoff_multiplier: 2.0,
        }
    }
}
