//! # Chunked Translate
//!
//! 一个翻译客户端库：上游翻译接口对单次请求有字符上限，本库把任意长度的文本
//! 切分成符合上限的分块，逐块请求后按原顺序重组为完整译文。
//!
//! ## 主要特性
//!
//! - **智能分块**: 优先在句子边界切分，其次是子句标点和单词边界，必要时硬切，保证不丢字符
//! - **结构保持**: 分块首尾的空白和换行在重组时原样放回
//! - **并发发送**: 支持顺序发送和有上限的并发发送，输出顺序始终与原文一致
//! - **明确的错误**: 任一分块失败时整体失败，并指明失败的分块，不返回截断的译文
//! - **可替换的传输层**: 通过 `Transport` trait 接入自定义 HTTP 实现或测试替身
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use chunked_translate::{Translator, TranslationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = TranslationConfig::for_target("de");
//!     config.source_language = "en".to_string();
//!     config.max_concurrent_requests = 4;
//!
//!     let translator = Translator::new(config)?;
//!     let result = translator.translate("Hello, world!").await?;
//!     println!("Translation: {}", result);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## 配置文件支持
//!
//! ```toml
//! [translation]
//! source_language = "auto"
//! target_language = "de"
//! timeout_secs = 5.0
//! max_chunk_size = 5000
//! max_concurrent_requests = 4
//! ```

pub mod chunker;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod retry;
pub mod transport;
pub mod translator;
pub mod types;

pub use chunker::{split, Chunk};
pub use config::TranslationLibConfig;
pub use error::{Result, TranslationError};
pub use request::{RequestBuilder, RequestDescriptor};
pub use response::UpstreamPayload;
pub use retry::retry_with_backoff;
pub use transport::{HttpTransport, Transport};
pub use translator::Translator;
pub use types::{
    RetryConfig, TranslatedFragment, TranslationConfig, TranslationOverrides, TranslationRequest,
    TranslationResult,
};
