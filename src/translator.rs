//! 翻译服务核心模块
//!
//! 驱动 分块 → 构建请求 → 传输 → 解析响应 的流程，并按分块顺序重组译文。
//! 支持顺序发送和有上限的并发发送，两种模式的输出完全一致。

use crate::chunker::{self, Chunk};
use crate::error::{Result, TranslationError};
use crate::request::{validate_request, RequestBuilder, RequestDescriptor};
use crate::response;
use crate::transport::{HttpTransport, Transport};
use crate::types::{TranslatedFragment, TranslationConfig, TranslationOverrides, TranslationResult};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 翻译服务主类
///
/// 把任意长度的文本切分成上游可接受的分块，逐块翻译后按原顺序重组。
/// 配置在构造后只读，可以在多个并发调用之间共享（`Clone` 很廉价）。
///
/// 任何一个分块失败都会让整个调用失败，并返回带有分块序号的
/// `TranslationFailed`，不会返回被截断的译文。核心不做重试，
/// 需要重试时在外层使用 [`retry_with_backoff`](crate::retry_with_backoff)。
///
/// # 示例
///
/// ```rust,no_run
/// use chunked_translate::{Translator, TranslationConfig, TranslationOverrides};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let translator = Translator::new(TranslationConfig::for_target("tr"))?;
///
///     let result = translator.translate("This is an example.").await?;
///     println!("{}", result);
///
///     // 单次调用覆盖目标语言
///     let result = translator
///         .translate_with("This is an example.", &TranslationOverrides::target("fr"))
///         .await?;
///     println!("{}", result);
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Translator {
    /// 传输层
    transport: Arc<dyn Transport>,
    /// 请求构建器
    builder: RequestBuilder,
    /// 翻译配置
    config: Arc<TranslationConfig>,
}

impl Translator {
    /// 使用默认的 HTTP 传输层创建翻译服务
    ///
    /// 配置无效或代理地址无法解析时返回 `Config` 错误。
    pub fn new(config: TranslationConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// 使用自定义传输层创建翻译服务
    pub fn with_transport(config: TranslationConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            builder: RequestBuilder::new(config.endpoint.clone(), config.user_agent.clone()),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    /// 使用实例配置翻译文本
    pub async fn translate(&self, text: &str) -> Result<String> {
        self.translate_with(text, &TranslationOverrides::default())
            .await
    }

    /// 使用调用级覆盖项翻译文本
    pub async fn translate_with(&self, text: &str, overrides: &TranslationOverrides) -> Result<String> {
        Ok(self.translate_detailed(text, overrides).await?.text)
    }

    /// 翻译文本并返回每个分块的译文，按分块顺序
    pub async fn translate_segments(
        &self,
        text: &str,
        overrides: &TranslationOverrides,
    ) -> Result<Vec<String>> {
        Ok(self.translate_detailed(text, overrides).await?.segments())
    }

    /// 翻译文本，返回重组后的译文和每个分块的结果
    ///
    /// 语言代码在切分和发送任何请求之前检查，错误直接以
    /// `InvalidLanguageCode` 返回。空文本不会发送请求。
    pub async fn translate_detailed(
        &self,
        text: &str,
        overrides: &TranslationOverrides,
    ) -> Result<TranslationResult> {
        let request = self.config.resolve(overrides)?;
        validate_request(&request)?;

        let chunks = chunker::split(text, self.config.max_chunk_size);
        if chunks.is_empty() {
            return Ok(TranslationResult::default());
        }

        info!(
            chars = text.chars().count(),
            chunks = chunks.len(),
            source = %request.source_language,
            target = %request.target_language,
            max_in_flight = self.config.max_concurrent_requests,
            transport = self.transport.name(),
            "translating text"
        );

        // 全部请求先构建完成，构建失败时不会有任何请求发出
        let jobs = chunks
            .iter()
            .map(|chunk| {
                if chunk.is_blank() {
                    Ok(None)
                } else {
                    self.builder.build(chunk, &request).map(Some)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let fragments = if self.config.max_concurrent_requests <= 1 || jobs.len() == 1 {
            self.dispatch_sequential(jobs).await?
        } else {
            self.dispatch_concurrent(jobs).await?
        };

        Ok(TranslationResult {
            text: reassemble(&chunks, &fragments),
            fragments,
        })
    }

    async fn dispatch_sequential(
        &self,
        jobs: Vec<Option<RequestDescriptor>>,
    ) -> Result<Vec<TranslatedFragment>> {
        let mut fragments = Vec::with_capacity(jobs.len());

        for (index, job) in jobs.into_iter().enumerate() {
            let fragment = match job {
                None => blank_fragment(index),
                Some(request) => translate_chunk(self.transport.as_ref(), &request).await?,
            };
            fragments.push(fragment);
        }

        Ok(fragments)
    }

    /// 并发发送所有分块，同时进行的请求数不超过 `max_concurrent_requests`
    ///
    /// 结果按分块序号收集，与完成顺序无关。遇到第一个失败（按序号）时，
    /// 或者调用方丢弃了本次调用的 future 时，取消其余任务。
    async fn dispatch_concurrent(
        &self,
        jobs: Vec<Option<RequestDescriptor>>,
    ) -> Result<Vec<TranslatedFragment>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_requests));
        let mut tasks = ChunkTasks(Vec::with_capacity(jobs.len()));

        for (index, job) in jobs.into_iter().enumerate() {
            let transport = Arc::clone(&self.transport);
            let semaphore = Arc::clone(&semaphore);

            tasks.0.push(tokio::spawn(async move {
                let request = match job {
                    None => return Ok(blank_fragment(index)),
                    Some(request) => request,
                };
                let _permit = semaphore.acquire_owned().await.map_err(|e| {
                    TranslationError::at_chunk(
                        index,
                        TranslationError::TransportFailed(format!("dispatcher closed: {}", e)),
                    )
                })?;
                translate_chunk(transport.as_ref(), &request).await
            }));
        }

        let mut fragments = Vec::with_capacity(tasks.0.len());
        for index in 0..tasks.0.len() {
            let outcome = match (&mut tasks.0[index]).await {
                Ok(result) => result,
                Err(e) => Err(TranslationError::at_chunk(
                    index,
                    TranslationError::TransportFailed(format!("chunk task failed: {}", e)),
                )),
            };

            // 返回时 `tasks` 被丢弃，尚未完成的任务随之取消
            fragments.push(outcome?);
        }

        Ok(fragments)
    }
}

/// 分块任务集合，丢弃时取消所有仍在运行的任务
struct ChunkTasks(Vec<JoinHandle<Result<TranslatedFragment>>>);

impl Drop for ChunkTasks {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// 翻译单个分块：发送请求、执行超时、解析响应
///
/// 所有错误都包装为带分块序号的 `TranslationFailed`。
async fn translate_chunk(
    transport: &dyn Transport,
    request: &RequestDescriptor,
) -> Result<TranslatedFragment> {
    let index = request.chunk_index;
    debug!(chunk = index, timeout = ?request.timeout, "sending chunk");

    let outcome = match tokio::time::timeout(request.timeout, transport.send(request)).await {
        Ok(result) => result,
        Err(_) => Err(TranslationError::TransportFailed(format!(
            "request timed out after {:?}",
            request.timeout
        ))),
    }
    .and_then(|body| response::parse(&body, index));

    match outcome {
        Ok(fragment) => {
            debug!(chunk = index, chars = fragment.text.chars().count(), "chunk translated");
            Ok(fragment)
        }
        Err(e) => {
            warn!(chunk = index, error = %e, "chunk translation failed");
            Err(TranslationError::at_chunk(index, e))
        }
    }
}

fn blank_fragment(index: usize) -> TranslatedFragment {
    TranslatedFragment {
        index,
        text: String::new(),
        detected_source_language: None,
    }
}

/// 按分块顺序拼接译文，并放回每个分块首尾的空白
fn reassemble(chunks: &[Chunk], fragments: &[TranslatedFragment]) -> String {
    debug_assert_eq!(chunks.len(), fragments.len());

    chunks
        .iter()
        .zip(fragments)
        .map(|(chunk, fragment)| {
            debug_assert_eq!(chunk.index, fragment.index);
            chunk.wrap(&fragment.text)
        })
        .collect()
}
