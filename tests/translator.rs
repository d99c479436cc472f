use async_trait::async_trait;
use chunked_translate::{
    RequestDescriptor, Result, TranslationConfig, TranslationError, TranslationOverrides,
    Transport, Translator,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Copy)]
enum Behavior {
    Echo,
    MalformedAt(usize),
    EmptyAt(usize),
}

/// 把正文包在尖括号里返回的假传输层，记录调用次数和并发峰值
struct FakeTransport {
    behavior: Behavior,
    delay: fn(usize) -> Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    targets: Mutex<Vec<String>>,
}

impl FakeTransport {
    fn new(behavior: Behavior) -> Arc<Self> {
        Self::with_delay(behavior, |_| Duration::ZERO)
    }

    fn with_delay(behavior: Behavior, delay: fn(usize) -> Duration) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            delay,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let index = request.chunk_index;
        let delay = (self.delay)(index);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let q = request.query_value("q").unwrap_or_default().to_string();
        let tl = request.query_value("tl").unwrap_or_default().to_string();
        self.targets.lock().unwrap().push(tl);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let body = match self.behavior {
            Behavior::MalformedAt(i) if i == index => "<html>captcha</html>".to_string(),
            Behavior::EmptyAt(i) if i == index => r#"[null,null,"en"]"#.to_string(),
            _ => serde_json::json!([[[format!("<{}>", q), q, null, null, 1]], null, "en"])
                .to_string(),
        };
        Ok(body)
    }
}

fn translator(transport: Arc<FakeTransport>, max_chunk_size: usize, in_flight: usize) -> Translator {
    let mut config = TranslationConfig::for_target("tr");
    config.max_chunk_size = max_chunk_size;
    config.max_concurrent_requests = in_flight;
    Translator::with_transport(config, transport).unwrap()
}

const LONG_TEXT: &str = "First sentence here. Second sentence follows.\nA new line starts. \
    Then a fourth one, with a clause. Fifth! Sixth? Seventh sentence is the last one.";

#[tokio::test]
async fn short_text_is_a_single_request() {
    let transport = FakeTransport::new(Behavior::Echo);
    let translator = translator(transport.clone(), 5000, 1);

    let result = translator.translate("This is an example.").await.unwrap();
    assert_eq!(result, "<This is an example.>");
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn empty_text_makes_no_requests() {
    let transport = FakeTransport::new(Behavior::Echo);
    let translator = translator(transport.clone(), 20, 4);

    assert_eq!(translator.translate("").await.unwrap(), "");
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn missing_target_fails_before_any_request() {
    let transport = FakeTransport::new(Behavior::Echo);
    let translator =
        Translator::with_transport(TranslationConfig::default(), transport.clone()).unwrap();

    let err = translator.translate("Hello world.").await.unwrap_err();
    assert!(matches!(err, TranslationError::InvalidLanguageCode(_)));
    assert_eq!(transport.calls(), 0);

    let err = translator
        .translate_with("Hello world.", &TranslationOverrides::target("not a code"))
        .await
        .unwrap_err();
    assert!(matches!(err, TranslationError::InvalidLanguageCode(_)));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn long_text_is_split_and_reassembled() {
    let transport = FakeTransport::new(Behavior::Echo);
    let translator = translator(transport.clone(), 20, 1);

    let overrides = TranslationOverrides::default();
    let text = "Hello world. This is a test of chunking.";

    let segments = translator.translate_segments(text, &overrides).await.unwrap();
    assert_eq!(
        segments,
        vec!["<Hello world.>", "<This is a test of>", "<chunking.>"]
    );

    let result = translator.translate(text).await.unwrap();
    assert_eq!(result, "<Hello world.> <This is a test of> <chunking.>");
}

#[tokio::test]
async fn line_structure_survives_reassembly() {
    let transport = FakeTransport::new(Behavior::Echo);
    let translator = translator(transport.clone(), 7, 1);

    let result = translator.translate("Hello.\n\n\n\nWorld.").await.unwrap();
    assert_eq!(result, "<Hello.>\n\n\n\n<World.>");
    // 纯空白分块不会发送
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn concurrent_dispatch_keeps_chunk_order() {
    let sequential = translator(FakeTransport::new(Behavior::Echo), 25, 1);
    let expected = sequential
        .translate_detailed(LONG_TEXT, &TranslationOverrides::default())
        .await
        .unwrap();
    assert!(expected.fragments.len() > 4);

    // 序号越小的分块完成得越晚
    let transport = FakeTransport::with_delay(Behavior::Echo, |index| {
        Duration::from_millis(10 * (12u64.saturating_sub(index as u64)))
    });
    let concurrent = translator(transport.clone(), 25, 4);
    let result = concurrent
        .translate_detailed(LONG_TEXT, &TranslationOverrides::default())
        .await
        .unwrap();

    assert_eq!(result, expected);
    for (i, fragment) in result.fragments.iter().enumerate() {
        assert_eq!(fragment.index, i);
    }

    let peak = transport.peak_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 4, "peak in flight was {}", peak);
    assert!(peak >= 2, "requests were not dispatched concurrently");
}

#[tokio::test]
async fn failing_chunk_aborts_whole_call() {
    for in_flight in [1, 4] {
        let transport = FakeTransport::new(Behavior::MalformedAt(1));
        let translator = translator(transport, 20, in_flight);

        let err = translator
            .translate("Hello world. This is a test of chunking.")
            .await
            .unwrap_err();

        match err {
            TranslationError::TranslationFailed { chunk_index, source } => {
                assert_eq!(chunk_index, 1);
                assert!(matches!(
                    *source,
                    TranslationError::MalformedResponse { chunk_index: 1, .. }
                ));
            }
            other => panic!("expected TranslationFailed, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn empty_upstream_result_is_reported_as_retryable() {
    let transport = FakeTransport::new(Behavior::EmptyAt(0));
    let translator = translator(transport, 5000, 1);

    let err = translator.translate("Hello world.").await.unwrap_err();
    assert_eq!(err.chunk_index(), Some(0));
    assert!(matches!(
        err.root_cause(),
        TranslationError::EmptyTranslation { chunk_index: 0 }
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn slow_chunk_times_out() {
    let transport =
        FakeTransport::with_delay(Behavior::Echo, |_| Duration::from_millis(500));
    let translator = translator(transport, 5000, 1);

    let err = translator
        .translate_with(
            "Hello world.",
            &TranslationOverrides::default().with_timeout_secs(0.05),
        )
        .await
        .unwrap_err();

    assert_eq!(err.chunk_index(), Some(0));
    assert!(matches!(err.root_cause(), TranslationError::TransportFailed(_)));
}

#[tokio::test]
async fn per_call_target_overrides_instance_default() {
    let transport = FakeTransport::new(Behavior::Echo);
    let translator = translator(transport.clone(), 5000, 1);

    translator.translate("Hello.").await.unwrap();
    translator
        .translate_with("Hello.", &TranslationOverrides::target("fr"))
        .await
        .unwrap();

    assert_eq!(*transport.targets.lock().unwrap(), vec!["tr", "fr"]);
    assert_eq!(translator.config().target_language, "tr");
}

#[tokio::test]
async fn detected_language_is_reported() {
    let translator = translator(FakeTransport::new(Behavior::Echo), 5000, 1);
    let result = translator
        .translate_detailed("Hello.", &TranslationOverrides::default())
        .await
        .unwrap();

    assert_eq!(result.detected_source_language(), Some("en"));
}

#[tokio::test]
async fn dropping_the_call_cancels_outstanding_chunks() {
    let transport =
        FakeTransport::with_delay(Behavior::Echo, |_| Duration::from_millis(100));
    let translator = translator(transport.clone(), 10, 2);
    let text = "abcdefghij".repeat(8);

    let outcome =
        tokio::time::timeout(Duration::from_millis(50), translator.translate(&text)).await;
    assert!(outcome.is_err());

    let started = transport.calls();
    assert!(started <= 2, "{} requests started before the call was dropped", started);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(transport.calls(), started);
}
