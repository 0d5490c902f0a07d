use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use pricewatch_core::ScrapeOutcome;
use pricewatch_engine::{
    ChannelEventSink, EngineEvent, EngineHandle, ExtractionProfile, FailureKind, FetchError,
    FetchMetadata, FetchOutput, Fetcher, PacingSettings, ProductExtractor, ScrapePipeline,
    SelectorSet,
};

/// Serves canned pages and records the order of requests.
#[derive(Default)]
struct StubFetcher {
    pages: HashMap<String, Result<&'static str, u16>>,
    requested: Mutex<Vec<String>>,
}

impl StubFetcher {
    fn with_page(mut self, url: &str, html: &'static str) -> Self {
        self.pages.insert(url.to_string(), Ok(html));
        self
    }

    fn with_status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(url.to_string(), Err(status));
        self
    }
}

#[async_trait::async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(Ok(html)) => Ok(FetchOutput {
                bytes: html.as_bytes().to_vec(),
                metadata: FetchMetadata {
                    original_url: url.to_string(),
                    final_url: url.to_string(),
                    status_code: 200,
                    redirect_count: 0,
                    content_type: Some("text/html; charset=utf-8".to_string()),
                    byte_len: html.len() as u64,
                },
            }),
            Some(Err(status)) => Err(FetchError {
                kind: FailureKind::HttpStatus(*status),
                message: format!("status {status}"),
            }),
            None => Err(FetchError {
                kind: FailureKind::Network,
                message: "connection refused".to_string(),
            }),
        }
    }
}

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
}

fn pipeline(fetcher: Arc<StubFetcher>) -> ScrapePipeline {
    let extractor =
        ProductExtractor::new(&SelectorSet::default(), ExtractionProfile::FetchedDocument).unwrap();
    ScrapePipeline::new(fetcher, Arc::new(extractor))
}

fn fast_pacing() -> PacingSettings {
    PacingSettings {
        min_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

const KETTLE: &str = r#"<html><body><span id="productTitle">Kettle</span>
    <span class="a-price"><span class="a-offscreen">$19.99</span></span></body></html>"#;
const CAPTCHA: &str = "<html><body><h4>Enter the characters you see below</h4></body></html>";

#[test]
fn engine_reports_each_command_in_order() {
    pricewatch_logging::initialize_for_tests();
    let fetcher = Arc::new(
        StubFetcher::default()
            .with_page("https://www.amazon.com/dp/A", KETTLE)
            .with_page("https://www.amazon.com/dp/B", CAPTCHA)
            .with_status("https://www.amazon.com/dp/C", 503),
    );
    let (tx, rx) = mpsc::channel();
    let mut engine = EngineHandle::spawn(
        pipeline(fetcher.clone()),
        fast_pacing(),
        Arc::new(ChannelEventSink::new(tx)),
    )
    .unwrap();

    engine.scrape(0, "https://www.amazon.com/dp/A", reference());
    engine.delay();
    engine.scrape(1, "https://www.amazon.com/dp/B", reference());
    engine.scrape(2, "https://www.amazon.com/dp/C", reference());

    let events: Vec<EngineEvent> = (0..4)
        .map(|_| rx.recv_timeout(Duration::from_secs(5)).expect("engine event"))
        .collect();
    engine.shutdown();

    match &events[0] {
        EngineEvent::ScrapeCompleted {
            id: 0,
            outcome: ScrapeOutcome::Extracted(fields),
        } => {
            assert_eq!(fields.price.as_deref(), Some("$19.99"));
            assert_eq!(fields.title.as_deref(), Some("Kettle"));
        }
        other => panic!("unexpected first event {other:?}"),
    }
    assert_eq!(events[1], EngineEvent::DelayElapsed);
    assert_eq!(
        events[2],
        EngineEvent::ScrapeCompleted {
            id: 1,
            outcome: ScrapeOutcome::Blocked
        }
    );
    assert!(matches!(
        &events[3],
        EngineEvent::ScrapeCompleted {
            id: 2,
            outcome: ScrapeOutcome::TransportFailed(_)
        }
    ));
    assert_eq!(
        *fetcher.requested.lock().unwrap(),
        vec![
            "https://www.amazon.com/dp/A",
            "https://www.amazon.com/dp/B",
            "https://www.amazon.com/dp/C"
        ]
    );
}

#[test]
fn shutdown_interrupts_a_pending_delay() {
    let (tx, rx) = mpsc::channel();
    let pacing = PacingSettings {
        min_delay: Duration::from_secs(30),
        max_delay: Duration::from_secs(31),
    };
    let mut engine = EngineHandle::spawn(
        pipeline(Arc::new(StubFetcher::default())),
        pacing,
        Arc::new(ChannelEventSink::new(tx)),
    )
    .unwrap();

    engine.delay();
    std::thread::sleep(Duration::from_millis(50));
    let started = Instant::now();
    engine.shutdown();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn pipeline_maps_empty_page_to_structure_change() {
    let fetcher = Arc::new(
        StubFetcher::default().with_page("https://www.amazon.com/dp/Z", "<html><body></body></html>"),
    );
    let outcome = pipeline(fetcher)
        .scrape("https://www.amazon.com/dp/Z", reference())
        .await;
    assert_eq!(outcome, ScrapeOutcome::StructureChanged);
}
