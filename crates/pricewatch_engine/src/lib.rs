//! Price watch engine: fetch, decode and extract product pages, pace the
//! batch, and render exports.
mod decode;
mod engine;
mod export;
mod extract;
mod fetch;
mod pacing;
mod persist;
mod scrape;
mod types;

pub use decode::{decode_html, DecodedHtml};
pub use engine::{ChannelEventSink, EngineError, EngineHandle, EventSink};
pub use export::{
    clipboard_tsv, csv_export, html_report, render, write_export, ExportError, ExportFormat,
    ExportInput, CSV_HEADERS, TSV_HEADERS,
};
pub use extract::{
    ExtractError, ExtractionProfile, Extractor, PageReport, ProductExtractor, SelectorSet,
};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, BROWSER_USER_AGENT};
pub use pacing::PacingSettings;
pub use persist::{ensure_state_dir, AtomicFileWriter, PersistError};
pub use scrape::ScrapePipeline;
pub use types::{EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput};
