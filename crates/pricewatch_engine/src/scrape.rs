use std::sync::Arc;

use chrono::NaiveDate;
use pricewatch_core::ScrapeOutcome;
use pricewatch_logging::{pw_debug, pw_info, pw_warn};

use crate::decode::decode_html;
use crate::extract::{ExtractError, ExtractionProfile, Extractor, ProductExtractor, SelectorSet};
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};

/// One batch step: fetch, decode, extract, classify.
#[derive(Clone)]
pub struct ScrapePipeline {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
}

impl ScrapePipeline {
    pub fn new(fetcher: Arc<dyn Fetcher>, extractor: Arc<dyn Extractor>) -> Self {
        Self { fetcher, extractor }
    }

    /// The production pipeline over HTTP with the fetched-document profile.
    pub fn from_settings(
        fetch: FetchSettings,
        selectors: &SelectorSet,
    ) -> Result<Self, ExtractError> {
        let extractor = ProductExtractor::new(selectors, ExtractionProfile::FetchedDocument)?;
        Ok(Self::new(
            Arc::new(ReqwestFetcher::new(fetch)),
            Arc::new(extractor),
        ))
    }

    pub async fn scrape(&self, url: &str, reference: NaiveDate) -> ScrapeOutcome {
        let output = match self.fetcher.fetch(url).await {
            Ok(output) => output,
            Err(err) => {
                pw_warn!("Fetch failed for {}: {}", url, err);
                return ScrapeOutcome::TransportFailed(err.to_string());
            }
        };

        let decoded = decode_html(&output.bytes, output.metadata.content_type.as_deref());
        if decoded.had_replacements {
            pw_debug!(
                "Replaced malformed {} sequences in {}",
                decoded.encoding_label,
                url
            );
        }

        let outcome = self.extractor.extract(&decoded.html, reference).into_outcome();
        match &outcome {
            ScrapeOutcome::Blocked => pw_warn!("Blocked by bot check at {}", url),
            ScrapeOutcome::StructureChanged => {
                pw_warn!("No product fields found at {}", url)
            }
            ScrapeOutcome::Extracted(fields) => pw_info!(
                "Extracted {} price={:?} availability={:?}",
                url,
                fields.price,
                fields.availability
            ),
            ScrapeOutcome::TransportFailed(_) => {}
        }
        outcome
    }
}
