use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::price::{analyze_price_change, PriceAnalysis};
use crate::signals::{is_late_delivery, is_low_stock, is_out_of_stock, is_price_increase};

/// Position of a record in the batch; stable for the lifetime of the batch.
pub type RecordId = usize;

/// One URL plus an optional reference price, as accepted from user input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRequest {
    pub url: String,
    pub saved_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Pending,
    Processing,
    Success,
    Blocked,
    Error,
}

impl ItemStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Blocked | Self::Error)
    }

    /// Forward-only lifecycle: `Pending -> Processing -> terminal`.
    pub fn can_advance_to(self, next: ItemStatus) -> bool {
        match self {
            Self::Pending => next == Self::Processing,
            Self::Processing => next.is_terminal(),
            Self::Success | Self::Blocked | Self::Error => false,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing...",
            Self::Success => "Success",
            Self::Blocked => "Blocked",
            Self::Error => "Error",
        };
        f.write_str(label)
    }
}

/// Fields pulled out of a product page. Missing fields stay `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductFields {
    pub price: Option<String>,
    pub availability: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub title: Option<String>,
}

impl ProductFields {
    /// True when none of title, price or availability could be found.
    pub fn is_structurally_empty(&self) -> bool {
        self.title.is_none() && self.price.is_none() && self.availability.is_none()
    }
}

/// Classified result of one fetch-and-extract step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    Extracted(ProductFields),
    Blocked,
    StructureChanged,
    /// Fetch failed or returned a non-2xx status; the detail is for logs only.
    TransportFailed(String),
}

/// Per-item failure classes recorded on a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScrapeFailure {
    #[error("Failed to fetch product data")]
    Transport,
    #[error("Request blocked - retry later")]
    Blocked,
    #[error("Product not found or page structure changed")]
    StructureChanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: RecordId,
    pub url: String,
    pub saved_price: Option<f64>,
    pub current_price: Option<String>,
    pub price_change: Option<f64>,
    pub price_change_percent: Option<f64>,
    pub availability: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub title: Option<String>,
    pub status: ItemStatus,
    pub error_message: Option<String>,
}

impl ResultRecord {
    pub fn pending(id: RecordId, request: &ProductRequest) -> Self {
        Self {
            id,
            url: request.url.clone(),
            saved_price: request.saved_price,
            current_price: None,
            price_change: None,
            price_change_percent: None,
            availability: None,
            delivery_date: None,
            title: None,
            status: ItemStatus::Pending,
            error_message: None,
        }
    }

    pub fn request(&self) -> ProductRequest {
        ProductRequest {
            url: self.url.clone(),
            saved_price: self.saved_price,
        }
    }

    /// Applies a finished scrape and returns the terminal status reached.
    pub(crate) fn apply_outcome(&mut self, outcome: ScrapeOutcome) -> ItemStatus {
        match outcome {
            ScrapeOutcome::Extracted(fields) => {
                let PriceAnalysis {
                    current_price,
                    price_change,
                    price_change_percent,
                } = analyze_price_change(self.saved_price, fields.price.as_deref());
                self.current_price = current_price;
                self.price_change = price_change;
                self.price_change_percent = price_change_percent;
                self.availability = fields.availability;
                self.delivery_date = fields.delivery_date;
                self.title = fields.title;
                self.error_message = None;
                self.status = ItemStatus::Success;
            }
            ScrapeOutcome::Blocked => self.fail(ItemStatus::Blocked, ScrapeFailure::Blocked),
            ScrapeOutcome::StructureChanged => {
                self.fail(ItemStatus::Error, ScrapeFailure::StructureChanged)
            }
            ScrapeOutcome::TransportFailed(_) => {
                self.fail(ItemStatus::Error, ScrapeFailure::Transport)
            }
        }
        self.status
    }

    fn fail(&mut self, status: ItemStatus, failure: ScrapeFailure) {
        self.status = status;
        self.error_message = Some(failure.to_string());
    }
}

/// Top-level batch counters. `total` is fixed at batch start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub total: usize,
    pub processed: usize,
    pub success: usize,
    pub failed: usize,
    pub blocked: usize,
}

impl BatchStats {
    pub fn for_batch(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, status: ItemStatus) {
        self.processed += 1;
        match status {
            ItemStatus::Success => self.success += 1,
            ItemStatus::Blocked => self.blocked += 1,
            _ => self.failed += 1,
        }
    }

    pub fn progress_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.processed * 100 + self.total / 2) / self.total).min(100) as u8
    }
}

/// Derived classifier counters, always recomputed from the full result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnhancedStats {
    pub out_of_stock: usize,
    pub late_delivery: usize,
    pub price_increased: usize,
    pub low_stock: usize,
}

impl EnhancedStats {
    pub fn recompute(records: &[ResultRecord], reference: NaiveDate) -> Self {
        records
            .iter()
            .filter(|record| record.status == ItemStatus::Success)
            .fold(Self::default(), |mut stats, record| {
                let availability = record.availability.as_deref();
                if is_out_of_stock(availability) {
                    stats.out_of_stock += 1;
                }
                if is_late_delivery(record.delivery_date, reference) {
                    stats.late_delivery += 1;
                }
                if is_price_increase(record.price_change_percent) {
                    stats.price_increased += 1;
                }
                if is_low_stock(availability) {
                    stats.low_stock += 1;
                }
                stats
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str, saved_price: Option<f64>) -> ProductRequest {
        ProductRequest {
            url: url.to_string(),
            saved_price,
        }
    }

    #[test]
    fn status_only_moves_forward() {
        assert!(ItemStatus::Pending.can_advance_to(ItemStatus::Processing));
        assert!(ItemStatus::Processing.can_advance_to(ItemStatus::Blocked));
        assert!(!ItemStatus::Pending.can_advance_to(ItemStatus::Success));
        assert!(!ItemStatus::Success.can_advance_to(ItemStatus::Pending));
        assert!(!ItemStatus::Error.can_advance_to(ItemStatus::Processing));
    }

    #[test]
    fn extracted_outcome_fills_fields_and_price_change() {
        let mut record = ResultRecord::pending(0, &request("https://www.amazon.com/dp/A", Some(100.0)));
        record.status = ItemStatus::Processing;
        let status = record.apply_outcome(ScrapeOutcome::Extracted(ProductFields {
            price: Some("$120.00".to_string()),
            availability: Some("In Stock".to_string()),
            delivery_date: None,
            title: Some("Kettle".to_string()),
        }));

        assert_eq!(status, ItemStatus::Success);
        assert_eq!(record.current_price.as_deref(), Some("$120.00"));
        assert_eq!(record.price_change, Some(20.0));
        assert_eq!(record.price_change_percent, Some(20.0));
        assert_eq!(record.error_message, None);
    }

    #[test]
    fn failures_carry_distinct_messages() {
        let mut blocked = ResultRecord::pending(0, &request("u", None));
        let mut broken = ResultRecord::pending(1, &request("u", None));
        let mut offline = ResultRecord::pending(2, &request("u", None));

        assert_eq!(blocked.apply_outcome(ScrapeOutcome::Blocked), ItemStatus::Blocked);
        assert_eq!(
            broken.apply_outcome(ScrapeOutcome::StructureChanged),
            ItemStatus::Error
        );
        assert_eq!(
            offline.apply_outcome(ScrapeOutcome::TransportFailed("http status 503".into())),
            ItemStatus::Error
        );
        assert_eq!(blocked.error_message.as_deref(), Some("Request blocked - retry later"));
        assert_eq!(
            broken.error_message.as_deref(),
            Some("Product not found or page structure changed")
        );
        assert_eq!(offline.error_message.as_deref(), Some("Failed to fetch product data"));
    }

    #[test]
    fn progress_percent_rounds_and_handles_empty_batch() {
        assert_eq!(BatchStats::default().progress_percent(), 0);
        let stats = BatchStats {
            total: 3,
            processed: 1,
            ..BatchStats::default()
        };
        assert_eq!(stats.progress_percent(), 33);
    }
}
