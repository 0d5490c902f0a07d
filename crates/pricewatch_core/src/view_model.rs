use chrono::NaiveDate;

use crate::signals::{is_low_stock, is_out_of_stock, Signal, PRICE_INCREASE_PERCENT};
use crate::{BatchStats, EnhancedStats, InputMode, ItemStatus, Notice, RecordId, ResultRecord, SessionState};

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub session: SessionState,
    pub stats: BatchStats,
    pub enhanced: EnhancedStats,
    pub progress_percent: u8,
    pub rows: Vec<ResultRowView>,
    pub input_mode: InputMode,
    pub grid_rows: usize,
    pub notice: Option<Notice>,
    pub dirty: bool,
}

/// Direction of a price move, bucketed at the increase threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceTrend {
    Increase,
    Decrease,
    Flat,
}

impl PriceTrend {
    pub fn from_percent(percent: Option<f64>) -> Self {
        match percent {
            Some(p) if p >= PRICE_INCREASE_PERCENT => Self::Increase,
            Some(p) if p <= -PRICE_INCREASE_PERCENT => Self::Decrease,
            _ => Self::Flat,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
            Self::Flat => "no-change",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    InStock,
    OutOfStock,
    Limited,
    Unknown,
}

impl StockLevel {
    pub fn classify(availability: Option<&str>) -> Self {
        let Some(text) = availability.filter(|text| *text != NOT_AVAILABLE) else {
            return Self::Unknown;
        };
        if text.to_lowercase().contains("in stock") {
            Self::InStock
        } else if is_out_of_stock(Some(text)) {
            Self::OutOfStock
        } else if is_low_stock(Some(text)) {
            Self::Limited
        } else {
            Self::Unknown
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::InStock => "in-stock",
            Self::OutOfStock => "out-of-stock",
            Self::Limited => "limited",
            Self::Unknown => "na",
        }
    }
}

/// One rendered table row; every cell is already display text.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRowView {
    pub id: RecordId,
    /// 1-based row number.
    pub index: usize,
    pub url: String,
    pub your_price: String,
    pub current_price: String,
    pub price_change: String,
    pub price_trend: PriceTrend,
    pub availability: String,
    pub stock: StockLevel,
    pub delivery: String,
    pub status: ItemStatus,
    pub status_text: String,
    pub signals: Vec<Signal>,
}

impl ResultRowView {
    pub fn from_record(record: &ResultRecord, reference: NaiveDate) -> Self {
        let signals = if record.status == ItemStatus::Success {
            Signal::ALL
                .into_iter()
                .filter(|signal| signal.applies_to(record, reference))
                .collect()
        } else {
            Vec::new()
        };
        Self {
            id: record.id,
            index: record.id + 1,
            url: record.url.clone(),
            your_price: format_saved_price(record.saved_price),
            current_price: or_not_available(record.current_price.as_deref()),
            price_change: format_price_change(record.price_change, record.price_change_percent),
            price_trend: PriceTrend::from_percent(record.price_change_percent),
            availability: or_not_available(record.availability.as_deref()),
            stock: StockLevel::classify(record.availability.as_deref()),
            delivery: format_delivery(record.delivery_date, reference),
            status: record.status,
            status_text: status_text(record),
            signals,
        }
    }
}

pub fn or_not_available(value: Option<&str>) -> String {
    value
        .filter(|text| !text.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

/// `$29.99`, or `N/A` when no reference price was given.
pub fn format_saved_price(saved: Option<f64>) -> String {
    match saved {
        Some(price) if price != 0.0 => format!("${price:.2}"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// `↗ +$20.00 (+20.0%)` / `↘ -$5.00 (-5.0%)`; a zero or unknown change is `N/A`.
pub fn format_price_change(change: Option<f64>, percent: Option<f64>) -> String {
    match (change, percent) {
        (Some(change), Some(percent)) if change != 0.0 && percent != 0.0 => {
            if change > 0.0 {
                format!("↗ +${change:.2} (+{percent:.1}%)")
            } else {
                format!("↘ -${:.2} ({percent:.1}%)", change.abs())
            }
        }
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// `Jul 15 (14 days)` relative to the batch reference date.
pub fn format_delivery(date: Option<NaiveDate>, reference: NaiveDate) -> String {
    match date {
        Some(date) => {
            let days = (date - reference).num_days();
            format!("{} ({days} days)", date.format("%b %-d"))
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn status_text(record: &ResultRecord) -> String {
    match record.status {
        ItemStatus::Pending | ItemStatus::Processing | ItemStatus::Success | ItemStatus::Blocked => {
            record.status.to_string()
        }
        ItemStatus::Error => record
            .error_message
            .clone()
            .unwrap_or_else(|| record.status.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProductRequest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn price_change_formats_both_directions() {
        assert_eq!(format_price_change(Some(20.0), Some(20.0)), "↗ +$20.00 (+20.0%)");
        assert_eq!(format_price_change(Some(-5.0), Some(-5.0)), "↘ -$5.00 (-5.0%)");
        assert_eq!(format_price_change(Some(0.0), Some(0.0)), "N/A");
        assert_eq!(format_price_change(None, None), "N/A");
    }

    #[test]
    fn delivery_shows_short_date_and_distance() {
        let reference = date(2024, 7, 1);
        assert_eq!(format_delivery(Some(date(2024, 7, 15)), reference), "Jul 15 (14 days)");
        assert_eq!(format_delivery(None, reference), "N/A");
    }

    #[test]
    fn row_view_fills_missing_cells_with_not_available() {
        let request = ProductRequest {
            url: "https://www.amazon.com/dp/B000".to_string(),
            saved_price: None,
        };
        let record = ResultRecord::pending(2, &request);
        let row = ResultRowView::from_record(&record, date(2024, 7, 1));

        assert_eq!(row.index, 3);
        assert_eq!(row.your_price, "N/A");
        assert_eq!(row.current_price, "N/A");
        assert_eq!(row.availability, "N/A");
        assert_eq!(row.status_text, "Pending");
        assert!(row.signals.is_empty());
    }

    #[test]
    fn stock_level_prefers_in_stock_wording() {
        assert_eq!(StockLevel::classify(Some("In Stock")), StockLevel::InStock);
        assert_eq!(StockLevel::classify(Some("Currently unavailable.")), StockLevel::OutOfStock);
        assert_eq!(StockLevel::classify(Some("Only 3 left")), StockLevel::Limited);
        assert_eq!(StockLevel::classify(Some("N/A")), StockLevel::Unknown);
    }
}
