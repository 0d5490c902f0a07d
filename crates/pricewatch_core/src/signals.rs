//! Pure predicates behind the enhanced statistics and row highlighting.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::record::ResultRecord;

/// Stock level below which a counted quantity is "low".
pub const LOW_STOCK_THRESHOLD: u32 = 20;
/// Deliveries further out than this many days are late.
pub const LATE_DELIVERY_DAYS: i64 = 10;
/// Percentage increase at or above which a price rise is flagged.
pub const PRICE_INCREASE_PERCENT: f64 = 15.0;

const OUT_OF_STOCK_PHRASES: &[&str] = &[
    "unavailable",
    "out of stock",
    "currently unavailable",
    "not available",
];

static STOCK_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*(left|remaining|in stock)").expect("stock count pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    OutOfStock,
    LowStock,
    LateDelivery,
    PriceIncreased,
}

impl Signal {
    pub const ALL: [Signal; 4] = [
        Signal::OutOfStock,
        Signal::LateDelivery,
        Signal::PriceIncreased,
        Signal::LowStock,
    ];

    pub fn applies_to(self, record: &ResultRecord, reference: NaiveDate) -> bool {
        match self {
            Signal::OutOfStock => is_out_of_stock(record.availability.as_deref()),
            Signal::LowStock => is_low_stock(record.availability.as_deref()),
            Signal::LateDelivery => is_late_delivery(record.delivery_date, reference),
            Signal::PriceIncreased => is_price_increase(record.price_change_percent),
        }
    }
}

fn known_text(text: Option<&str>) -> Option<String> {
    text.filter(|t| !t.is_empty() && *t != "N/A")
        .map(str::to_lowercase)
}

pub fn is_out_of_stock(availability: Option<&str>) -> bool {
    let Some(lower) = known_text(availability) else {
        return false;
    };
    OUT_OF_STOCK_PHRASES
        .iter()
        .any(|phrase| lower.contains(phrase))
}

/// "Only 5 left in stock" and "3 remaining" are low; "25 left in stock" is not.
pub fn is_low_stock(availability: Option<&str>) -> bool {
    let Some(lower) = known_text(availability) else {
        return false;
    };
    if let Some(captures) = STOCK_COUNT.captures(&lower) {
        // A count too large for u32 is certainly not low.
        return captures[1]
            .parse::<u32>()
            .map(|quantity| quantity < LOW_STOCK_THRESHOLD)
            .unwrap_or(false);
    }
    lower.contains("only") && (lower.contains("left") || lower.contains("remaining"))
}

pub fn is_late_delivery(delivery_date: Option<NaiveDate>, reference: NaiveDate) -> bool {
    delivery_date
        .map(|date| (date - reference).num_days() > LATE_DELIVERY_DAYS)
        .unwrap_or(false)
}

pub fn is_price_increase(price_change_percent: Option<f64>) -> bool {
    price_change_percent.is_some_and(|percent| percent >= PRICE_INCREASE_PERCENT)
}
