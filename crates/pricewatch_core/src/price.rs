use std::sync::LazyLock;

use regex::Regex;

static NUMERIC_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9.,]+").expect("numeric run pattern is valid"));

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceAnalysis {
    /// Display string exactly as scraped.
    pub current_price: Option<String>,
    pub price_change: Option<f64>,
    pub price_change_percent: Option<f64>,
}

/// Reads the first run of digits, dots and commas out of a price string.
///
/// Commas are thousands separators and are dropped; anything after a second
/// dot is ignored.
pub fn parse_price(display: &str) -> Option<f64> {
    let run = NUMERIC_RUN.find(display)?.as_str().replace(',', "");
    let number = match run.match_indices('.').nth(1) {
        Some((second_dot, _)) => &run[..second_dot],
        None => run.as_str(),
    };
    number.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Compares a saved reference price with a freshly scraped display price.
///
/// A saved price of zero has no meaningful percentage and yields no change.
pub fn analyze_price_change(saved: Option<f64>, current: Option<&str>) -> PriceAnalysis {
    let current_price = current.map(str::to_string);
    let parsed = current.and_then(parse_price);

    match (saved, parsed) {
        (Some(saved), Some(now)) if saved != 0.0 => {
            let change = now - saved;
            PriceAnalysis {
                current_price,
                price_change: Some(change),
                price_change_percent: Some(change * 100.0 / saved),
            }
        }
        _ => PriceAnalysis {
            current_price,
            price_change: None,
            price_change_percent: None,
        },
    }
}
