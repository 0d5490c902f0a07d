//! User input: URL lists, the two-column grid and CSV imports.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::price::parse_price;
use crate::record::ProductRequest;

/// Largest batch accepted by a single start.
pub const MAX_BATCH_SIZE: usize = 1000;
/// Rows shown in a fresh grid.
pub const DEFAULT_GRID_ROWS: usize = 5;

const MARKETPLACE_DOMAINS: &[&str] = &[
    "amazon.com",
    "amazon.co.uk",
    "amazon.de",
    "amazon.fr",
    "amazon.it",
    "amazon.es",
    "amazon.ca",
    "amazon.com.au",
];

const PRODUCT_PATH_SEGMENTS: &[&str] = &["/dp/", "/gp/product/"];

static CELL_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t| {2,}").expect("cell separator pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("No valid Amazon URLs found. Please check your input.")]
    NoValidUrls,
    #[error("Maximum 1,000 URLs allowed. Please reduce your list.")]
    TooManyUrls { count: usize },
    #[error("No valid Amazon URLs found in CSV file")]
    NoValidCsvRows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    #[default]
    Simple,
    Spreadsheet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridField {
    Url,
    Price,
}

/// One spreadsheet row as typed; prices are parsed only when a batch starts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridRow {
    pub url: String,
    pub price: String,
}

impl GridRow {
    pub fn new(url: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            price: price.into(),
        }
    }

    fn set(&mut self, field: GridField, value: String) {
        match field {
            GridField::Url => self.url = value,
            GridField::Price => self.price = value,
        }
    }
}

pub fn blank_grid() -> Vec<GridRow> {
    vec![GridRow::default(); DEFAULT_GRID_ROWS]
}

fn parse_product_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.to_ascii_lowercase();
    let on_marketplace = MARKETPLACE_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")));
    let is_product_page = PRODUCT_PATH_SEGMENTS
        .iter()
        .any(|segment| url.path().contains(segment));
    (on_marketplace && is_product_page).then_some(url)
}

pub fn is_product_url(raw: &str) -> bool {
    parse_product_url(raw).is_some()
}

/// `scheme://host/path` of a valid product URL; query, fragment and port are dropped.
pub fn canonicalize_product_url(raw: &str) -> Option<String> {
    let url = parse_product_url(raw)?;
    let host = url.host_str()?;
    Some(format!("{}://{}{}", url.scheme(), host, url.path()))
}

/// Newline-delimited URLs; invalid lines are skipped silently.
pub fn requests_from_text(text: &str) -> Vec<ProductRequest> {
    text.lines()
        .filter_map(canonicalize_product_url)
        .map(|url| ProductRequest {
            url,
            saved_price: None,
        })
        .collect()
}

pub fn requests_from_grid(rows: &[GridRow]) -> Vec<ProductRequest> {
    rows.iter()
        .filter_map(|row| {
            let url = canonicalize_product_url(&row.url)?;
            Some(ProductRequest {
                url,
                saved_price: parse_price(&row.price),
            })
        })
        .collect()
}

/// Requests for the active mode, bounded to `1..=MAX_BATCH_SIZE`.
pub fn build_requests(
    mode: InputMode,
    text: &str,
    grid: &[GridRow],
) -> Result<Vec<ProductRequest>, ValidationError> {
    let requests = match mode {
        InputMode::Simple => requests_from_text(text),
        InputMode::Spreadsheet => requests_from_grid(grid),
    };
    validate_batch_size(requests)
}

pub fn validate_batch_size(
    requests: Vec<ProductRequest>,
) -> Result<Vec<ProductRequest>, ValidationError> {
    match requests.len() {
        0 => Err(ValidationError::NoValidUrls),
        count if count > MAX_BATCH_SIZE => Err(ValidationError::TooManyUrls { count }),
        _ => Ok(requests),
    }
}

/// Pastes copied spreadsheet cells into the grid starting at `start_row`.
///
/// Cells are split on a tab or a run of two or more spaces. A single cell
/// lands in `field`; two or more cells fill url and price. Returns the number
/// of rows written; a `start_row` past the end of the grid writes nothing.
pub fn paste_into_grid(
    grid: &mut Vec<GridRow>,
    start_row: usize,
    field: GridField,
    pasted: &str,
) -> usize {
    if start_row > grid.len() {
        return 0;
    }
    let rows: Vec<Vec<String>> = pasted
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            CELL_SEPARATOR
                .split(line)
                .map(|cell| cell.trim().to_string())
                .collect()
        })
        .collect();

    let required = start_row + rows.len();
    if grid.len() < required {
        grid.resize(required, GridRow::default());
    }

    for (offset, cells) in rows.iter().enumerate() {
        let row = &mut grid[start_row + offset];
        match cells.as_slice() {
            [single] => row.set(field, single.clone()),
            [url, price, ..] => {
                row.url = url.clone();
                row.price = price.clone();
            }
            [] => {}
        }
    }
    rows.len()
}

/// Two-column CSV (url, price) with a header row; rows without a valid
/// product URL are dropped, as are rows the reader cannot parse.
pub fn parse_csv_import(text: &str) -> Result<Vec<GridRow>, ValidationError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let rows: Vec<GridRow> = reader
        .records()
        .filter_map(Result::ok)
        .filter_map(|record| {
            let url = record.get(0)?;
            let price = record.get(1).unwrap_or_default();
            is_product_url(url).then(|| GridRow::new(url, price))
        })
        .collect();

    if rows.is_empty() {
        Err(ValidationError::NoValidCsvRows)
    } else {
        Ok(rows)
    }
}
