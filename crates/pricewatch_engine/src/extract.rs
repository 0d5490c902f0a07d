use chrono::NaiveDate;
use pricewatch_core::{find_delivery_phrase, normalize_delivery_date, ProductFields, ScrapeOutcome};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

const CURRENCY_MARKERS: &[&str] = &["$", "£", "€", "Â£", "â‚¬"];

/// Ordered selector tables and block phrases; earlier entries win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorSet {
    pub block_phrases: Vec<String>,
    pub price: Vec<String>,
    pub availability: Vec<String>,
    pub delivery: Vec<String>,
    pub title: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            block_phrases: owned(&[
                "Robot Check",
                "Enter the characters you see below",
                "Sorry, we just need to make sure you're not a robot",
            ]),
            price: owned(&[
                ".a-price-whole",
                ".a-price .a-offscreen",
                "#price_inside_buybox",
                ".a-price-range",
                "#priceblock_dealprice",
                "#priceblock_ourprice",
                ".a-price.a-text-price.a-size-medium.apexPriceToPay .a-offscreen",
                ".a-price.a-text-price.a-size-medium.apexPriceToPay",
                ".a-price-symbol + .a-price-whole",
                "[data-a-price-amount]",
                ".a-price-symbol",
                "#apex_desktop .a-price .a-offscreen",
                ".a-price.a-text-price .a-offscreen",
            ]),
            availability: owned(&[
                "#availability span",
                "#availability .a-color-success",
                "#availability .a-color-state",
                ".a-color-success",
                ".a-color-state",
                "#availability .a-size-medium",
                "[data-feature-name=\"availability\"] .a-size-medium",
                "#availability .a-color-price",
                "#availability-brief",
                ".a-accordion-row-a11y[aria-label*=\"availability\"]",
            ]),
            delivery: owned(&[
                "#mir-layout-DELIVERY_BLOCK-slot-PRIMARY_DELIVERY_MESSAGE_LARGE span[data-csa-c-content-id]",
                "#deliveryBlockMessage span",
                "#delivery-block span",
                ".a-color-secondary.a-text-bold",
                "[data-feature-name=\"delivery\"] span",
                "#ddmMIRAsinTitle + div span",
                ".a-size-base.a-color-secondary",
            ]),
            title: owned(&["#productTitle", ".product-title", "h1.a-size-large", "h1 span"]),
        }
    }
}

/// Where the markup came from; only the availability length bound differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtractionProfile {
    /// A page rendered in the user's browser.
    LivePage,
    /// A document fetched by the batch pipeline.
    #[default]
    FetchedDocument,
}

impl ExtractionProfile {
    /// Exclusive upper bound on accepted availability text, in characters.
    pub fn availability_bound(self) -> usize {
        match self {
            Self::LivePage => 100,
            Self::FetchedDocument => 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("invalid {table} selector `{selector}`: {message}")]
    InvalidSelector {
        table: &'static str,
        selector: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageReport {
    pub blocked: bool,
    pub fields: ProductFields,
}

impl PageReport {
    pub fn into_outcome(self) -> ScrapeOutcome {
        if self.blocked {
            ScrapeOutcome::Blocked
        } else if self.fields.is_structurally_empty() {
            ScrapeOutcome::StructureChanged
        } else {
            ScrapeOutcome::Extracted(self.fields)
        }
    }
}

pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str, reference: NaiveDate) -> PageReport;
}

/// Table-driven extractor with selectors compiled once.
#[derive(Debug)]
pub struct ProductExtractor {
    block_phrases: Vec<String>,
    body: Selector,
    price: Vec<Selector>,
    availability: Vec<Selector>,
    delivery: Vec<Selector>,
    title: Vec<Selector>,
    profile: ExtractionProfile,
}

impl ProductExtractor {
    pub fn new(set: &SelectorSet, profile: ExtractionProfile) -> Result<Self, ExtractError> {
        Ok(Self {
            block_phrases: set.block_phrases.clone(),
            body: compile_one("body", "body")?,
            price: compile("price", &set.price)?,
            availability: compile("availability", &set.availability)?,
            delivery: compile("delivery", &set.delivery)?,
            title: compile("title", &set.title)?,
            profile,
        })
    }

    fn is_blocked(&self, doc: &Html) -> bool {
        let Some(body) = doc.select(&self.body).next() else {
            return false;
        };
        let text: String = body.text().collect();
        self.block_phrases
            .iter()
            .any(|phrase| text.contains(phrase.as_str()))
    }

    fn price(&self, doc: &Html) -> Option<String> {
        let candidates: Vec<String> = first_texts(doc, &self.price).collect();
        candidates
            .iter()
            .find(|text| CURRENCY_MARKERS.iter().any(|marker| text.contains(marker)))
            .or_else(|| candidates.last())
            .cloned()
    }

    fn availability(&self, doc: &Html) -> Option<String> {
        let bound = self.profile.availability_bound();
        first_texts(doc, &self.availability).find(|text| text.chars().count() < bound)
    }

    fn delivery_date(&self, doc: &Html, reference: NaiveDate) -> Option<NaiveDate> {
        first_texts(doc, &self.delivery).find_map(|text| {
            let phrase = find_delivery_phrase(&text)?;
            normalize_delivery_date(phrase, reference)
        })
    }

    fn title(&self, doc: &Html) -> Option<String> {
        first_texts(doc, &self.title).next()
    }
}

impl Extractor for ProductExtractor {
    fn extract(&self, html: &str, reference: NaiveDate) -> PageReport {
        let doc = Html::parse_document(html);
        if self.is_blocked(&doc) {
            return PageReport {
                blocked: true,
                fields: ProductFields::default(),
            };
        }
        PageReport {
            blocked: false,
            fields: ProductFields {
                price: self.price(&doc),
                availability: self.availability(&doc),
                delivery_date: self.delivery_date(&doc, reference),
                title: self.title(&doc),
            },
        }
    }
}

fn compile_one(table: &'static str, selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|err| ExtractError::InvalidSelector {
        table,
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

fn compile(table: &'static str, selectors: &[String]) -> Result<Vec<Selector>, ExtractError> {
    selectors
        .iter()
        .map(|selector| compile_one(table, selector))
        .collect()
}

/// Normalized, non-empty text of the first match of each selector, in order.
fn first_texts<'a>(doc: &'a Html, selectors: &'a [Selector]) -> impl Iterator<Item = String> + 'a {
    selectors
        .iter()
        .filter_map(|selector| doc.select(selector).next())
        .map(normalized_text)
        .filter(|text| !text.is_empty())
}

fn normalized_text(element: ElementRef<'_>) -> String {
    let text: String = element.text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
