//! Price watch core: pure batch state machine, analyzers and view-model helpers.
mod delivery;
mod effect;
mod input;
mod msg;
mod price;
mod record;
mod signals;
mod snapshot;
mod state;
mod update;
mod view_model;

pub use delivery::{find_delivery_phrase, normalize_delivery_date};
pub use effect::Effect;
pub use input::{
    blank_grid, build_requests, canonicalize_product_url, is_product_url, parse_csv_import,
    paste_into_grid, requests_from_grid, requests_from_text, validate_batch_size, GridField,
    GridRow, InputMode, ValidationError, DEFAULT_GRID_ROWS, MAX_BATCH_SIZE,
};
pub use msg::Msg;
pub use price::{analyze_price_change, parse_price, PriceAnalysis};
pub use record::{
    BatchStats, EnhancedStats, ItemStatus, ProductFields, ProductRequest, RecordId, ResultRecord,
    ScrapeFailure, ScrapeOutcome,
};
pub use signals::{
    is_late_delivery, is_low_stock, is_out_of_stock, is_price_increase, Signal,
    LATE_DELIVERY_DAYS, LOW_STOCK_THRESHOLD, PRICE_INCREASE_PERCENT,
};
pub use snapshot::Snapshot;
pub use state::{AppState, InFlight, Notice, SessionState};
pub use update::update;
pub use view_model::{
    format_delivery, format_price_change, format_saved_price, or_not_available, status_text,
    AppViewModel, PriceTrend, ResultRowView, StockLevel, NOT_AVAILABLE,
};
