use chrono::NaiveDate;

use crate::RecordId;

/// Side effects requested by `update`; the host executes them in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch and extract one product page, then report `Msg::ScrapeFinished`.
    Scrape {
        id: RecordId,
        url: String,
        reference: NaiveDate,
    },
    /// Wait a jittered interval, then report `Msg::DelayElapsed`.
    Delay,
    /// Save `AppState::snapshot` through the persistence gateway.
    Persist,
}
