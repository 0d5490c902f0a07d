use serde::{Deserialize, Serialize};

use crate::input::{GridRow, InputMode};
use crate::record::{BatchStats, EnhancedStats, ProductRequest, ResultRecord};

/// Everything needed to rebuild a batch after the process goes away.
///
/// Each save supersedes the previous one; snapshots are never merged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub results: Vec<ResultRecord>,
    pub stats: BatchStats,
    pub enhanced_stats: EnhancedStats,
    pub is_processing: bool,
    pub input_mode: InputMode,
    pub input_text: String,
    pub spreadsheet_data: Vec<GridRow>,
    /// Requests whose record is still pending or was in flight.
    pub pending_urls: Vec<ProductRequest>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}
