use chrono::NaiveDate;

use crate::input::{blank_grid, build_requests, GridField, GridRow, InputMode, ValidationError};
use crate::record::{
    BatchStats, EnhancedStats, ItemStatus, ProductRequest, RecordId, ResultRecord, ScrapeOutcome,
};
use crate::signals::Signal;
use crate::snapshot::Snapshot;
use crate::view_model::{AppViewModel, ResultRowView};
use crate::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
}

/// The single suspension point the batch is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InFlight {
    #[default]
    Nothing,
    Scrape(RecordId),
    Delay,
}

/// User-facing banner shown above the input area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    session: SessionState,
    in_flight: InFlight,
    records: Vec<ResultRecord>,
    stats: BatchStats,
    enhanced: EnhancedStats,
    reference_date: NaiveDate,
    input_mode: InputMode,
    input_text: String,
    grid: Vec<GridRow>,
    notice: Option<Notice>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            session: SessionState::Idle,
            in_flight: InFlight::Nothing,
            records: Vec::new(),
            stats: BatchStats::default(),
            enhanced: EnhancedStats::default(),
            reference_date: NaiveDate::default(),
            input_mode: InputMode::Simple,
            input_text: String::new(),
            grid: blank_grid(),
            notice: None,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn in_flight(&self) -> InFlight {
        self.in_flight
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    pub fn enhanced_stats(&self) -> EnhancedStats {
        self.enhanced
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn grid(&self) -> &[GridRow] {
        &self.grid
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        self.session == SessionState::Running
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Ids of successful records a stat card should highlight.
    pub fn matching(&self, signal: Signal) -> Vec<RecordId> {
        self.records
            .iter()
            .filter(|record| record.status == ItemStatus::Success)
            .filter(|record| signal.applies_to(record, self.reference_date))
            .map(|record| record.id)
            .collect()
    }

    pub fn pending_requests(&self) -> Vec<ProductRequest> {
        self.records
            .iter()
            .filter(|record| matches!(record.status, ItemStatus::Pending | ItemStatus::Processing))
            .map(ResultRecord::request)
            .collect()
    }

    pub fn snapshot(&self, timestamp: i64) -> Snapshot {
        Snapshot {
            results: self.records.clone(),
            stats: self.stats,
            enhanced_stats: self.enhanced,
            is_processing: self.is_processing(),
            input_mode: self.input_mode,
            input_text: self.input_text.clone(),
            spreadsheet_data: self.grid.clone(),
            pending_urls: self.pending_requests(),
            timestamp,
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            session: self.session,
            stats: self.stats,
            enhanced: self.enhanced,
            progress_percent: self.stats.progress_percent(),
            rows: self
                .records
                .iter()
                .map(|record| ResultRowView::from_record(record, self.reference_date))
                .collect(),
            input_mode: self.input_mode,
            grid_rows: self.grid.len(),
            notice: self.notice.clone(),
            dirty: self.dirty,
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.mark_dirty();
    }

    pub(crate) fn set_input_text(&mut self, text: String) {
        if self.input_text != text {
            self.input_text = text;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_input_mode(&mut self, mode: InputMode) {
        self.input_mode = mode;
        self.mark_dirty();
    }

    pub(crate) fn grid_mut(&mut self) -> &mut Vec<GridRow> {
        self.mark_dirty();
        &mut self.grid
    }

    pub(crate) fn replace_grid(&mut self, rows: Vec<GridRow>) {
        self.grid = if rows.is_empty() { blank_grid() } else { rows };
        self.mark_dirty();
    }

    pub(crate) fn edit_grid_cell(&mut self, row: usize, field: GridField, value: String) -> bool {
        let Some(cell_row) = self.grid.get_mut(row) else {
            return false;
        };
        match field {
            GridField::Url => cell_row.url = value,
            GridField::Price => cell_row.price = value,
        }
        self.mark_dirty();
        true
    }

    pub(crate) fn collect_requests(&self) -> Result<Vec<ProductRequest>, ValidationError> {
        build_requests(self.input_mode, &self.input_text, &self.grid)
    }

    /// Replaces any previous batch with fresh `Pending` records.
    pub(crate) fn start_batch(&mut self, requests: Vec<ProductRequest>, today: NaiveDate) {
        self.records = requests
            .iter()
            .enumerate()
            .map(|(id, request)| ResultRecord::pending(id, request))
            .collect();
        self.stats = BatchStats::for_batch(self.records.len());
        self.enhanced = EnhancedStats::default();
        self.reference_date = today;
        self.in_flight = InFlight::Nothing;
        self.session = SessionState::Running;
        self.mark_dirty();
    }

    pub(crate) fn pause(&mut self) -> bool {
        if self.session != SessionState::Running {
            return false;
        }
        self.session = SessionState::Paused;
        self.mark_dirty();
        true
    }

    pub(crate) fn resume(&mut self) -> bool {
        if self.session != SessionState::Paused {
            return false;
        }
        self.session = SessionState::Running;
        self.mark_dirty();
        true
    }

    /// Starts the next pending record, or completes the batch when none remain.
    pub(crate) fn advance(&mut self) -> Option<Effect> {
        debug_assert_eq!(self.in_flight, InFlight::Nothing);
        self.mark_dirty();
        let Some(record) = self
            .records
            .iter_mut()
            .find(|record| record.status == ItemStatus::Pending)
        else {
            self.session = SessionState::Completed;
            return None;
        };
        record.status = ItemStatus::Processing;
        record.error_message = None;
        self.in_flight = InFlight::Scrape(record.id);
        Some(Effect::Scrape {
            id: record.id,
            url: record.url.clone(),
            reference: self.reference_date,
        })
    }

    /// Records a finished step. Returns `false` for a stale or unknown id.
    pub(crate) fn finish_step(&mut self, id: RecordId, outcome: ScrapeOutcome) -> bool {
        if self.in_flight != InFlight::Scrape(id) {
            return false;
        }
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        if record.status != ItemStatus::Processing {
            return false;
        }
        let status = record.apply_outcome(outcome);
        self.stats.record(status);
        self.enhanced = EnhancedStats::recompute(&self.records, self.reference_date);
        self.in_flight = InFlight::Nothing;
        self.mark_dirty();
        true
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.records
            .iter()
            .any(|record| record.status == ItemStatus::Pending)
    }

    pub(crate) fn wait_for_delay(&mut self) {
        self.in_flight = InFlight::Delay;
    }

    /// Clears an elapsed delay; `false` if no delay was outstanding.
    pub(crate) fn finish_delay(&mut self) -> bool {
        if self.in_flight != InFlight::Delay {
            return false;
        }
        self.in_flight = InFlight::Nothing;
        true
    }

    /// Rebuilds state from a persisted snapshot.
    ///
    /// Records caught mid-step are requeued as `Pending`: their result never
    /// reached the snapshot.
    pub(crate) fn restore(&mut self, snapshot: Snapshot, today: NaiveDate) {
        let Snapshot {
            results,
            stats,
            is_processing,
            input_mode,
            input_text,
            spreadsheet_data,
            ..
        } = snapshot;

        self.records = results
            .into_iter()
            .enumerate()
            .map(|(id, mut record)| {
                record.id = id;
                if record.status == ItemStatus::Processing {
                    record.status = ItemStatus::Pending;
                }
                record
            })
            .collect();
        self.stats = stats;
        self.reference_date = today;
        self.enhanced = EnhancedStats::recompute(&self.records, today);
        self.input_mode = input_mode;
        self.input_text = input_text;
        self.replace_grid(spreadsheet_data);
        self.in_flight = InFlight::Nothing;
        self.session = if self.records.is_empty() {
            SessionState::Idle
        } else if is_processing {
            SessionState::Running
        } else if self.has_pending() {
            SessionState::Paused
        } else {
            SessionState::Completed
        };
        self.mark_dirty();
    }
}
