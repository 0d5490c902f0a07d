use chrono::NaiveDate;

use crate::{GridField, InputMode, RecordId, ScrapeOutcome, Snapshot};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User edited the simple-mode URL list.
    InputChanged(String),
    /// User switched between the URL list and the grid.
    InputModeSelected(InputMode),
    GridCellEdited {
        row: usize,
        field: GridField,
        value: String,
    },
    /// Clipboard text pasted into the grid at a given cell.
    GridPasted {
        start_row: usize,
        field: GridField,
        text: String,
    },
    GridRowAdded,
    GridRowDeleted(usize),
    GridCleared,
    /// Raw contents of an imported two-column CSV file.
    CsvImported(String),
    /// User asked to start a new batch; `today` anchors delivery dates.
    StartClicked { today: NaiveDate },
    PauseClicked,
    ResumeClicked,
    /// Engine finished fetching and extracting one record.
    ScrapeFinished { id: RecordId, outcome: ScrapeOutcome },
    /// Engine finished the inter-request delay.
    DelayElapsed,
    /// Periodic timer while the batch is running.
    AutosaveTick,
    /// Restore the batch persisted by a previous process.
    RestoreSnapshot {
        snapshot: Box<Snapshot>,
        today: NaiveDate,
    },
    /// Fallback for placeholder wiring.
    NoOp,
}
