use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pricewatch_core::{ResultRecord, Snapshot};
use pricewatch_engine::{AtomicFileWriter, PersistError};
use pricewatch_logging::pw_debug;

pub const SNAPSHOT_FILENAME: &str = "price_checker_state.ron";
pub const LEGACY_RESULTS_FILENAME: &str = "results.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] ron::Error),
    #[error("failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("legacy results file: {0}")]
    Legacy(#[from] serde_json::Error),
}

/// Durable home of the single latest batch snapshot.
pub trait SnapshotStore: Send {
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
    fn load(&self) -> Result<Option<Snapshot>, StoreError>;
}

/// RON snapshot plus the legacy JSON results list, both in one directory.
#[derive(Debug, Clone)]
pub struct RonSnapshotStore {
    writer: AtomicFileWriter,
}

impl RonSnapshotStore {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(state_dir),
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.writer.dir().join(SNAPSHOT_FILENAME)
    }

    pub fn legacy_results_path(&self) -> PathBuf {
        self.writer.dir().join(LEGACY_RESULTS_FILENAME)
    }

    /// Result list written by older versions that had no snapshot file.
    pub fn load_legacy_results(&self) -> Result<Option<Vec<ResultRecord>>, StoreError> {
        let path = self.legacy_results_path();
        let Some(text) = read_optional(&path)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&text)?))
    }
}

impl SnapshotStore for RonSnapshotStore {
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(snapshot, pretty)?;
        let path = self.writer.write(SNAPSHOT_FILENAME, &content)?;

        let legacy = serde_json::to_string_pretty(&snapshot.results)?;
        self.writer.write(LEGACY_RESULTS_FILENAME, &legacy)?;
        pw_debug!(
            "Saved snapshot with {} results to {:?}",
            snapshot.results.len(),
            path
        );
        Ok(())
    }

    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let path = self.snapshot_path();
        let Some(text) = read_optional(&path)? else {
            return Ok(None);
        };
        let snapshot = ron::from_str(&text).map_err(|source| StoreError::Decode {
            path: path.clone(),
            source,
        })?;
        Ok(Some(snapshot))
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
