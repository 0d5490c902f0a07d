use std::io::BufRead;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use pricewatch_core::{
    update, AppState, BatchStats, InputMode, ItemStatus, Msg, ResultRecord, SessionState, Snapshot,
};
use pricewatch_engine::{EngineHandle, ScrapePipeline};
use pricewatch_logging::{pw_info, pw_warn};

use super::config::AppConfig;
use super::effects::{AppEvent, EffectRunner, MsgSink};
use super::persistence::{RonSnapshotStore, SnapshotStore};
use super::render;

const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(5);

/// Where a `run` gets its batch from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchSource {
    /// Newline-delimited URLs.
    UrlList(String),
    /// Two-column CSV of url and reference price.
    Csv(String),
    /// Continue the batch saved in the state directory.
    Resume,
}

/// Runs a batch to completion, or until the user quits, and returns the final state.
pub fn run_batch(
    config: &AppConfig,
    source: BatchSource,
    today: NaiveDate,
) -> anyhow::Result<AppState> {
    let store = RonSnapshotStore::new(config.state_dir.clone());
    let startup = startup_messages(&store, source, today)?;

    let (tx, rx) = mpsc::channel();
    let pipeline = ScrapePipeline::from_settings(config.fetch.to_settings(), &config.selectors)
        .context("invalid selector configuration")?;
    let engine = EngineHandle::spawn(
        pipeline,
        config.pacing.to_settings()?,
        Arc::new(MsgSink::new(tx.clone())),
    )?;

    let mut dispatcher = Dispatcher::new(EffectRunner::new(engine, Box::new(store)));
    for msg in startup {
        dispatcher.dispatch(msg);
    }

    if dispatcher.state.is_processing() {
        spawn_autosave(tx.clone());
        spawn_stdin_commands(tx);
        println!("Commands: p = pause, r = resume, q = quit");
        dispatcher.event_loop(&rx);
    } else if dispatcher.state.session() == SessionState::Idle {
        dispatcher.runner.shutdown();
        bail!("batch did not start");
    }

    dispatcher.runner.shutdown();
    Ok(dispatcher.state)
}

fn startup_messages(
    store: &RonSnapshotStore,
    source: BatchSource,
    today: NaiveDate,
) -> anyhow::Result<Vec<Msg>> {
    let messages = match source {
        BatchSource::UrlList(text) => vec![Msg::InputChanged(text), Msg::StartClicked { today }],
        BatchSource::Csv(text) => vec![
            Msg::InputModeSelected(InputMode::Spreadsheet),
            Msg::CsvImported(text),
            Msg::StartClicked { today },
        ],
        BatchSource::Resume => {
            let Some(snapshot) = store.load().context("failed to load saved batch")? else {
                bail!("no saved batch in {:?}", store.snapshot_path());
            };
            vec![
                Msg::RestoreSnapshot {
                    snapshot: Box::new(snapshot),
                    today,
                },
                // Ignored unless the restored batch is paused.
                Msg::ResumeClicked,
            ]
        }
    };
    Ok(messages)
}

/// Restores the saved batch without running anything.
pub fn load_saved_state(config: &AppConfig, today: NaiveDate) -> anyhow::Result<AppState> {
    let store = RonSnapshotStore::new(config.state_dir.clone());
    let Some(snapshot) = store.load().context("failed to load saved batch")? else {
        if let Some(results) = store.load_legacy_results()? {
            pw_warn!("Only a legacy results file was found; statistics are recomputed");
            return Ok(restore_results(results, today));
        }
        bail!("no saved batch in {:?}", store.snapshot_path());
    };
    let (state, _) = update(
        AppState::new(),
        Msg::RestoreSnapshot {
            snapshot: Box::new(snapshot),
            today,
        },
    );
    Ok(state)
}

fn restore_results(results: Vec<ResultRecord>, today: NaiveDate) -> AppState {
    let mut stats = BatchStats::for_batch(results.len());
    for record in &results {
        match record.status {
            ItemStatus::Success => stats.success += 1,
            ItemStatus::Blocked => stats.blocked += 1,
            ItemStatus::Error => stats.failed += 1,
            _ => continue,
        }
        stats.processed += 1;
    }
    let snapshot = Snapshot {
        results,
        stats,
        ..Snapshot::default()
    };
    let (state, _) = update(
        AppState::new(),
        Msg::RestoreSnapshot {
            snapshot: Box::new(snapshot),
            today,
        },
    );
    state
}

struct Dispatcher {
    state: AppState,
    runner: EffectRunner,
}

impl Dispatcher {
    fn new(runner: EffectRunner) -> Self {
        Self {
            state: AppState::new(),
            runner,
        }
    }

    fn event_loop(&mut self, rx: &mpsc::Receiver<AppEvent>) {
        while let Ok(event) = rx.recv() {
            match event {
                AppEvent::Msg(msg) => self.dispatch(msg),
                AppEvent::Quit => {
                    pw_info!("Quit requested; saving batch for --resume");
                    self.runner.persist(&self.state);
                    break;
                }
            }
            if self.state.session() == SessionState::Completed {
                break;
            }
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let finished = match &msg {
            Msg::ScrapeFinished { id, .. } => Some(*id),
            _ => None,
        };
        let previous_notice = self.state.notice().cloned();
        let previous_session = self.state.session();

        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.run(effects, &self.state);

        if !self.state.consume_dirty() {
            return;
        }
        let view = self.state.view();
        if let Some(notice) = view.notice.as_ref().filter(|n| Some(*n) != previous_notice.as_ref()) {
            println!("{}", render::notice_line(notice));
        }
        if let Some(row) = finished.and_then(|id| view.rows.get(id)) {
            println!("{}", render::progress_line(&view, row));
        }
        if view.session != previous_session {
            pw_info!("Session is now {}", render::session_label(view.session));
            if matches!(view.session, SessionState::Paused | SessionState::Completed) {
                println!("Batch {}", render::session_label(view.session));
            }
        }
    }
}

fn spawn_autosave(tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        thread::sleep(AUTOSAVE_INTERVAL);
        if tx.send(AppEvent::Msg(Msg::AutosaveTick)).is_err() {
            break;
        }
    });
}

fn spawn_stdin_commands(tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let event = match line.trim() {
                "p" | "pause" => AppEvent::Msg(Msg::PauseClicked),
                "r" | "resume" => AppEvent::Msg(Msg::ResumeClicked),
                "q" | "quit" => AppEvent::Quit,
                "" => continue,
                other => {
                    eprintln!("Unknown command {other:?}; use p, r or q");
                    continue;
                }
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricewatch_core::ProductRequest;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    fn record(id: usize, status: ItemStatus) -> ResultRecord {
        let request = ProductRequest {
            url: format!("https://www.amazon.com/dp/B00000000{id}"),
            saved_price: None,
        };
        ResultRecord {
            status,
            ..ResultRecord::pending(id, &request)
        }
    }

    #[test]
    fn csv_source_switches_to_spreadsheet_before_import() {
        let dir = tempfile::tempdir().unwrap();
        let store = RonSnapshotStore::new(dir.path().to_path_buf());
        let messages =
            startup_messages(&store, BatchSource::Csv("url,price".to_string()), today()).unwrap();
        assert_eq!(
            messages,
            vec![
                Msg::InputModeSelected(InputMode::Spreadsheet),
                Msg::CsvImported("url,price".to_string()),
                Msg::StartClicked { today: today() },
            ]
        );
    }

    #[test]
    fn resume_without_saved_batch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = RonSnapshotStore::new(dir.path().to_path_buf());
        assert!(startup_messages(&store, BatchSource::Resume, today()).is_err());
    }

    #[test]
    fn legacy_results_rebuild_counters() {
        let results = vec![
            record(0, ItemStatus::Success),
            record(1, ItemStatus::Error),
            record(2, ItemStatus::Blocked),
        ];
        let state = restore_results(results, today());
        let stats = state.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.processed, 3);
        assert_eq!((stats.success, stats.failed, stats.blocked), (1, 1, 1));
        assert_eq!(state.session(), SessionState::Completed);
    }
}
