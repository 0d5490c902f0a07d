use std::sync::mpsc;

use chrono::Utc;
use pricewatch_core::{AppState, Effect, Msg};
use pricewatch_engine::{EngineEvent, EngineHandle, EventSink};
use pricewatch_logging::{pw_debug, pw_error};

use super::persistence::SnapshotStore;

/// Everything the dispatch loop reacts to.
#[derive(Debug)]
pub enum AppEvent {
    Msg(Msg),
    Quit,
}

/// Forwards engine reports into the dispatch loop as messages.
pub struct MsgSink {
    tx: mpsc::Sender<AppEvent>,
}

impl MsgSink {
    pub fn new(tx: mpsc::Sender<AppEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        let msg = match event {
            EngineEvent::ScrapeCompleted { id, outcome } => Msg::ScrapeFinished { id, outcome },
            EngineEvent::DelayElapsed => Msg::DelayElapsed,
        };
        let _ = self.tx.send(AppEvent::Msg(msg));
    }
}

/// Executes effects returned by `update` against the engine and the store.
pub struct EffectRunner {
    engine: EngineHandle,
    store: Box<dyn SnapshotStore>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, store: Box<dyn SnapshotStore>) -> Self {
        Self { engine, store }
    }

    pub fn run(&self, effects: Vec<Effect>, state: &AppState) {
        for effect in effects {
            match effect {
                Effect::Scrape { id, url, reference } => {
                    pw_debug!("Scrape record {} url={}", id, url);
                    self.engine.scrape(id, url, reference);
                }
                Effect::Delay => self.engine.delay(),
                Effect::Persist => self.persist(state),
            }
        }
    }

    /// Saves the current snapshot; failures are logged and the batch goes on.
    pub fn persist(&self, state: &AppState) {
        let snapshot = state.snapshot(Utc::now().timestamp_millis());
        if let Err(err) = self.store.save(&snapshot) {
            pw_error!("Failed to save snapshot: {}", err);
        }
    }

    pub fn shutdown(&mut self) {
        self.engine.shutdown();
    }
}
