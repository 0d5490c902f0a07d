use std::sync::{mpsc, Arc};
use std::thread;

use chrono::NaiveDate;
use pricewatch_core::RecordId;
use pricewatch_logging::{pw_debug, pw_info};
use tokio_util::sync::CancellationToken;

use crate::pacing::PacingSettings;
use crate::scrape::ScrapePipeline;
use crate::EngineEvent;

enum EngineCommand {
    Scrape {
        id: RecordId,
        url: String,
        reference: NaiveDate,
    },
    Delay,
}

/// Receives engine events on the engine thread.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Single worker thread that runs commands strictly one at a time.
pub struct EngineHandle {
    cmd_tx: Option<mpsc::Sender<EngineCommand>>,
    shutdown: CancellationToken,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn spawn(
        pipeline: ScrapePipeline,
        pacing: PacingSettings,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Runtime::new()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let worker = thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                if token.is_cancelled() {
                    break;
                }
                runtime.block_on(handle_command(&pipeline, &pacing, &token, sink.as_ref(), command));
            }
            pw_debug!("Engine worker stopped");
        });

        Ok(Self {
            cmd_tx: Some(cmd_tx),
            shutdown,
            worker: Some(worker),
        })
    }

    pub fn scrape(&self, id: RecordId, url: impl Into<String>, reference: NaiveDate) {
        self.send(EngineCommand::Scrape {
            id,
            url: url.into(),
            reference,
        });
    }

    pub fn delay(&self) {
        self.send(EngineCommand::Delay);
    }

    fn send(&self, command: EngineCommand) {
        if let Some(tx) = &self.cmd_tx {
            let _ = tx.send(command);
        }
    }

    /// Interrupts a pending delay, lets a running fetch finish, then joins the worker.
    pub fn shutdown(&mut self) {
        self.shutdown.cancel();
        self.cmd_tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn handle_command(
    pipeline: &ScrapePipeline,
    pacing: &PacingSettings,
    token: &CancellationToken,
    sink: &dyn EventSink,
    command: EngineCommand,
) {
    match command {
        EngineCommand::Scrape { id, url, reference } => {
            pw_info!("Scraping record {} {}", id, url);
            let outcome = pipeline.scrape(&url, reference).await;
            sink.emit(EngineEvent::ScrapeCompleted { id, outcome });
        }
        EngineCommand::Delay => {
            let delay = pacing.next_delay();
            pw_debug!("Waiting {} ms before the next request", delay.as_millis());
            tokio::select! {
                _ = tokio::time::sleep(delay) => sink.emit(EngineEvent::DelayElapsed),
                _ = token.cancelled() => pw_debug!("Delay interrupted by shutdown"),
            }
        }
    }
}
