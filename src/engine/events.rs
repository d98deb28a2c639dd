use tokio::sync::broadcast;

use super::types::{Metric, SessionEvent, Stage};

const EVENT_CAPACITY: usize = 1024;

/// Multi-subscriber fan-out of session events.
///
/// Every observer gets its own receiver. Emitting with nobody subscribed is
/// fine; a receiver that falls behind sees `Lagged` and skips ahead.
#[derive(Debug, Clone)]
pub struct Events {
    tx: broadcast::Sender<SessionEvent>,
}

impl Default for Events {
    fn default() -> Self {
        Self::new()
    }
}

impl Events {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    pub fn stage(&self, stage: Stage) {
        self.emit(SessionEvent::StageChanged(stage));
    }

    pub fn progress(&self, percent: f64, stage: Stage) {
        self.emit(SessionEvent::Progress {
            percent: percent.clamp(0.0, 100.0),
            stage,
        });
    }

    pub fn realtime(&self, metric: Metric, value: f64) {
        self.emit(SessionEvent::Realtime { metric, value });
    }
}
