//! Shutdown fan-out to every listener.

use tokio::sync::broadcast;

/// One trigger, many listeners. Subscribe before triggering; a late
/// subscriber misses the signal.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        let notified = self.tx.send(()).unwrap_or(0);
        tracing::info!(listeners = notified, "Shutdown triggered");
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
