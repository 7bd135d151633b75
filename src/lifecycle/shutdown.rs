//! Shutdown signal for the supervisor.

use tokio::sync::oneshot;

/// Create a connected trigger/signal pair.
pub fn channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = oneshot::channel();
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

/// Sending half. Firing consumes it, so shutdown is requested at most once.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: oneshot::Sender<()>,
}

impl ShutdownTrigger {
    /// Request shutdown.
    pub fn fire(self) {
        // Receiver gone means the supervisor already returned.
        let _ = self.tx.send(());
    }
}

/// Receiving half, consumed by the supervisor.
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: oneshot::Receiver<()>,
}

impl ShutdownSignal {
    /// Resolve once shutdown is requested.
    ///
    /// A trigger dropped without firing never resolves.
    pub async fn recv(self) {
        if self.rx.await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn fired_trigger_resolves_signal() {
        let (trigger, signal) = channel();
        trigger.fire();
        tokio::time::timeout(Duration::from_secs(1), signal.recv())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn dropped_trigger_never_resolves() {
        let (trigger, signal) = channel();
        drop(trigger);
        assert!(tokio::time::timeout(Duration::from_millis(50), signal.recv())
            .await
            .is_err());
    }
}
