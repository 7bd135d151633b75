//! Process supervisor.
//!
//! Drives `Starting → Serving → ShuttingDown → Stopped`, or `Failed`
//! from any state, and publishes each transition on a watch channel.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::config::ServiceConfig;
use crate::db::{DriverError, GatewayError, NoteGateway};
use crate::http::{app_router, health_router};
use crate::net::{Endpoint, ListenerError, ListenerKind, ListenerSet, Routers, StopOutcome};
use crate::observability::metrics;

use super::shutdown::ShutdownSignal;

/// Top-level failure of the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("storage driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("database connection failed: {0}")]
    Connection(#[from] GatewayError),

    #[error("listener failure: {0}")]
    Listener(#[from] ListenerError),
}

/// Observable lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    /// Every listener is accepting on these addresses.
    Serving(Vec<Endpoint>),
    ShuttingDown,
    Stopped,
    Failed,
}

impl LifecycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Stopped | LifecycleState::Failed)
    }

    /// Bound address of a listener while serving.
    pub fn endpoint(&self, kind: ListenerKind) -> Option<std::net::SocketAddr> {
        match self {
            LifecycleState::Serving(endpoints) => endpoints
                .iter()
                .find(|e| e.kind == kind)
                .map(|e| e.addr),
            _ => None,
        }
    }
}

enum Exit {
    Shutdown,
    Fatal(ListenerError),
}

/// Owns the gateway and listeners for the lifetime of the process.
pub struct Supervisor {
    config: ServiceConfig,
    gateway: Arc<NoteGateway>,
    state: watch::Sender<LifecycleState>,
}

impl Supervisor {
    pub fn new(config: ServiceConfig, gateway: Arc<NoteGateway>) -> Self {
        let (state, _) = watch::channel(LifecycleState::Starting);
        Self {
            config,
            gateway,
            state,
        }
    }

    /// Follow state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    fn publish(&self, next: LifecycleState) {
        tracing::debug!(state = ?next, "Lifecycle transition");
        self.state.send_replace(next);
    }

    /// Run until shutdown completes or a listener fails.
    ///
    /// A listener failure returns immediately; the other listeners are
    /// not stopped.
    pub async fn run(self, shutdown: ShutdownSignal) -> Result<(), ServiceError> {
        if let Err(e) = self.gateway.connect().await {
            tracing::error!(error = %e, "Failed to connect to the database");
            self.publish(LifecycleState::Failed);
            return Err(e.into());
        }

        let prometheus = if self.config.observability.metrics_enabled {
            metrics::install_recorder()
        } else {
            None
        };
        let routers = Routers {
            app: app_router(self.gateway.clone(), &self.config),
            health: health_router(self.gateway.clone(), prometheus),
        };

        let (fatal_tx, mut fatal_rx) = mpsc::channel(ListenerKind::COUNT);
        let set = match ListenerSet::start(&self.config, routers, fatal_tx) {
            Ok(set) => set,
            Err(e) => {
                tracing::error!(error = %e, "Failed to start listeners");
                self.publish(LifecycleState::Failed);
                return Err(e.into());
            }
        };

        let exit = {
            let endpoints = set.endpoints();
            let shutdown = shutdown.recv();
            tokio::pin!(endpoints, shutdown);
            let mut announced = false;

            loop {
                tokio::select! {
                    biased;

                    Some(err) = fatal_rx.recv() => break Exit::Fatal(err),
                    _ = &mut shutdown => break Exit::Shutdown,
                    bound = &mut endpoints, if !announced => {
                        announced = true;
                        for endpoint in &bound {
                            tracing::info!(listener = %endpoint.kind, address = %endpoint.addr, "Listening");
                        }
                        self.publish(LifecycleState::Serving(bound));
                    }
                }
            }
        };

        match exit {
            Exit::Fatal(err) => {
                tracing::error!(error = %err, "Listener failed, exiting");
                self.publish(LifecycleState::Failed);
                Err(err.into())
            }
            Exit::Shutdown => {
                self.publish(LifecycleState::ShuttingDown);
                let timeout = Duration::from_secs(self.config.timeouts.shutdown_secs);
                tracing::info!(timeout_secs = timeout.as_secs(), "Stopping listeners");

                let outcomes = set.shutdown(timeout).await;
                let abandoned = outcomes
                    .iter()
                    .filter(|(_, outcome)| *outcome != StopOutcome::Stopped)
                    .count();
                if abandoned > 0 {
                    tracing::warn!(abandoned, "Some listeners did not stop cleanly");
                }

                self.publish(LifecycleState::Stopped);
                tracing::info!("Shutdown complete");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::MemoryDriver;
    use crate::lifecycle::shutdown;

    fn config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.database = DatabaseConfig {
            uri: "memory://".into(),
            name: "db".into(),
            collection: "notes".into(),
        };
        config.server.host = "127.0.0.1".into();
        config.server.port = Some(0);
        config.health.port = 0;
        config.observability.metrics_enabled = false;
        config
    }

    fn gateway(driver: &MemoryDriver, config: &ServiceConfig) -> Arc<NoteGateway> {
        Arc::new(NoteGateway::new(
            Arc::new(driver.clone()),
            config.database.clone(),
        ))
    }

    #[tokio::test]
    async fn unreachable_store_fails_before_listeners() {
        let config = config();
        let driver = MemoryDriver::new();
        driver.set_reachable(false);

        let supervisor = Supervisor::new(config.clone(), gateway(&driver, &config));
        let state = supervisor.subscribe();
        let (_trigger, signal) = shutdown::channel();

        let err = supervisor.run(signal).await.unwrap_err();
        assert!(matches!(err, ServiceError::Connection(_)));
        assert_eq!(*state.borrow(), LifecycleState::Failed);
    }

    #[tokio::test]
    async fn serves_then_stops_on_signal() {
        let config = config();
        let driver = MemoryDriver::new();
        let supervisor = Supervisor::new(config.clone(), gateway(&driver, &config));
        let mut state = supervisor.subscribe();
        let (trigger, signal) = shutdown::channel();

        let run = tokio::spawn(supervisor.run(signal));

        let serving = state
            .wait_for(|s| matches!(s, LifecycleState::Serving(_)))
            .await
            .unwrap()
            .clone();
        assert!(serving.endpoint(ListenerKind::Http).is_some());
        assert!(serving.endpoint(ListenerKind::Health).is_some());
        assert!(serving.endpoint(ListenerKind::Https).is_none());

        trigger.fire();
        run.await.unwrap().unwrap();
        assert_eq!(*state.borrow(), LifecycleState::Stopped);
    }
}
