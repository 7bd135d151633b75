//! Listener set: the plain, TLS and health-probe servers.
//!
//! # Responsibilities
//! - Spawn one task per enabled listener
//! - Report bind/serve failures on the fatal channel, once per listener
//! - Stop every listener against one shared deadline
//!
//! # Design Decisions
//! - Binding happens inside the listener task, so bind failures travel
//!   the same path as serve failures
//! - A stop requested through the handle ends `serve` with `Ok`, which
//!   is never reported as fatal
//! - Listeners still draining at the deadline are abandoned, their open
//!   connections are not severed

use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use axum::Router;
use axum_server::Handle;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::ServiceConfig;
use crate::net::tls::load_tls_config;

/// Purpose of a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Application traffic, plain text.
    Http,
    /// Application traffic, TLS.
    Https,
    /// Liveness/readiness probes.
    Health,
}

impl ListenerKind {
    /// Upper bound on concurrently running listeners.
    pub const COUNT: usize = 3;
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerKind::Http => write!(f, "http"),
            ListenerKind::Https => write!(f, "https"),
            ListenerKind::Health => write!(f, "health"),
        }
    }
}

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("invalid listener host '{0}'")]
    Address(String),

    #[error("{kind} listener on {addr} failed: {source}")]
    Serve {
        kind: ListenerKind,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("{kind} listener on {addr} could not load TLS material: {source}")]
    Tls {
        kind: ListenerKind,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// A listener address once bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub kind: ListenerKind,
    pub addr: SocketAddr,
}

/// One running listener.
pub struct ListenerDescriptor {
    kind: ListenerKind,
    addr: SocketAddr,
    handle: Handle,
    task: JoinHandle<()>,
}

impl ListenerDescriptor {
    pub fn kind(&self) -> ListenerKind {
        self.kind
    }
}

/// How a listener ended during shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    /// Still draining at the deadline; `connections` were left open.
    TimedOut { connections: usize },
    /// The listener task panicked or was cancelled.
    Aborted,
}

/// The routers the listeners serve.
pub struct Routers {
    /// Shared by the plain and TLS listeners.
    pub app: Router,
    pub health: Router,
}

/// All listeners started for this process.
pub struct ListenerSet {
    descriptors: Vec<ListenerDescriptor>,
}

impl ListenerSet {
    /// Start every enabled listener.
    ///
    /// Each listener reports an unrecoverable failure on `fatal` exactly
    /// once; `fatal` should have room for [`ListenerKind::COUNT`] messages.
    pub fn start(
        config: &ServiceConfig,
        routers: Routers,
        fatal: mpsc::Sender<ListenerError>,
    ) -> Result<Self, ListenerError> {
        let host: IpAddr = config
            .server
            .host
            .parse()
            .map_err(|_| ListenerError::Address(config.server.host.clone()))?;

        let mut descriptors = Vec::with_capacity(ListenerKind::COUNT);

        if let Some(port) = config.server.port {
            descriptors.push(spawn_plain(
                ListenerKind::Http,
                SocketAddr::new(host, port),
                routers.app.clone(),
                fatal.clone(),
            ));
        }

        match config.tls.enabled() {
            Some((port, cert, key)) => descriptors.push(spawn_tls(
                SocketAddr::new(host, port),
                cert.to_path_buf(),
                key.to_path_buf(),
                routers.app,
                fatal.clone(),
            )),
            None => tracing::debug!("TLS listener disabled"),
        }

        descriptors.push(spawn_plain(
            ListenerKind::Health,
            SocketAddr::new(host, config.health.port),
            routers.health,
            fatal,
        ));

        Ok(Self { descriptors })
    }

    pub fn descriptors(&self) -> &[ListenerDescriptor] {
        &self.descriptors
    }

    /// Wait until every listener is accepting connections.
    ///
    /// A listener that failed to bind is left out. Never resolves if TLS
    /// material could not be loaded; that failure arrives on the fatal
    /// channel instead.
    pub async fn endpoints(&self) -> Vec<Endpoint> {
        let mut endpoints = Vec::with_capacity(self.descriptors.len());
        for descriptor in &self.descriptors {
            if let Some(addr) = descriptor.handle.listening().await {
                endpoints.push(Endpoint {
                    kind: descriptor.kind,
                    addr,
                });
            }
        }
        endpoints
    }

    /// Ask every listener to stop, then wait for each until `timeout` has
    /// elapsed overall.
    ///
    /// Stopping is best-effort: a listener that misses the deadline is
    /// logged and abandoned, and the remaining ones are still awaited.
    pub async fn shutdown(self, timeout: Duration) -> Vec<(ListenerKind, StopOutcome)> {
        let deadline = Instant::now() + timeout;

        // Stop accepting everywhere first so the deadline is shared.
        for descriptor in &self.descriptors {
            descriptor.handle.graceful_shutdown(None);
        }

        let mut outcomes = Vec::with_capacity(self.descriptors.len());
        for descriptor in self.descriptors {
            let ListenerDescriptor {
                kind,
                addr,
                handle,
                task,
            } = descriptor;

            let outcome = match tokio::time::timeout_at(deadline, task).await {
                Ok(Ok(())) => {
                    tracing::info!(listener = %kind, address = %addr, "Listener stopped");
                    StopOutcome::Stopped
                }
                Ok(Err(e)) => {
                    tracing::error!(listener = %kind, address = %addr, error = %e, "Listener task aborted");
                    StopOutcome::Aborted
                }
                Err(_) => {
                    let connections = handle.connection_count();
                    tracing::error!(
                        listener = %kind,
                        address = %addr,
                        connections,
                        "Listener failed to stop within the shutdown deadline, abandoning it"
                    );
                    StopOutcome::TimedOut { connections }
                }
            };
            outcomes.push((kind, outcome));
        }

        outcomes
    }
}

fn spawn_plain(
    kind: ListenerKind,
    addr: SocketAddr,
    router: Router,
    fatal: mpsc::Sender<ListenerError>,
) -> ListenerDescriptor {
    let handle = Handle::new();
    let server = axum_server::bind(addr).handle(handle.clone());

    let task = tokio::spawn(async move {
        tracing::info!(listener = %kind, address = %addr, "Listener starting");
        let result = server.serve(router.into_make_service()).await;
        report(kind, addr, result, &fatal).await;
    });

    ListenerDescriptor {
        kind,
        addr,
        handle,
        task,
    }
}

fn spawn_tls(
    addr: SocketAddr,
    cert: PathBuf,
    key: PathBuf,
    router: Router,
    fatal: mpsc::Sender<ListenerError>,
) -> ListenerDescriptor {
    let kind = ListenerKind::Https;
    let handle = Handle::new();
    let server_handle = handle.clone();

    let task = tokio::spawn(async move {
        let tls = match load_tls_config(&cert, &key).await {
            Ok(tls) => tls,
            Err(source) => {
                tracing::error!(listener = %kind, address = %addr, error = %source, "TLS listener crashed");
                let _ = fatal.send(ListenerError::Tls { kind, addr, source }).await;
                return;
            }
        };

        tracing::info!(listener = %kind, address = %addr, "Listener starting");
        let result = axum_server::bind_rustls(addr, tls)
            .handle(server_handle)
            .serve(router.into_make_service())
            .await;
        report(kind, addr, result, &fatal).await;
    });

    ListenerDescriptor {
        kind,
        addr,
        handle,
        task,
    }
}

async fn report(
    kind: ListenerKind,
    addr: SocketAddr,
    result: io::Result<()>,
    fatal: &mpsc::Sender<ListenerError>,
) {
    match result {
        Ok(()) => tracing::debug!(listener = %kind, address = %addr, "Listener serve loop ended"),
        Err(source) => {
            tracing::error!(listener = %kind, address = %addr, error = %source, "Listener crashed");
            // The supervisor may already be gone; nothing left to tell.
            let _ = fatal.send(ListenerError::Serve { kind, addr, source }).await;
        }
    }
}
