//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use notes_service::config::{DatabaseConfig, ServiceConfig};
use notes_service::db::{MemoryDriver, NoteGateway};
use notes_service::lifecycle::shutdown::{self, ShutdownTrigger};
use notes_service::net::ListenerKind;
use notes_service::{LifecycleState, ServiceError, Supervisor};

/// Config for an in-memory store with every port chosen by the OS.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.database = DatabaseConfig {
        uri: "memory://test".into(),
        name: "notes-test".into(),
        collection: "notes".into(),
    };
    config.server.host = "127.0.0.1".into();
    config.server.port = Some(0);
    config.health.port = 0;
    config.timeouts.shutdown_secs = 5;
    config
}

/// Open a POST to `path` whose body never completes.
///
/// The handler stays in flight until the returned stream is dropped.
pub async fn stall_request(addr: SocketAddr, path: &str) -> TcpStream {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let head = format!(
        "POST {path} HTTP/1.1\r\nhost: {addr}\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{{\"title\":"
    );
    stream.write_all(head.as_bytes()).await.expect("write");
    // Let the server pick the request up before callers act on it.
    tokio::time::sleep(Duration::from_millis(100)).await;
    stream
}

/// A supervisor running in the background.
pub struct TestService {
    pub driver: MemoryDriver,
    pub state: watch::Receiver<LifecycleState>,
    pub trigger: Option<ShutdownTrigger>,
    pub task: JoinHandle<Result<(), ServiceError>>,
}

impl TestService {
    pub fn start(config: ServiceConfig) -> Self {
        Self::start_with(config, MemoryDriver::new())
    }

    pub fn start_with(config: ServiceConfig, driver: MemoryDriver) -> Self {
        let gateway = Arc::new(NoteGateway::new(
            Arc::new(driver.clone()),
            config.database.clone(),
        ));
        let supervisor = Supervisor::new(config, gateway);
        let state = supervisor.subscribe();
        let (trigger, signal) = shutdown::channel();
        let task = tokio::spawn(supervisor.run(signal));

        Self {
            driver,
            state,
            trigger: Some(trigger),
            task,
        }
    }

    /// Wait for `Serving`; panics if the supervisor ends first.
    pub async fn serving(&mut self) -> LifecycleState {
        let state = tokio::time::timeout(
            Duration::from_secs(5),
            self.state
                .wait_for(|s| matches!(s, LifecycleState::Serving(_)) || s.is_terminal()),
        )
        .await
        .expect("service did not start in time")
        .expect("supervisor dropped")
        .clone();

        assert!(
            matches!(state, LifecycleState::Serving(_)),
            "service ended before serving: {state:?}"
        );
        state
    }

    pub async fn addr(&mut self, kind: ListenerKind) -> SocketAddr {
        self.serving()
            .await
            .endpoint(kind)
            .expect("listener not bound")
    }

    pub async fn url(&mut self, kind: ListenerKind) -> String {
        format!("http://{}", self.addr(kind).await)
    }

    /// Fire the shutdown trigger and wait for the supervisor to return.
    pub async fn stop(mut self) -> Result<(), ServiceError> {
        if let Some(trigger) = self.trigger.take() {
            trigger.fire();
        }
        tokio::time::timeout(Duration::from_secs(10), self.task)
            .await
            .expect("supervisor did not return in time")
            .expect("supervisor task panicked")
    }
}
