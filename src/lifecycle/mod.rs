//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (supervisor.rs):
//!     Connect gateway → Build routers → Start listeners → Serving
//!
//! Shutdown (shutdown.rs, supervisor.rs):
//!     Signal received → Stop accepting → Drain until deadline → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Fire the shutdown trigger
//!
//! Failure:
//!     Listener error on the fatal channel → Failed, no restart
//! ```
//!
//! # Design Decisions
//! - Ordered startup: the database is reachable before any port opens
//! - Shutdown has a shared deadline: listeners still draining are abandoned
//! - A listener failure ends the process without stopping its peers

pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use shutdown::{ShutdownSignal, ShutdownTrigger};
pub use supervisor::{LifecycleState, ServiceError, Supervisor};
