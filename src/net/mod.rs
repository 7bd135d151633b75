//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerSet::start
//!     → listener.rs (one task per listener, axum-server Handle each)
//!     → tls.rs (PEM material for the encrypted listener)
//!     → bind/serve failure → fatal channel → supervisor
//!
//! Listener states:
//!     Binding → Accepting → Draining → Stopped | Abandoned
//! ```
//!
//! # Design Decisions
//! - Plain and TLS listeners share one application router
//! - The health listener has its own router and no traffic limits
//! - TLS is optional and disabled unless fully configured

pub mod listener;
pub mod tls;

pub use listener::{
    Endpoint, ListenerDescriptor, ListenerError, ListenerKind, ListenerSet, Routers, StopOutcome,
};
