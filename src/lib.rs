//! Notes service library.
//!
//! A small HTTP API over a document store, run by a supervisor that owns
//! the plain, TLS and health-probe listeners.

pub mod config;
pub mod db;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ServiceConfig;
pub use db::NoteGateway;
pub use lifecycle::{LifecycleState, ServiceError, Supervisor};
