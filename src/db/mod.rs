//! Persistence subsystem.
//!
//! # Data Flow
//! ```text
//! DATABASE_URI
//!     → driver_for_uri (scheme picks mongo.rs or memory.rs)
//!     → gateway.rs (connect: open → ping → select collection → unique index)
//!     → route handlers call CRUD on the shared gateway
//! ```
//!
//! # Design Decisions
//! - The gateway only sees the capability traits in driver.rs
//! - Storage failures are surfaced, never retried

pub mod driver;
pub mod gateway;
pub mod memory;
pub mod mongo;
pub mod types;

use std::sync::Arc;

pub use driver::{NoteCollection, StoreClient, StoreDriver};
pub use gateway::NoteGateway;
pub use memory::MemoryDriver;
pub use mongo::MongoDriver;
pub use types::{DriverError, GatewayError, GatewayResult, Note, NoteFilter};

/// Pick a driver from the URI scheme.
pub fn driver_for_uri(uri: &str) -> Result<Arc<dyn StoreDriver>, DriverError> {
    let parsed = url::Url::parse(uri)
        .map_err(|e| DriverError::Backend(format!("invalid database URI: {e}")))?;

    match parsed.scheme() {
        "mongodb" | "mongodb+srv" => Ok(Arc::new(MongoDriver)),
        "memory" => Ok(Arc::new(MemoryDriver::new())),
        other => Err(DriverError::Backend(format!(
            "unsupported database URI scheme '{other}'"
        ))),
    }
}
