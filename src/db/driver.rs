//! Capability interface between the gateway and a concrete document store.
//!
//! The gateway only ever talks to these traits, so any store that can
//! connect, ping, select a collection, declare a unique index and perform
//! insert/find/replace/delete can back it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::types::{DriverError, Note, NoteFilter};

/// Opens client connections.
#[async_trait]
pub trait StoreDriver: Send + Sync {
    async fn connect(&self, uri: &str) -> Result<Arc<dyn StoreClient>, DriverError>;
}

/// A live connection to the store.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Round-trip to the server.
    async fn ping(&self) -> Result<(), DriverError>;

    fn collection(&self, database: &str, collection: &str) -> Arc<dyn NoteCollection>;
}

/// A collection of note documents.
#[async_trait]
pub trait NoteCollection: Send + Sync {
    async fn ensure_unique_index(&self, field: &str) -> Result<(), DriverError>;

    async fn insert(&self, note: &Note) -> Result<(), DriverError>;

    async fn find_one(&self, title: &str) -> Result<Option<Note>, DriverError>;

    async fn find(&self, filter: &NoteFilter) -> Result<Vec<Note>, DriverError>;

    /// Returns the number of matched documents.
    async fn replace(&self, title: &str, note: &Note) -> Result<u64, DriverError>;

    /// Returns the number of deleted documents.
    async fn delete_one(&self, title: &str) -> Result<u64, DriverError>;

    /// Returns the number of deleted documents.
    async fn delete_all(&self) -> Result<u64, DriverError>;
}
