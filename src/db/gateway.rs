//! Persistence gateway.
//!
//! # Responsibilities
//! - Own the single store connection for the process lifetime
//! - Idempotent connect with at-most-once initialisation
//! - Readiness probing
//! - Note CRUD with "already exists" / "not found" kept apart from
//!   storage failures
//!
//! # Design Decisions
//! - Connection state is written once (`OnceCell`) and only read after,
//!   so no extra locking; the driver's own pool handles concurrency
//! - A failed connect leaves the cell empty so a later call can retry
//! - `date` is stamped here so every write path gets it

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::config::DatabaseConfig;
use crate::db::driver::{NoteCollection, StoreClient, StoreDriver};
use crate::db::types::{
    DriverError, GatewayError, GatewayResult, Note, NoteFilter, DATE_FORMAT, TITLE_FIELD,
};

struct Connection {
    client: Arc<dyn StoreClient>,
    collection: Arc<dyn NoteCollection>,
}

/// Gateway to the notes collection.
pub struct NoteGateway {
    driver: Arc<dyn StoreDriver>,
    config: DatabaseConfig,
    connection: OnceCell<Connection>,
}

impl NoteGateway {
    pub fn new(driver: Arc<dyn StoreDriver>, config: DatabaseConfig) -> Self {
        Self {
            driver,
            config,
            connection: OnceCell::new(),
        }
    }

    /// Connect to the store, verify it and declare the unique title index.
    ///
    /// Returns immediately when already connected. Concurrent first calls
    /// share a single attempt.
    pub async fn connect(&self) -> GatewayResult<()> {
        if self.connection.initialized() {
            tracing::info!("Database already connected");
            return Ok(());
        }

        self.connection.get_or_try_init(|| self.open()).await?;
        Ok(())
    }

    async fn open(&self) -> GatewayResult<Connection> {
        let client = self
            .driver
            .connect(&self.config.uri)
            .await
            .map_err(GatewayError::Connect)?;

        client.ping().await.map_err(GatewayError::Ping)?;

        let collection = client.collection(&self.config.name, &self.config.collection);

        collection
            .ensure_unique_index(TITLE_FIELD)
            .await
            .map_err(|source| GatewayError::Index {
                field: TITLE_FIELD,
                source,
            })?;

        tracing::info!(field = TITLE_FIELD, "Unique collection index set");
        tracing::info!(
            database = %self.config.name,
            collection = %self.config.collection,
            "Connected to the database"
        );

        Ok(Connection { client, collection })
    }

    /// Fresh round-trip to the store. Any failure, including not being
    /// connected yet, reads as not ready.
    pub async fn is_ready(&self) -> bool {
        match self.connection.get() {
            Some(conn) => match conn.client.ping().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "Readiness ping failed");
                    false
                }
            },
            None => false,
        }
    }

    fn collection(&self) -> GatewayResult<&dyn NoteCollection> {
        self.connection
            .get()
            .map(|conn| conn.collection.as_ref())
            .ok_or(GatewayError::NotConnected)
    }

    pub async fn add_note(&self, mut note: Note) -> GatewayResult<Note> {
        note.date = today();

        let inserted = self.collection()?.insert(&note).await;
        match inserted {
            Ok(()) => {
                tracing::info!(title = %note.title, "Note added to the collection");
                Ok(note)
            }
            Err(DriverError::DuplicateKey { .. }) => Err(GatewayError::AlreadyExists(note.title)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_note(&self, title: &str, mut note: Note) -> GatewayResult<Note> {
        note.date = today();

        let replaced = self.collection()?.replace(title, &note).await;
        let matched = match replaced {
            Ok(matched) => matched,
            Err(DriverError::DuplicateKey { .. }) => {
                return Err(GatewayError::AlreadyExists(note.title))
            }
            Err(e) => return Err(e.into()),
        };

        if matched == 0 {
            return Err(GatewayError::NotFound(title.to_string()));
        }

        tracing::info!(title = %title, new_title = %note.title, "Note updated");
        Ok(note)
    }

    pub async fn get_note(&self, title: &str) -> GatewayResult<Note> {
        self.collection()?
            .find_one(title)
            .await?
            .ok_or_else(|| GatewayError::NotFound(title.to_string()))
    }

    pub async fn get_notes(&self) -> GatewayResult<Vec<Note>> {
        self.get_notes_filtered(&NoteFilter::default()).await
    }

    /// Empty filter components impose no constraint; zero matches is an
    /// empty vector.
    pub async fn get_notes_filtered(&self, filter: &NoteFilter) -> GatewayResult<Vec<Note>> {
        Ok(self.collection()?.find(filter).await?)
    }

    pub async fn delete_note(&self, title: &str) -> GatewayResult<()> {
        let deleted = self.collection()?.delete_one(title).await?;
        if deleted == 0 {
            return Err(GatewayError::NotFound(title.to_string()));
        }

        tracing::info!(title = %title, "Note deleted");
        Ok(())
    }

    /// Delete every note. Returns how many were removed.
    pub async fn delete_notes(&self) -> GatewayResult<u64> {
        let deleted = self.collection()?.delete_all().await?;
        if deleted == 0 {
            return Err(GatewayError::NoneMatched);
        }

        tracing::info!(count = deleted, "Notes deleted");
        Ok(deleted)
    }
}

fn today() -> String {
    chrono::Utc::now().format(DATE_FORMAT).to_string()
}
