//! In-process document store selected with `memory://` URIs.
//!
//! Behaves like the document store where the gateway can observe it:
//! uniqueness is only enforced once the index is declared, index creation
//! fails over existing duplicates, and the whole store can be flipped to
//! unreachable.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::db::driver::{NoteCollection, StoreClient, StoreDriver};
use crate::db::types::{DriverError, Note, NoteFilter, TITLE_FIELD};

struct MemoryState {
    reachable: Arc<AtomicBool>,
    connects: AtomicUsize,
    collections: DashMap<(String, String), Arc<MemoryCollection>>,
}

impl MemoryState {
    fn collection(&self, database: &str, collection: &str) -> Arc<MemoryCollection> {
        self.collections
            .entry((database.to_string(), collection.to_string()))
            .or_insert_with(|| {
                Arc::new(MemoryCollection {
                    reachable: Arc::clone(&self.reachable),
                    unique_title: AtomicBool::new(false),
                    documents: RwLock::new(Vec::new()),
                })
            })
            .clone()
    }
}

/// Driver for the in-process store. Clones share the same data.
#[derive(Clone)]
pub struct MemoryDriver {
    state: Arc<MemoryState>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self {
            state: Arc::new(MemoryState {
                reachable: Arc::new(AtomicBool::new(true)),
                connects: AtomicUsize::new(0),
                collections: DashMap::new(),
            }),
        }
    }

    /// Make every subsequent operation succeed or fail as unreachable.
    pub fn set_reachable(&self, reachable: bool) {
        self.state.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Number of successful connects so far.
    pub fn connect_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    /// Insert documents directly, bypassing any declared index.
    pub async fn seed(&self, database: &str, collection: &str, notes: Vec<Note>) {
        let collection = self.state.collection(database, collection);
        collection.documents.write().await.extend(notes);
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn check_reachable(flag: &AtomicBool) -> Result<(), DriverError> {
    if flag.load(Ordering::SeqCst) {
        Ok(())
    } else {
        Err(DriverError::Unreachable("in-memory store is offline".into()))
    }
}

#[async_trait]
impl StoreDriver for MemoryDriver {
    async fn connect(&self, uri: &str) -> Result<Arc<dyn StoreClient>, DriverError> {
        check_reachable(&self.state.reachable)?;
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(uri = %uri, "In-memory store connected");

        Ok(Arc::new(MemoryClient {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MemoryClient {
    state: Arc<MemoryState>,
}

#[async_trait]
impl StoreClient for MemoryClient {
    async fn ping(&self) -> Result<(), DriverError> {
        check_reachable(&self.state.reachable)
    }

    fn collection(&self, database: &str, collection: &str) -> Arc<dyn NoteCollection> {
        self.state.collection(database, collection)
    }
}

struct MemoryCollection {
    reachable: Arc<AtomicBool>,
    unique_title: AtomicBool,
    documents: RwLock<Vec<Note>>,
}

impl MemoryCollection {
    fn duplicate() -> DriverError {
        DriverError::DuplicateKey {
            field: TITLE_FIELD.to_string(),
        }
    }
}

#[async_trait]
impl NoteCollection for MemoryCollection {
    async fn ensure_unique_index(&self, field: &str) -> Result<(), DriverError> {
        check_reachable(&self.reachable)?;
        if field != TITLE_FIELD {
            return Err(DriverError::Backend(format!(
                "unsupported index field '{field}'"
            )));
        }

        let documents = self.documents.read().await;
        let mut seen = std::collections::HashSet::new();
        if !documents.iter().all(|n| seen.insert(n.title.as_str())) {
            return Err(Self::duplicate());
        }

        self.unique_title.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn insert(&self, note: &Note) -> Result<(), DriverError> {
        check_reachable(&self.reachable)?;
        let mut documents = self.documents.write().await;
        if self.unique_title.load(Ordering::SeqCst)
            && documents.iter().any(|n| n.title == note.title)
        {
            return Err(Self::duplicate());
        }

        documents.push(note.clone());
        Ok(())
    }

    async fn find_one(&self, title: &str) -> Result<Option<Note>, DriverError> {
        check_reachable(&self.reachable)?;
        let documents = self.documents.read().await;
        Ok(documents.iter().find(|n| n.title == title).cloned())
    }

    async fn find(&self, filter: &NoteFilter) -> Result<Vec<Note>, DriverError> {
        check_reachable(&self.reachable)?;
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|n| filter.matches(n))
            .cloned()
            .collect())
    }

    async fn replace(&self, title: &str, note: &Note) -> Result<u64, DriverError> {
        check_reachable(&self.reachable)?;
        let mut documents = self.documents.write().await;
        let Some(index) = documents.iter().position(|n| n.title == title) else {
            return Ok(0);
        };

        if self.unique_title.load(Ordering::SeqCst)
            && documents
                .iter()
                .enumerate()
                .any(|(i, n)| i != index && n.title == note.title)
        {
            return Err(Self::duplicate());
        }

        documents[index] = note.clone();
        Ok(1)
    }

    async fn delete_one(&self, title: &str) -> Result<u64, DriverError> {
        check_reachable(&self.reachable)?;
        let mut documents = self.documents.write().await;
        match documents.iter().position(|n| n.title == title) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_all(&self) -> Result<u64, DriverError> {
        check_reachable(&self.reachable)?;
        let mut documents = self.documents.write().await;
        let deleted = documents.len() as u64;
        documents.clear();
        Ok(deleted)
    }
}
