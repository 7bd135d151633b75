//! Note record, query filter and storage error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field carrying the unique index.
pub const TITLE_FIELD: &str = "title";

/// Format of the server-assigned `date` field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A persisted note.
///
/// Field order matches the stored document layout:
/// `title`, `date`, `description`, `category`, `tags`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct Note {
    /// Unique natural key.
    pub title: String,

    /// Assigned by the gateway on every write; client input is discarded.
    #[serde(default)]
    pub date: String,

    pub description: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl Note {
    /// Build a note with the required fields only.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Names of required fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.is_empty() {
            missing.push("title");
        }
        if self.description.is_empty() {
            missing.push("description");
        }
        missing
    }
}

/// Query filter for listing notes.
///
/// Each component is independent; an empty component imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    /// Record must contain all of these tags.
    pub tags: Vec<String>,
    /// Exact category match.
    pub category: Option<String>,
    /// Exact date match.
    pub date: Option<String>,
}

impl NoteFilter {
    /// Build a filter, dropping empty components.
    pub fn new(tags: &[String], category: &str, date: &str) -> Self {
        Self {
            tags: tags.iter().filter(|t| !t.is_empty()).cloned().collect(),
            category: (!category.is_empty()).then(|| category.to_string()),
            date: (!date.is_empty()).then(|| date.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.category.is_none() && self.date.is_none()
    }

    pub fn matches(&self, note: &Note) -> bool {
        self.tags.iter().all(|t| note.tags.contains(t))
            && self.category.as_ref().is_none_or(|c| *c == note.category)
            && self.date.as_ref().is_none_or(|d| *d == note.date)
    }
}

/// Errors reported by a storage driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A unique index rejected the write.
    #[error("duplicate key for field '{field}'")]
    DuplicateKey { field: String },

    /// The store could not be reached.
    #[error("store unreachable: {0}")]
    Unreachable(String),

    /// Any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by the persistence gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("database is not connected")]
    NotConnected,

    #[error("failed to connect to the database: {0}")]
    Connect(#[source] DriverError),

    #[error("failed to verify database connection: {0}")]
    Ping(#[source] DriverError),

    #[error("failed to set '{field}' as a unique collection index: {source}")]
    Index {
        field: &'static str,
        #[source]
        source: DriverError,
    },

    #[error("note with key 'title' and value '{0}' already exists")]
    AlreadyExists(String),

    #[error("note '{0}' does not exist")]
    NotFound(String),

    #[error("no notes matched")]
    NoneMatched,

    #[error(transparent)]
    Storage(#[from] DriverError),
}

impl GatewayError {
    /// True for both the single-note and bulk "zero affected" conditions.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound(_) | GatewayError::NoneMatched)
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
