//! MongoDB driver for `mongodb://` and `mongodb+srv://` URIs.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};

use crate::db::driver::{NoteCollection, StoreClient, StoreDriver};
use crate::db::types::{DriverError, Note, NoteFilter, TITLE_FIELD};

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Clone, Copy, Default)]
pub struct MongoDriver;

#[async_trait]
impl StoreDriver for MongoDriver {
    async fn connect(&self, uri: &str) -> Result<Arc<dyn StoreClient>, DriverError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| DriverError::Unreachable(e.to_string()))?;

        Ok(Arc::new(MongoClient { client }))
    }
}

struct MongoClient {
    client: Client,
}

#[async_trait]
impl StoreClient for MongoClient {
    async fn ping(&self) -> Result<(), DriverError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|e| DriverError::Unreachable(e.to_string()))
    }

    fn collection(&self, database: &str, collection: &str) -> Arc<dyn NoteCollection> {
        Arc::new(MongoCollection {
            inner: self.client.database(database).collection(collection),
        })
    }
}

struct MongoCollection {
    inner: Collection<Note>,
}

fn title_query(title: &str) -> Document {
    doc! { TITLE_FIELD: title }
}

fn filter_query(filter: &NoteFilter) -> Document {
    let mut query = Document::new();
    if !filter.tags.is_empty() {
        query.insert("tags", doc! { "$all": filter.tags.clone() });
    }
    if let Some(category) = &filter.category {
        query.insert("category", category.as_str());
    }
    if let Some(date) = &filter.date {
        query.insert("date", date.as_str());
    }
    query
}

fn map_error(err: mongodb::error::Error) -> DriverError {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE => {
            DriverError::DuplicateKey {
                field: TITLE_FIELD.to_string(),
            }
        }
        _ => DriverError::Backend(err.to_string()),
    }
}

#[async_trait]
impl NoteCollection for MongoCollection {
    async fn ensure_unique_index(&self, field: &str) -> Result<(), DriverError> {
        let model = IndexModel::builder()
            .keys(doc! { field: -1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.inner.create_index(model).await.map_err(map_error)?;
        Ok(())
    }

    async fn insert(&self, note: &Note) -> Result<(), DriverError> {
        self.inner.insert_one(note).await.map_err(map_error)?;
        Ok(())
    }

    async fn find_one(&self, title: &str) -> Result<Option<Note>, DriverError> {
        self.inner
            .find_one(title_query(title))
            .await
            .map_err(map_error)
    }

    async fn find(&self, filter: &NoteFilter) -> Result<Vec<Note>, DriverError> {
        let cursor = self
            .inner
            .find(filter_query(filter))
            .await
            .map_err(map_error)?;

        cursor.try_collect().await.map_err(map_error)
    }

    async fn replace(&self, title: &str, note: &Note) -> Result<u64, DriverError> {
        let result = self
            .inner
            .replace_one(title_query(title), note)
            .await
            .map_err(map_error)?;
        Ok(result.matched_count)
    }

    async fn delete_one(&self, title: &str) -> Result<u64, DriverError> {
        let result = self
            .inner
            .delete_one(title_query(title))
            .await
            .map_err(map_error)?;
        Ok(result.deleted_count)
    }

    async fn delete_all(&self) -> Result<u64, DriverError> {
        let result = self.inner.delete_many(doc! {}).await.map_err(map_error)?;
        Ok(result.deleted_count)
    }
}
