//! Placeholder for a hosted document database.
//!
//! No document database client is configured, so every operation reports
//! [`StoreError::Unavailable`] instead of pretending to succeed.

use serde_json::Value;

use super::{Backend, Collection, Store, StoreError, StoreResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentStore;

impl DocumentStore {
    fn unavailable<T>(&self, operation: &str, collection: Collection) -> StoreResult<T> {
        log::debug!("document store {operation} on {collection}: not configured");
        Err(StoreError::Unavailable {
            backend: Backend::DocumentStore,
        })
    }
}

impl Store for DocumentStore {
    fn backend(&self) -> Backend {
        Backend::DocumentStore
    }

    fn save(&self, collection: Collection, _data: &Value) -> StoreResult<Value> {
        self.unavailable("save", collection)
    }

    fn get(&self, collection: Collection, _query: &[(&str, &str)]) -> StoreResult<Option<Value>> {
        self.unavailable("get", collection)
    }

    fn delete(&self, collection: Collection) -> StoreResult<()> {
        self.unavailable("delete", collection)
    }

    fn update(&self, collection: Collection, _id: &str, _data: &Value) -> StoreResult<Value> {
        self.unavailable("update", collection)
    }

    fn delete_item(&self, collection: Collection, _id: &str) -> StoreResult<()> {
        self.unavailable("delete", collection)
    }

    fn clear(&self, _collections: &[Collection]) -> StoreResult<()> {
        Err(StoreError::Unavailable {
            backend: Backend::DocumentStore,
        })
    }
}
