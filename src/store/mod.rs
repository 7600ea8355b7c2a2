//! # Store Module
//!
//! Uniform save/get/delete access to one persistence backend:
//! - [`LocalStore`]: SQLite key-value table on this machine
//! - [`RestStore`]: JSON over HTTP against a configured API
//! - [`DocumentStore`]: declared but not configured; every call is
//!   [`StoreError::Unavailable`]
//!
//! Operations never panic. Callers get a [`StoreResult`] and decide whether
//! a failure matters.

use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub mod document;
pub mod local;
pub mod rest;

pub use document::DocumentStore;
pub use local::LocalStore;
pub use rest::RestStore;

/// Base URL used when no API URL is configured
pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

pub type StoreResult<T> = Result<T, StoreError>;

/// Which persistence implementation is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Local,
    Api,
    DocumentStore,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::Local => "local",
            Backend::Api => "api",
            Backend::DocumentStore => "document-store",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A persisted domain object, with its fixed local key and REST endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Equipment,
    UsageHistory,
    BillingSettings,
    MeterHistory,
    MeterSettings,
}

impl Collection {
    /// The three collections owned by the equipment calculator
    pub const CALCULATOR: [Collection; 3] = [
        Collection::Equipment,
        Collection::UsageHistory,
        Collection::BillingSettings,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Collection::Equipment => "electricity_equipment",
            Collection::UsageHistory => "electricity_usage_history",
            Collection::BillingSettings => "electricity_billing_settings",
            Collection::MeterHistory => "meter_reading_history",
            Collection::MeterSettings => "meter_billing_settings",
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            Collection::Equipment => "equipment",
            Collection::UsageHistory => "usage-history",
            Collection::BillingSettings => "billing-settings",
            Collection::MeterHistory => "meter-reading-history",
            Collection::MeterSettings => "meter-billing-settings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("local storage failed: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("local storage unavailable: {0}")]
    Io(#[from] std::io::Error),

    #[error("network request failed: {0}")]
    Network(String),

    #[error("HTTP error! status: {code}")]
    Status { code: u16 },

    #[error("{backend} backend not configured")]
    Unavailable { backend: Backend },

    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        operation: &'static str,
        backend: Backend,
    },

    #[error("failed to {operation} some data ({})", join_collections(.failed))]
    Incomplete {
        operation: &'static str,
        failed: Vec<Collection>,
    },
}

fn join_collections(failed: &[Collection]) -> String {
    failed
        .iter()
        .map(|c| c.endpoint())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Backend-independent persistence contract.
///
/// `save` and `get` are required of every backend. Updates and per-item
/// deletes exist only where the backend addresses items by id, and clearing
/// everything only where the backend owns the whole dataset.
pub trait Store: Send + Sync {
    fn backend(&self) -> Backend;

    /// Write `data` as the value of `collection`, returning what was stored
    fn save(&self, collection: Collection, data: &Value) -> StoreResult<Value>;

    /// Read a collection. `Ok(None)` when nothing is stored.
    fn get(&self, collection: Collection, query: &[(&str, &str)]) -> StoreResult<Option<Value>>;

    fn delete(&self, collection: Collection) -> StoreResult<()>;

    fn update(&self, _collection: Collection, _id: &str, _data: &Value) -> StoreResult<Value> {
        Err(StoreError::Unsupported {
            operation: "update by id",
            backend: self.backend(),
        })
    }

    fn delete_item(&self, _collection: Collection, _id: &str) -> StoreResult<()> {
        Err(StoreError::Unsupported {
            operation: "delete by id",
            backend: self.backend(),
        })
    }

    fn clear(&self, _collections: &[Collection]) -> StoreResult<()> {
        Err(StoreError::Unsupported {
            operation: "clear all",
            backend: self.backend(),
        })
    }
}

/// Settings needed to construct any backend
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub db_path: Option<PathBuf>,
    pub api_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

/// Construct the store selected by `backend`
pub fn open_store(backend: Backend, config: &StoreConfig) -> StoreResult<Box<dyn Store>> {
    Ok(match backend {
        Backend::Local => Box::new(LocalStore::open(config.db_path.as_deref())?),
        Backend::Api => Box::new(RestStore::new(&config.api_url)),
        Backend::DocumentStore => Box::new(DocumentStore),
    })
}
