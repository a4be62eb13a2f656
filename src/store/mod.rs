//! Storage abstraction for the insight collection.
//!
//! The [`Store`] trait covers every read the query layer needs plus the two
//! bulk writes the seeding command performs. Backends:
//!
//! - [`SqliteStore`] — the production backend on top of a `sqlx` pool.
//! - [`InMemoryStore`] — a `Vec` behind a lock, used by tests.
//!
//! Implementations must be `Send + Sync` so a single handle can be shared
//! across request handlers as `Arc<dyn Store>`.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::filter::{FilterField, InsightFilter};
use crate::models::{Insight, NumericField, StoredInsight};

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// A failure reaching or querying the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid record in store: {0}")]
    InvalidRecord(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Abstract insight collection.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`find`](Store::find) | Records matching a filter, in insertion order |
/// | [`distinct`](Store::distinct) | Distinct present, non-empty values of a field |
/// | [`count`](Store::count) | Total number of records |
/// | [`average`](Store::average) | Mean of a numeric field over records that have it |
/// | [`delete_all`](Store::delete_all) | Remove every record |
/// | [`insert_many`](Store::insert_many) | Bulk insert, all-or-nothing |
#[async_trait]
pub trait Store: Send + Sync {
    async fn find(&self, filter: &InsightFilter) -> StoreResult<Vec<StoredInsight>>;

    /// Values come back in no particular order.
    async fn distinct(&self, field: FilterField) -> StoreResult<Vec<String>>;

    async fn count(&self) -> StoreResult<u64>;

    /// `None` when no record has the field.
    async fn average(&self, field: NumericField) -> StoreResult<Option<f64>>;

    /// Returns the number of records removed.
    async fn delete_all(&self) -> StoreResult<u64>;

    /// Returns the number of records inserted.
    async fn insert_many(&self, records: &[Insight]) -> StoreResult<u64>;

    /// Release connections. Called once on shutdown.
    async fn close(&self) {}
}
