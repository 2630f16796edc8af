use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::record::{RawRecord, StoredRecord};

use super::query::{Collection, DateFilter};

/// Trait abstraction for the remote document database.
///
/// The ledger never talks to a store directly: `FinanceTracker` awaits the
/// store call and only touches its local cache once the call succeeded.
/// Failures are opaque; implementations surface them as `CoreError::Store`
/// or `CoreError::Network` and never retry.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait RemoteStore: Send + Sync {
    /// Human-readable name of this store (for logs/errors).
    fn name(&self) -> &str;

    /// Up to `limit` records, newest first: year, month, day, then price,
    /// all descending.
    async fn fetch_ordered_batch(
        &self,
        collection: Collection,
        limit: usize,
    ) -> Result<Vec<StoredRecord>, CoreError>;

    /// Store a new record. Returns the id assigned by the store.
    async fn add_record(
        &self,
        collection: Collection,
        record: &RawRecord,
    ) -> Result<String, CoreError>;

    async fn delete_record(&self, collection: Collection, id: &str) -> Result<(), CoreError>;

    /// Overwrite an existing record.
    async fn update_record(
        &self,
        collection: Collection,
        id: &str,
        record: &RawRecord,
    ) -> Result<(), CoreError>;

    /// Server-side sum of `price` over the records matching `filter`.
    async fn sum_prices(
        &self,
        collection: Collection,
        filter: DateFilter,
    ) -> Result<f64, CoreError>;

    /// Number of records in the collection.
    async fn count_records(&self, collection: Collection) -> Result<u64, CoreError>;

    /// The stored monthly budget; 0 when none was ever set.
    async fn get_monthly_budget(&self) -> Result<f64, CoreError>;

    async fn set_monthly_budget(&self, budget: f64) -> Result<(), CoreError>;
}
