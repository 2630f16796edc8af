use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::record::{RawRecord, StoredRecord};

use super::query::{Collection, DateFilter};
use super::traits::RemoteStore;

const NAME: &str = "Memory";

/// In-process store with the same query semantics as the remote one.
///
/// - **Ids**: random UUID v4 strings, never reused.
/// - **Ordering**: year, month, day, price descending; full ties keep
///   insertion order.
/// - **Use**: offline sessions, demos and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Collection, Vec<StoredRecord>>>,
    monthly_budget: Mutex<Option<f64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection with records; ids are generated.
    #[must_use]
    pub fn with_records(self, collection: Collection, records: Vec<RawRecord>) -> Self {
        {
            let mut map = self.collections.lock().unwrap_or_else(|e| e.into_inner());
            let docs = map.entry(collection).or_default();
            for record in records {
                docs.push(StoredRecord::new(Uuid::new_v4().to_string(), record));
            }
        }
        self
    }

    /// Snapshot of a collection in insertion order.
    pub fn records(&self, collection: Collection) -> Vec<StoredRecord> {
        let map = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        map.get(&collection).cloned().unwrap_or_default()
    }

    fn sort_key(record: &RawRecord) -> (i32, u32, u32, f64) {
        (
            record.year.unwrap_or(0),
            record.month.unwrap_or(0),
            record.day.unwrap_or(0),
            record.price.unwrap_or(0.0),
        )
    }

    fn matches(record: &RawRecord, filter: &DateFilter) -> bool {
        filter.field_equalities().iter().all(|(field, value)| {
            let actual = match *field {
                "year" => record.year.map(i64::from),
                "month" => record.month.map(i64::from),
                "day" => record.day.map(i64::from),
                _ => None,
            };
            actual == Some(*value)
        })
    }

    fn not_found(collection: Collection, id: &str) -> CoreError {
        CoreError::Store {
            backend: NAME.into(),
            message: format!("No document {id} in {collection}"),
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl RemoteStore for MemoryStore {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch_ordered_batch(
        &self,
        collection: Collection,
        limit: usize,
    ) -> Result<Vec<StoredRecord>, CoreError> {
        let mut docs = self.records(collection);
        docs.sort_by(|a, b| {
            let (ay, am, ad, ap) = Self::sort_key(&a.record);
            let (by, bm, bd, bp) = Self::sort_key(&b.record);
            (by, bm, bd)
                .cmp(&(ay, am, ad))
                .then(bp.partial_cmp(&ap).unwrap_or(std::cmp::Ordering::Equal))
        });
        docs.truncate(limit);
        Ok(docs)
    }

    async fn add_record(
        &self,
        collection: Collection,
        record: &RawRecord,
    ) -> Result<String, CoreError> {
        let id = Uuid::new_v4().to_string();
        let mut map = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(collection)
            .or_default()
            .push(StoredRecord::new(id.clone(), record.clone()));
        Ok(id)
    }

    async fn delete_record(&self, collection: Collection, id: &str) -> Result<(), CoreError> {
        let mut map = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        let docs = map.entry(collection).or_default();
        let idx = docs
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| Self::not_found(collection, id))?;
        docs.remove(idx);
        Ok(())
    }

    async fn update_record(
        &self,
        collection: Collection,
        id: &str,
        record: &RawRecord,
    ) -> Result<(), CoreError> {
        let mut map = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        let doc = map
            .entry(collection)
            .or_default()
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| Self::not_found(collection, id))?;
        doc.record = record.clone();
        Ok(())
    }

    async fn sum_prices(
        &self,
        collection: Collection,
        filter: DateFilter,
    ) -> Result<f64, CoreError> {
        Ok(self
            .records(collection)
            .iter()
            .filter(|d| Self::matches(&d.record, &filter))
            .map(|d| d.record.price.unwrap_or(0.0))
            .sum())
    }

    async fn count_records(&self, collection: Collection) -> Result<u64, CoreError> {
        Ok(self.records(collection).len() as u64)
    }

    async fn get_monthly_budget(&self) -> Result<f64, CoreError> {
        let budget = self.monthly_budget.lock().unwrap_or_else(|e| e.into_inner());
        Ok(budget.unwrap_or(0.0))
    }

    async fn set_monthly_budget(&self, budget: f64) -> Result<(), CoreError> {
        let mut stored = self.monthly_budget.lock().unwrap_or_else(|e| e.into_inner());
        *stored = Some(budget);
        Ok(())
    }
}
