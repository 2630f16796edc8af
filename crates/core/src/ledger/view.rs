use std::sync::Arc;

use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::errors::CoreError;
use crate::models::item::LineItem;

use super::bucket::{BucketKey, Granularity};

/// An ordered, locally cached ledger with one synthetic total row per bucket.
///
/// Layout, newest first:
///
/// ```text
/// [TOTAL 2024-05-02] [Lunch 12.00] [Coffee 3.50] [TOTAL 2024-05-01] [Rent 700.00] ...
/// ```
///
/// Every bucket is a total row followed by its real items sorted by price,
/// highest first. The total always equals the sum of the items below it and
/// is recomputed from them after every mutation. The bucket containing
/// "today" (per the injected clock) is the anchor: it survives with a zero
/// total when its last item is deleted.
///
/// Pure in-memory bookkeeping, no I/O. Mutations are expected to be
/// serialised by the owner (see `FinanceTracker`).
#[derive(Clone)]
pub struct LedgerView {
    granularity: Granularity,
    clock: Arc<dyn Clock>,
    entries: Vec<LineItem>,
}

impl std::fmt::Debug for LedgerView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerView")
            .field("granularity", &self.granularity)
            .field("entries", &self.entries.len())
            .field("today", &self.clock.today())
            .finish()
    }
}

/// A bucket being accumulated during a rebuild.
struct OpenBucket {
    key: BucketKey,
    items: Vec<LineItem>,
}

impl OpenBucket {
    fn flush_into(self, out: &mut Vec<LineItem>) {
        let sum = self.items.iter().fold(0.0, |acc, i| acc + i.price);
        out.push(LineItem::total(self.key, sum));
        out.extend(self.items);
    }
}

impl LedgerView {
    /// An empty ledger using the system clock.
    pub fn new(granularity: Granularity) -> Self {
        Self::with_clock(granularity, Arc::new(SystemClock))
    }

    pub fn with_clock(granularity: Granularity, clock: Arc<dyn Clock>) -> Self {
        Self {
            granularity,
            clock,
            entries: Vec::new(),
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Key of the bucket that must stay visible even when empty.
    pub fn anchor_key(&self) -> BucketKey {
        BucketKey::new(self.clock.today(), self.granularity)
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Replace the whole ledger with a freshly fetched batch.
    ///
    /// The batch is expected newest-first (date, then price, descending) as
    /// the store delivers it. Within a bucket items are ordered by price,
    /// highest first; equal prices keep their batch order. If the batch
    /// jumps from buckets after today to buckets before today, an empty
    /// anchor total for today is inserted between them. An empty batch
    /// produces an empty ledger.
    pub fn rebuild_from_batch(&mut self, items: impl IntoIterator<Item = LineItem>) {
        let granularity = self.granularity;
        let anchor = self.anchor_key();

        let mut batch: Vec<LineItem> = items.into_iter().filter(|i| !i.is_total()).collect();
        // Stable: a well-formed batch is left untouched. Yearly batches come
        // in date order within a year, so price has to be sorted here too.
        batch.sort_by(|a, b| {
            b.bucket_key(granularity)
                .cmp(&a.bucket_key(granularity))
                .then(b.price.total_cmp(&a.price))
        });

        let mut out = Vec::with_capacity(batch.len() * 2);
        let mut open: Option<OpenBucket> = None;
        let mut prev_key: Option<BucketKey> = None;

        for item in batch {
            let key = item.bucket_key(granularity);

            if prev_key.map_or(true, |p| p > anchor) && key < anchor {
                if let Some(bucket) = open.take() {
                    bucket.flush_into(&mut out);
                }
                out.push(LineItem::total(anchor, 0.0));
            }

            match open.as_mut() {
                Some(bucket) if bucket.key == key => bucket.items.push(item),
                _ => {
                    if let Some(bucket) = open.take() {
                        bucket.flush_into(&mut out);
                    }
                    open = Some(OpenBucket {
                        key,
                        items: vec![item],
                    });
                }
            }
            prev_key = Some(key);
        }

        if let Some(bucket) = open.take() {
            bucket.flush_into(&mut out);
        }

        debug!(
            granularity = ?granularity,
            entries = out.len(),
            "ledger rebuilt from batch"
        );
        self.entries = out;
    }

    /// Insert a stored item at its chronological position.
    ///
    /// Returns the index of the item's total row (created if the bucket did
    /// not exist yet), so a caller can scroll to it.
    pub fn insert(&mut self, item: LineItem) -> Result<usize, CoreError> {
        Self::validate_item(&item)?;
        if self.position_of(&item.id).is_some() {
            return Err(CoreError::ValidationError(format!(
                "item {} is already in the ledger",
                item.id
            )));
        }

        let granularity = self.granularity;
        let key = item.bucket_key(granularity);

        // First entry whose bucket is not newer than the item's. Buckets
        // start with their total, so a match here is the bucket's total row.
        let total_idx = self
            .entries
            .iter()
            .position(|e| e.bucket_key(granularity) <= key)
            .unwrap_or(self.entries.len());

        let bucket_exists = self
            .entries
            .get(total_idx)
            .is_some_and(|e| e.is_total() && e.bucket_key(granularity) == key);

        if bucket_exists {
            // Equal prices keep insertion order: the new item goes last.
            let mut pos = total_idx + 1;
            while pos < self.entries.len()
                && !self.entries[pos].is_total()
                && self.entries[pos].price >= item.price
            {
                pos += 1;
            }
            debug!(id = %item.id, bucket = %key, position = pos, "inserting into existing bucket");
            self.entries.insert(pos, item);
        } else {
            debug!(id = %item.id, bucket = %key, position = total_idx, "opening new bucket");
            self.entries.insert(total_idx, LineItem::total(key, 0.0));
            self.entries.insert(total_idx + 1, item);
        }

        self.recompute_total(total_idx);
        Ok(total_idx)
    }

    /// Remove the real item at `position` and return it.
    ///
    /// The owning total is recomputed. A bucket left without items is
    /// dropped, unless it is today's anchor, which stays at zero.
    pub fn delete_at(&mut self, position: usize) -> Result<LineItem, CoreError> {
        self.check_line_item(position)?;

        let owner = (0..position)
            .rev()
            .find(|&i| self.entries[i].is_total())
            .ok_or_else(|| {
                CoreError::ValidationError(format!("no total row above position {position}"))
            })?;

        let removed = self.entries.remove(position);
        self.recompute_total(owner);

        let bucket_empty = self.entries.get(owner + 1).map_or(true, |e| e.is_total());
        let owner_key = self.entries[owner].bucket_key(self.granularity);
        if bucket_empty && owner_key != self.anchor_key() {
            debug!(bucket = %owner_key, "dropping empty bucket");
            self.entries.remove(owner);
        }

        debug!(id = %removed.id, position, "deleted line item");
        Ok(removed)
    }

    /// Replace the item at `position` with `item` (an edit may move it to
    /// another bucket). Returns the index of the new total row.
    pub fn replace_at(&mut self, position: usize, item: LineItem) -> Result<usize, CoreError> {
        Self::validate_item(&item)?;
        let removed = self.delete_at(position)?;
        match self.insert(item) {
            Ok(idx) => Ok(idx),
            Err(e) => {
                // Put the original back; it was valid a moment ago.
                self.insert(removed)?;
                Err(e)
            }
        }
    }

    /// Drop everything (logout / explicit refresh).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // ── Reads ───────────────────────────────────────────────────────

    pub fn entries(&self) -> &[LineItem] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&LineItem> {
        self.entries.get(position)
    }

    /// Real items only, in ledger order.
    pub fn real_items(&self) -> impl Iterator<Item = &LineItem> + '_ {
        self.entries.iter().filter(|e| !e.is_total())
    }

    /// Total rows only, newest first.
    pub fn totals(&self) -> impl Iterator<Item = &LineItem> + '_ {
        self.entries.iter().filter(|e| e.is_total())
    }

    /// Position of the real item with the given id.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| !e.is_total() && e.id == id)
    }

    /// Total of the bucket identified by `key`, if it is in the ledger.
    pub fn bucket_total(&self, key: BucketKey) -> Option<f64> {
        self.totals()
            .find(|t| t.bucket_key(self.granularity) == key)
            .map(|t| t.price)
    }

    // ── Internal ────────────────────────────────────────────────────

    fn validate_item(item: &LineItem) -> Result<(), CoreError> {
        if item.is_total() {
            return Err(CoreError::ValidationError(
                "total rows are derived and cannot be inserted".into(),
            ));
        }
        if item.id.is_empty() {
            return Err(CoreError::ValidationError(
                "item has no id; store it before adding it to the ledger".into(),
            ));
        }
        if !item.price.is_finite() {
            return Err(CoreError::ValidationError(format!(
                "item {} has a non-finite price",
                item.id
            )));
        }
        Ok(())
    }

    fn check_line_item(&self, position: usize) -> Result<(), CoreError> {
        match self.entries.get(position) {
            None => Err(CoreError::InvalidPosition {
                position,
                len: self.entries.len(),
            }),
            Some(e) if e.is_total() => Err(CoreError::NotALineItem(position)),
            Some(_) => Ok(()),
        }
    }

    /// Set the total at `total_idx` to the sum of the items below it.
    fn recompute_total(&mut self, total_idx: usize) {
        let sum = self.entries[total_idx + 1..]
            .iter()
            .take_while(|e| !e.is_total())
            .fold(0.0, |acc, e| acc + e.price);
        self.entries[total_idx].price = sum;
    }
}
