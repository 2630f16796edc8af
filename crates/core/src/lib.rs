pub mod clock;
pub mod errors;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use chrono::NaiveDate;
use clock::{Clock, SystemClock};
use ledger::view::LedgerView;
use models::{
    budget::{Budget, BudgetStatus},
    item::LineItem,
    record::RawRecord,
    settings::Settings,
    stats::LedgerStats,
};
use services::{
    budget_service::BudgetService,
    stats_service::StatsService,
    trend_service::{AverageTrend, TrendService},
};
use store::{
    firestore::FirestoreStore,
    memory::MemoryStore,
    query::{Collection, DateFilter},
    traits::RemoteStore,
};
use tracing::{debug, info, warn};

use errors::CoreError;

/// Main entry point for the MyFinance core library.
///
/// One instance per signed-in session. It owns the purchase and income
/// ledgers, the cached monthly budget and the remote store. Every mutating
/// operation awaits the store first and patches the local ledger only if
/// the store call succeeded; taking `&mut self` serialises them.
#[must_use]
pub struct FinanceTracker {
    store: Box<dyn RemoteStore>,
    clock: Arc<dyn Clock>,
    settings: Settings,
    purchases: LedgerView,
    incomes: LedgerView,
    budget: Budget,
    stats_service: StatsService,
    trend_service: TrendService,
    budget_service: BudgetService,
}

impl std::fmt::Debug for FinanceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinanceTracker")
            .field("store", &self.store.name())
            .field("purchases", &self.purchases.len())
            .field("incomes", &self.incomes.len())
            .field("budget", &self.budget)
            .field("settings", &self.settings)
            .finish()
    }
}

impl FinanceTracker {
    /// Start a session against `store`, using the system clock.
    pub fn new(store: Box<dyn RemoteStore>, settings: Settings) -> Result<Self, CoreError> {
        Self::with_clock(store, settings, Arc::new(SystemClock))
    }

    /// Start a session with an explicit clock (tests, replays).
    pub fn with_clock(
        store: Box<dyn RemoteStore>,
        settings: Settings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        Ok(Self {
            purchases: LedgerView::with_clock(
                Collection::Purchases.granularity(),
                Arc::clone(&clock),
            ),
            incomes: LedgerView::with_clock(Collection::Incomes.granularity(), Arc::clone(&clock)),
            store,
            clock,
            settings,
            budget: Budget::default(),
            stats_service: StatsService::new(),
            trend_service: TrendService::new(),
            budget_service: BudgetService::new(),
        })
    }

    /// Pick the store from the settings: Firestore when configured,
    /// otherwise an in-memory store.
    pub fn from_settings(settings: Settings) -> Result<Self, CoreError> {
        settings.validate()?;
        let store: Box<dyn RemoteStore> = match &settings.firestore {
            Some(config) => Box::new(FirestoreStore::new(config.clone())),
            None => Box::new(MemoryStore::new()),
        };
        Self::new(store, settings)
    }

    // ── Refresh ─────────────────────────────────────────────────────

    /// Refetch the newest purchases and rebuild the purchase ledger.
    /// Returns the number of ledger entries (items and totals).
    pub async fn refresh_purchases(&mut self) -> Result<usize, CoreError> {
        self.refresh(Collection::Purchases).await
    }

    /// Refetch the newest incomes and rebuild the income ledger.
    pub async fn refresh_incomes(&mut self) -> Result<usize, CoreError> {
        self.refresh(Collection::Incomes).await
    }

    // ── Purchases ───────────────────────────────────────────────────

    /// Store a new purchase and add it to the ledger.
    /// Returns the index of its day's total row.
    pub async fn add_purchase(&mut self, item: LineItem) -> Result<usize, CoreError> {
        self.add(Collection::Purchases, item).await
    }

    /// Delete the purchase at `position` remotely, then locally.
    pub async fn delete_purchase_at(&mut self, position: usize) -> Result<LineItem, CoreError> {
        self.delete_at(Collection::Purchases, position).await
    }

    /// Overwrite the purchase at `position`. The item keeps its id.
    pub async fn edit_purchase_at(
        &mut self,
        position: usize,
        item: LineItem,
    ) -> Result<usize, CoreError> {
        self.edit_at(Collection::Purchases, position, item).await
    }

    // ── Incomes ─────────────────────────────────────────────────────

    /// Store a new income and add it to the ledger.
    /// Returns the index of its year's total row.
    pub async fn add_income(&mut self, item: LineItem) -> Result<usize, CoreError> {
        self.add(Collection::Incomes, item).await
    }

    pub async fn delete_income_at(&mut self, position: usize) -> Result<LineItem, CoreError> {
        self.delete_at(Collection::Incomes, position).await
    }

    pub async fn edit_income_at(
        &mut self,
        position: usize,
        item: LineItem,
    ) -> Result<usize, CoreError> {
        self.edit_at(Collection::Incomes, position, item).await
    }

    // ── Server-side aggregates ──────────────────────────────────────

    /// Number of stored purchases (not just the cached ones).
    pub async fn purchase_count(&self) -> Result<u64, CoreError> {
        self.store
            .count_records(Collection::Purchases)
            .await
            .map_err(|e| self.remote_failure("count_records", e))
    }

    pub async fn income_count(&self) -> Result<u64, CoreError> {
        self.store
            .count_records(Collection::Incomes)
            .await
            .map_err(|e| self.remote_failure("count_records", e))
    }

    /// Sum of every stored purchase.
    pub async fn remote_total(&self) -> Result<f64, CoreError> {
        self.remote_sum(DateFilter::All).await
    }

    /// Sum of today's stored purchases.
    pub async fn remote_today_total(&self) -> Result<f64, CoreError> {
        self.remote_sum(DateFilter::Day(self.today())).await
    }

    /// Sum of this month's stored purchases.
    pub async fn remote_month_total(&self) -> Result<f64, CoreError> {
        self.remote_sum(DateFilter::month_of(self.today())).await
    }

    // ── Budget ──────────────────────────────────────────────────────

    /// Load the monthly budget from the store into the session.
    pub async fn fetch_monthly_budget(&mut self) -> Result<Budget, CoreError> {
        let monthly = self
            .store
            .get_monthly_budget()
            .await
            .map_err(|e| self.remote_failure("get_monthly_budget", e))?;
        self.budget = Budget::new(monthly);
        Ok(self.budget)
    }

    /// Persist a new monthly budget (0 clears it).
    /// Returns the previous value so the caller can offer an undo.
    pub async fn update_monthly_budget(&mut self, monthly: f64) -> Result<f64, CoreError> {
        self.budget_service.validate(monthly)?;
        self.store
            .set_monthly_budget(monthly)
            .await
            .map_err(|e| self.remote_failure("set_monthly_budget", e))?;
        let previous = self.budget.monthly;
        self.budget = Budget::new(monthly);
        info!(previous, monthly, "monthly budget updated");
        Ok(previous)
    }

    #[must_use]
    pub fn budget(&self) -> Budget {
        self.budget
    }

    #[must_use]
    pub fn budget_status(&self) -> BudgetStatus {
        self.budget_service
            .status(self.budget, &self.purchases, &self.incomes, self.today())
    }

    // ── Derived reads ───────────────────────────────────────────────

    #[must_use]
    pub fn purchases(&self) -> &LedgerView {
        &self.purchases
    }

    #[must_use]
    pub fn incomes(&self) -> &LedgerView {
        &self.incomes
    }

    /// Statistics over the cached purchase ledger.
    #[must_use]
    pub fn stats(&self) -> LedgerStats {
        self.stats_service.calculate(&self.purchases, self.today())
    }

    /// Trailing average of the cached daily totals, oldest point first.
    pub fn average_trend(&self) -> AverageTrend<'_> {
        self.trend_service.average_trend(&self.purchases)
    }

    // ── Settings & session ──────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_dynamic_color(&mut self, enabled: bool) {
        self.settings.dynamic_color = enabled;
    }

    #[must_use]
    pub fn is_dynamic_color(&self) -> bool {
        self.settings.dynamic_color
    }

    /// Set how many records a refresh fetches.
    pub fn set_fetch_limit(&mut self, limit: usize) -> Result<(), CoreError> {
        if limit == 0 {
            return Err(CoreError::ValidationError(
                "fetch_limit must be at least 1".into(),
            ));
        }
        self.settings.fetch_limit = limit;
        Ok(())
    }

    /// Discard every cached ledger and the cached budget.
    pub fn logout(&mut self) {
        self.purchases.clear();
        self.incomes.clear();
        self.budget = Budget::default();
        info!(store = self.store.name(), "session cache discarded");
    }

    // ── Internal ────────────────────────────────────────────────────

    fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn ledger_mut(&mut self, collection: Collection) -> &mut LedgerView {
        match collection {
            Collection::Purchases => &mut self.purchases,
            Collection::Incomes => &mut self.incomes,
        }
    }

    fn ledger(&self, collection: Collection) -> &LedgerView {
        match collection {
            Collection::Purchases => &self.purchases,
            Collection::Incomes => &self.incomes,
        }
    }

    fn remote_failure(&self, operation: &str, e: CoreError) -> CoreError {
        warn!(
            store = self.store.name(),
            operation,
            error = %e,
            "remote call failed, local cache left unchanged"
        );
        e
    }

    async fn remote_sum(&self, filter: DateFilter) -> Result<f64, CoreError> {
        self.store
            .sum_prices(Collection::Purchases, filter)
            .await
            .map_err(|e| self.remote_failure("sum_prices", e))
    }

    async fn refresh(&mut self, collection: Collection) -> Result<usize, CoreError> {
        let records = self
            .store
            .fetch_ordered_batch(collection, self.settings.fetch_limit)
            .await
            .map_err(|e| self.remote_failure("fetch_ordered_batch", e))?;

        let granularity = collection.granularity();
        let mut items = Vec::with_capacity(records.len());
        for stored in records {
            let id = stored.id.clone();
            match stored.record.into_line_item(stored.id, granularity) {
                Ok(item) => items.push(item),
                Err(e) => warn!(collection = %collection, id, error = %e, "skipping record"),
            }
        }

        let ledger = self.ledger_mut(collection);
        ledger.rebuild_from_batch(items);
        let len = ledger.len();
        info!(collection = %collection, entries = len, "ledger refreshed");
        Ok(len)
    }

    async fn add(&mut self, collection: Collection, item: LineItem) -> Result<usize, CoreError> {
        Self::validate_new_item(&item)?;
        let record = RawRecord::from_line_item(&item);
        let id = self
            .store
            .add_record(collection, &record)
            .await
            .map_err(|e| self.remote_failure("add_record", e))?;

        let total_idx = self.ledger_mut(collection).insert(item.with_id(id))?;
        debug!(collection = %collection, total_idx, "item added");
        Ok(total_idx)
    }

    async fn delete_at(
        &mut self,
        collection: Collection,
        position: usize,
    ) -> Result<LineItem, CoreError> {
        let id = self.line_item_id(collection, position)?;
        self.store
            .delete_record(collection, &id)
            .await
            .map_err(|e| self.remote_failure("delete_record", e))?;
        self.ledger_mut(collection).delete_at(position)
    }

    async fn edit_at(
        &mut self,
        collection: Collection,
        position: usize,
        item: LineItem,
    ) -> Result<usize, CoreError> {
        Self::validate_new_item(&item)?;
        let id = self.line_item_id(collection, position)?;
        let record = RawRecord::from_line_item(&item);
        self.store
            .update_record(collection, &id, &record)
            .await
            .map_err(|e| self.remote_failure("update_record", e))?;
        self.ledger_mut(collection)
            .replace_at(position, item.with_id(id))
    }

    /// Id of the real item at `position`, checked before any remote call.
    fn line_item_id(&self, collection: Collection, position: usize) -> Result<String, CoreError> {
        let ledger = self.ledger(collection);
        match ledger.get(position) {
            None => Err(CoreError::InvalidPosition {
                position,
                len: ledger.len(),
            }),
            Some(entry) if entry.is_total() => Err(CoreError::NotALineItem(position)),
            Some(entry) => Ok(entry.id.clone()),
        }
    }

    fn validate_new_item(item: &LineItem) -> Result<(), CoreError> {
        if item.is_total() {
            return Err(CoreError::ValidationError(
                "total rows are derived and cannot be stored".into(),
            ));
        }
        if !item.price.is_finite() {
            return Err(CoreError::ValidationError(
                "price must be a finite amount".into(),
            ));
        }
        if item.name.trim().is_empty() {
            return Err(CoreError::ValidationError("name must not be empty".into()));
        }
        Ok(())
    }
}
