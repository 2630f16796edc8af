use chrono::{Datelike, NaiveDate};

use crate::errors::CoreError;
use crate::ledger::bucket::{BucketKey, Granularity};
use crate::ledger::view::LedgerView;
use crate::models::budget::{Budget, BudgetStatus};
use crate::services::stats_service::StatsService;

/// Budget validation and month-to-date progress.
pub struct BudgetService {
    stats_service: StatsService,
}

impl BudgetService {
    pub fn new() -> Self {
        Self {
            stats_service: StatsService::new(),
        }
    }

    /// A budget must be a finite, non-negative amount (0 clears it).
    pub fn validate(&self, monthly: f64) -> Result<(), CoreError> {
        if !monthly.is_finite() || monthly < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Monthly budget must be a non-negative amount, got {monthly}"
            )));
        }
        Ok(())
    }

    /// Compare this month's purchases and this year's incomes to the budget.
    pub fn status(
        &self,
        budget: Budget,
        purchases: &LedgerView,
        incomes: &LedgerView,
        today: NaiveDate,
    ) -> BudgetStatus {
        let spent = self.stats_service.calculate(purchases, today).month_total;
        let year_key = BucketKey::new(today, Granularity::Yearly);
        let income_this_year = if incomes.granularity() == Granularity::Yearly {
            incomes.bucket_total(year_key).unwrap_or(0.0)
        } else {
            incomes
                .real_items()
                .filter(|i| i.date.year() == today.year())
                .map(|i| i.price)
                .sum()
        };

        BudgetStatus {
            monthly: budget.monthly,
            annual: budget.annual(),
            spent_this_month: spent,
            remaining: budget.remaining(spent),
            used_pct: if budget.is_set() {
                (spent / budget.monthly) * 100.0
            } else {
                0.0
            },
            income_this_year,
        }
    }
}

impl Default for BudgetService {
    fn default() -> Self {
        Self::new()
    }
}
