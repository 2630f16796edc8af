use chrono::{Datelike, NaiveDate};

use crate::ledger::view::LedgerView;
use crate::models::item::Category;
use crate::models::stats::LedgerStats;

/// Computes summary statistics from the cached purchase ledger.
///
/// Pure read over the current snapshot: bucket totals feed the averages and
/// period totals, real items feed the per-category sums.
pub struct StatsService;

impl StatsService {
    pub fn new() -> Self {
        Self
    }

    /// Single pass over the ledger.
    ///
    /// Every total row counts as one day, including today's empty anchor.
    /// Months are counted as distinct (year, month) runs in ledger order.
    pub fn calculate(&self, ledger: &LedgerView, today: NaiveDate) -> LedgerStats {
        let mut stats = LedgerStats::default();
        let mut days = 0usize;
        let mut months = 0usize;
        let mut last_month: Option<(i32, u32)> = None;

        for entry in ledger.entries() {
            if entry.is_total() {
                let (year, month) = (entry.date.year(), entry.date.month());
                if year == today.year() && month == today.month() {
                    stats.month_total += entry.price;
                    if entry.date == today {
                        stats.today_total = entry.price;
                    }
                }

                stats.grand_total += entry.price;
                days += 1;

                if last_month != Some((year, month)) {
                    last_month = Some((year, month));
                    months += 1;
                }
                continue;
            }

            match entry.category {
                Some(Category::Rent) => stats.rent_total += entry.price,
                Some(Category::Groceries) => stats.groceries_total += entry.price,
                Some(Category::Transportation) => stats.transport_total += entry.price,
                _ => {}
            }
        }

        stats.day_average = if days > 0 {
            stats.grand_total / days as f64
        } else {
            0.0
        };
        stats.month_average = if months > 0 {
            stats.grand_total / months as f64
        } else {
            0.0
        };
        stats
    }
}

impl Default for StatsService {
    fn default() -> Self {
        Self::new()
    }
}
