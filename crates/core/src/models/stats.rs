use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::format::format_date;

/// Summary statistics over the cached purchase ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerStats {
    /// Grand total divided by the number of day buckets
    pub day_average: f64,

    /// Grand total divided by the number of distinct months
    pub month_average: f64,

    /// Total of today's bucket (0 if there is none)
    pub today_total: f64,

    /// Sum of every bucket total
    pub grand_total: f64,

    /// Sum of the bucket totals falling in the current calendar month
    pub month_total: f64,

    pub rent_total: f64,
    pub groceries_total: f64,
    pub transport_total: f64,
}

/// One point of the trailing-average trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Day the point is labelled with
    pub date: NaiveDate,

    /// Average bucket total from the oldest bucket up to this point
    pub average: f64,
}

impl TrendPoint {
    /// `dd/MM/yyyy` label for chart axes.
    pub fn label(&self) -> String {
        format_date(self.date)
    }
}
