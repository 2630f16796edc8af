use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::ledger::bucket::Granularity;

/// The two record collections kept per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Purchases,
    Incomes,
}

impl Collection {
    /// Collection id in the document database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Purchases => "payments",
            Collection::Incomes => "incomes",
        }
    }

    /// Purchases are bucketed per day, incomes per year.
    pub fn granularity(&self) -> Granularity {
        match self {
            Collection::Purchases => Granularity::Daily,
            Collection::Incomes => Granularity::Yearly,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Date restriction for server-side aggregate queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFilter {
    All,
    Day(NaiveDate),
    Month { year: i32, month: u32 },
    Year(i32),
}

impl DateFilter {
    /// The month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        DateFilter::Month {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            DateFilter::All => true,
            DateFilter::Day(d) => d == date,
            DateFilter::Month { year, month } => date.year() == year && date.month() == month,
            DateFilter::Year(year) => date.year() == year,
        }
    }

    /// Equality constraints on the `year`/`month`/`day` document fields.
    pub fn field_equalities(&self) -> Vec<(&'static str, i64)> {
        match *self {
            DateFilter::All => Vec::new(),
            DateFilter::Day(d) => vec![
                ("day", i64::from(d.day())),
                ("month", i64::from(d.month())),
                ("year", i64::from(d.year())),
            ],
            DateFilter::Month { year, month } => {
                vec![("month", i64::from(month)), ("year", i64::from(year))]
            }
            DateFilter::Year(year) => vec![("year", i64::from(year))],
        }
    }
}
