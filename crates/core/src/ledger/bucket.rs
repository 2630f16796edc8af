use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// How line items are grouped under a total row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Granularity {
    /// One bucket per calendar day (purchases)
    Daily,
    /// One bucket per calendar year (incomes)
    Yearly,
}

/// Identifies the bucket a date falls into.
///
/// Keys order chronologically. Yearly keys are normalised to January 1st,
/// so two dates of the same year produce equal keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketKey {
    date: NaiveDate,
    granularity: Granularity,
}

impl BucketKey {
    pub fn new(date: NaiveDate, granularity: Granularity) -> Self {
        let date = match granularity {
            Granularity::Daily => date,
            Granularity::Yearly => date.with_ordinal(1).unwrap_or(date),
        };
        Self { date, granularity }
    }

    /// First day covered by the bucket.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Deterministic id of the bucket's total row: `"{day}_{month}_{year}"`
    /// for days, `"{year}"` for years.
    pub fn total_id(&self) -> String {
        match self.granularity {
            Granularity::Daily => format!(
                "{}_{}_{}",
                self.date.day(),
                self.date.month(),
                self.date.year()
            ),
            Granularity::Yearly => self.date.year().to_string(),
        }
    }
}

impl std::fmt::Display for BucketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.granularity {
            Granularity::Daily => write!(f, "{}", self.date.format("%Y-%m-%d")),
            Granularity::Yearly => write!(f, "{}", self.date.year()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yearly_keys_collapse_to_one_bucket() {
        let a = BucketKey::new(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(), Granularity::Yearly);
        let b = BucketKey::new(NaiveDate::from_ymd_opt(2024, 11, 30).unwrap(), Granularity::Yearly);
        assert_eq!(a, b);
        assert_eq!(a.total_id(), "2024");
    }

    #[test]
    fn daily_total_id_is_not_zero_padded() {
        let k = BucketKey::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), Granularity::Daily);
        assert_eq!(k.total_id(), "1_5_2024");
        assert_eq!(k.to_string(), "2024-05-01");
    }
}
