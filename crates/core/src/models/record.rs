use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::ledger::bucket::Granularity;

use super::item::{Category, ItemKind, LineItem};

/// A record as the document database stores it.
///
/// Every field is optional: documents written by older app versions may
/// lack some of them. This is the only place where missing values are
/// tolerated; `into_line_item` turns a record into a fully-populated
/// `LineItem` or rejects it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
}

impl RawRecord {
    /// Build the record to store for a line item. The id is not part of
    /// the document body.
    pub fn from_line_item(item: &LineItem) -> Self {
        Self {
            name: Some(item.name.clone()),
            price: Some(item.price),
            year: Some(item.date.year()),
            month: Some(item.date.month()),
            day: Some(item.date.day()),
            category: item.category.map(|c| c.as_str().to_string()),
        }
    }

    /// Convert into a real `LineItem`.
    ///
    /// A missing price becomes 0. A missing year is always an error; month
    /// and day are required for daily buckets and default to 1 for yearly
    /// ones. Unknown category names map to `Category::Other`.
    pub fn into_line_item(
        self,
        id: impl Into<String>,
        granularity: Granularity,
    ) -> Result<LineItem, CoreError> {
        let id = id.into();
        let year = self
            .year
            .ok_or_else(|| CoreError::MalformedRecord(format!("record {id} has no year")))?;

        let (month, day) = match granularity {
            Granularity::Daily => {
                let month = self.month.ok_or_else(|| {
                    CoreError::MalformedRecord(format!("record {id} has no month"))
                })?;
                let day = self
                    .day
                    .ok_or_else(|| CoreError::MalformedRecord(format!("record {id} has no day")))?;
                (month, day)
            }
            Granularity::Yearly => (self.month.unwrap_or(1), self.day.unwrap_or(1)),
        };

        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            CoreError::MalformedRecord(format!(
                "record {id} has an invalid date {year}-{month}-{day}"
            ))
        })?;

        let category = match granularity {
            Granularity::Daily => Some(
                self.category
                    .as_deref()
                    .and_then(Category::parse)
                    .unwrap_or(Category::Other),
            ),
            Granularity::Yearly => None,
        };

        Ok(LineItem {
            id,
            name: self.name.unwrap_or_default(),
            price: self.price.unwrap_or(0.0),
            date,
            category,
            kind: ItemKind::Real,
        })
    }
}

/// A record together with the id the store assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub record: RawRecord,
}

impl StoredRecord {
    pub fn new(id: impl Into<String>, record: RawRecord) -> Self {
        Self {
            id: id.into(),
            record,
        }
    }
}
