use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::bucket::{BucketKey, Granularity};

/// Spending category of a purchase. Incomes carry no category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Rent,
    Groceries,
    Transportation,
    Dining,
    Personal,
    Family,
    Entertainment,
    Health,
    Other,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 9] = [
        Category::Rent,
        Category::Groceries,
        Category::Transportation,
        Category::Dining,
        Category::Personal,
        Category::Family,
        Category::Entertainment,
        Category::Health,
        Category::Other,
    ];

    /// Wire name, as stored in the document database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Rent => "rent",
            Category::Groceries => "groceries",
            Category::Transportation => "transportation",
            Category::Dining => "dining",
            Category::Personal => "personal",
            Category::Family => "family",
            Category::Entertainment => "entertainment",
            Category::Health => "health",
            Category::Other => "other",
        }
    }

    /// Parse a wire name (case-insensitive).
    pub fn parse(s: &str) -> Option<Category> {
        let lower = s.trim().to_lowercase();
        Category::ALL.into_iter().find(|c| c.as_str() == lower)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Rent => write!(f, "Rent"),
            Category::Groceries => write!(f, "Groceries"),
            Category::Transportation => write!(f, "Transportation"),
            Category::Dining => write!(f, "Dining"),
            Category::Personal => write!(f, "Personal"),
            Category::Family => write!(f, "Family"),
            Category::Entertainment => write!(f, "Entertainment"),
            Category::Health => write!(f, "Health"),
            Category::Other => write!(f, "Other"),
        }
    }
}

/// Distinguishes a user-entered record from a synthetic bucket total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Real,
    Total,
}

/// Display name given to every synthetic total row.
pub const TOTAL_NAME: &str = "TOTAL";

/// A single row of a ledger: either a purchase/income or a bucket total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Backend-assigned id for real items, bucket-derived id for totals.
    /// Empty until the store has accepted a new item.
    pub id: String,

    pub name: String,

    /// Signed amount. Purchases are positive costs.
    pub price: f64,

    /// Calendar day. For incomes only the year is significant.
    pub date: NaiveDate,

    #[serde(default)]
    pub category: Option<Category>,

    pub kind: ItemKind,
}

impl LineItem {
    /// A new purchase, not yet stored (empty id).
    pub fn purchase(
        name: impl Into<String>,
        price: f64,
        date: NaiveDate,
        category: Category,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            price,
            date,
            category: Some(category),
            kind: ItemKind::Real,
        }
    }

    /// A new income, not yet stored (empty id).
    pub fn income(name: impl Into<String>, price: f64, date: NaiveDate) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            price,
            date,
            category: None,
            kind: ItemKind::Real,
        }
    }

    /// The synthetic total row owning `key`.
    pub fn total(key: BucketKey, price: f64) -> Self {
        Self {
            id: key.total_id(),
            name: TOTAL_NAME.to_string(),
            price,
            date: key.date(),
            category: None,
            kind: ItemKind::Total,
        }
    }

    /// Same item with the given id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn is_total(&self) -> bool {
        self.kind == ItemKind::Total
    }

    pub fn bucket_key(&self, granularity: Granularity) -> BucketKey {
        BucketKey::new(self.date, granularity)
    }
}
