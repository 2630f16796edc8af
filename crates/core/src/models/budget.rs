use serde::{Deserialize, Serialize};

/// The user's monthly spending budget. Zero means "no budget set".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub monthly: f64,
}

impl Budget {
    pub fn new(monthly: f64) -> Self {
        Self { monthly }
    }

    pub fn annual(&self) -> f64 {
        self.monthly * 12.0
    }

    /// What is left of this month's budget after `spent`. Negative when overspent.
    pub fn remaining(&self, spent: f64) -> f64 {
        self.monthly - spent
    }

    pub fn is_set(&self) -> bool {
        self.monthly > 0.0
    }
}

/// Where this month's spending stands against the budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub monthly: f64,
    pub annual: f64,

    /// Purchases recorded in the current calendar month
    pub spent_this_month: f64,

    /// `monthly - spent_this_month`; negative when overspent
    pub remaining: f64,

    /// Share of the monthly budget used, in percent. 0 when no budget is set.
    pub used_pct: f64,

    /// Incomes recorded in the current calendar year
    pub income_this_year: f64,
}
