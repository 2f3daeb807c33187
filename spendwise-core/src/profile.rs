//! User profile figures the analytics need: income and savings goal.

use serde::{Deserialize, Serialize};

/// Income assumed for monthly insights when the user never entered one.
pub const DEFAULT_MONTHLY_INCOME: f64 = 2000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct UserProfile {
    #[serde(default)]
    pub monthly_income: f64,
    #[serde(default)]
    pub savings_goal: f64,
}

impl UserProfile {
    pub fn new(monthly_income: f64, savings_goal: f64) -> Self {
        Self {
            monthly_income: monthly_income.max(0.0),
            savings_goal: savings_goal.max(0.0),
        }
    }

    /// Income used for the spending-limit check: the stored figure, or
    /// [`DEFAULT_MONTHLY_INCOME`] when none was recorded.
    pub fn insight_income(&self) -> f64 {
        if self.monthly_income > 0.0 {
            self.monthly_income
        } else {
            DEFAULT_MONTHLY_INCOME
        }
    }
}
