// 🎯 Savings Goal Entity

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Savings goal record mirrored from the `savings_goals` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoal {
    /// Stable identity (UUID string)
    pub id: String,

    /// Owning user
    pub user_id: String,

    pub name: String,

    /// Amount to reach
    pub target_amount: f64,

    /// Amount saved so far
    pub saved_amount: f64,

    /// Optional deadline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
}

impl SavingsGoal {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, target_amount: f64) -> Self {
        SavingsGoal {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            target_amount,
            saved_amount: 0.0,
            target_date: None,
        }
    }

    /// Progress as a fraction in [0, 1]; a zero target counts as complete
    pub fn progress(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 1.0;
        }
        (self.saved_amount / self.target_amount).clamp(0.0, 1.0)
    }

    /// Amount still to save, never negative
    pub fn remaining(&self) -> f64 {
        (self.target_amount - self.saved_amount).max(0.0)
    }

    pub fn is_complete(&self) -> bool {
        self.saved_amount >= self.target_amount
    }

    /// Required contribution per month to hit the target date.
    /// `None` when there is no deadline or the deadline has passed.
    pub fn monthly_contribution_needed(&self, today: NaiveDate) -> Option<f64> {
        let deadline = self.target_date?;
        if deadline <= today || self.is_complete() {
            return None;
        }
        let days_left = (deadline - today).num_days() as f64;
        let months_left = (days_left / 30.44).max(1.0); // average month length
        Some(self.remaining() / months_left)
    }
}
