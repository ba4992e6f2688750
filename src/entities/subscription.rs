// 🔁 Subscription Entity - recurring charges with a billing cadence
//
// Rows come from the hosted `subscriptions` table. The cadence math here is
// what the dashboard needs: normalized monthly cost, annualized total, and
// which renewals fall due inside a window.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

// ============================================================================
// BILLING CADENCE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCadence {
    Monthly,
    Yearly,
}

impl BillingCadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCadence::Monthly => "monthly",
            BillingCadence::Yearly => "yearly",
        }
    }

    /// Calendar months between charges
    pub fn months(&self) -> u32 {
        match self {
            BillingCadence::Monthly => 1,
            BillingCadence::Yearly => 12,
        }
    }
}

// ============================================================================
// SUBSCRIPTION ENTITY
// ============================================================================

/// Subscription record mirrored from the `subscriptions` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Stable identity (UUID string)
    pub id: String,

    /// Owning user
    pub user_id: String,

    /// Service name, e.g. "Streaming Plus"
    pub name: String,

    /// Charge per billing period, always positive
    pub amount: f64,

    pub cadence: BillingCadence,

    /// Next date the charge lands
    pub next_billing_date: NaiveDate,

    /// Optional category label for spend breakdowns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Subscription {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        amount: f64,
        cadence: BillingCadence,
        next_billing_date: NaiveDate,
    ) -> Self {
        Subscription {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            amount,
            cadence,
            next_billing_date,
            category: None,
        }
    }

    /// Cost normalized to one month (yearly / 12)
    pub fn monthly_cost(&self) -> f64 {
        match self.cadence {
            BillingCadence::Monthly => self.amount,
            BillingCadence::Yearly => self.amount / 12.0,
        }
    }

    /// Cost over a full year
    pub fn annual_cost(&self) -> f64 {
        match self.cadence {
            BillingCadence::Monthly => self.amount * 12.0,
            BillingCadence::Yearly => self.amount,
        }
    }

    /// True if the next charge lands within `days` days of `today`
    /// (inclusive; already-overdue renewals count as due)
    pub fn renews_within(&self, today: NaiveDate, days: i64) -> bool {
        let delta = (self.next_billing_date - today).num_days();
        delta <= days
    }

    /// The billing date after `next_billing_date`.
    ///
    /// Month-end dates clamp the way calendars do (Jan 31 + 1 month = Feb 28/29).
    pub fn following_billing_date(&self) -> Option<NaiveDate> {
        self.next_billing_date
            .checked_add_months(Months::new(self.cadence.months()))
    }
}

/// Total monthly cost across a set of subscriptions
pub fn total_monthly_cost(subscriptions: &[Subscription]) -> f64 {
    subscriptions.iter().map(|s| s.monthly_cost()).sum()
}

/// Subscriptions renewing within `days` days, soonest first
pub fn upcoming_renewals(
    subscriptions: &[Subscription],
    today: NaiveDate,
    days: i64,
) -> Vec<Subscription> {
    let mut due: Vec<Subscription> = subscriptions
        .iter()
        .filter(|s| s.renews_within(today, days))
        .cloned()
        .collect();
    due.sort_by_key(|s| s.next_billing_date);
    due
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_cost_normalizes_yearly() {
        let monthly = Subscription::new("u1", "Music", 12.0, BillingCadence::Monthly, date(2025, 4, 1));
        let yearly = Subscription::new("u1", "Cloud", 120.0, BillingCadence::Yearly, date(2025, 4, 1));

        assert_eq!(monthly.monthly_cost(), 12.0);
        assert_eq!(yearly.monthly_cost(), 10.0);
        assert_eq!(monthly.annual_cost(), 144.0);
        assert_eq!(yearly.annual_cost(), 120.0);
    }

    #[test]
    fn test_renews_within_window() {
        let sub = Subscription::new("u1", "Music", 12.0, BillingCadence::Monthly, date(2025, 4, 10));
        let today = date(2025, 4, 1);

        assert!(sub.renews_within(today, 9));
        assert!(sub.renews_within(today, 30));
        assert!(!sub.renews_within(today, 8));
    }

    #[test]
    fn test_overdue_renewal_counts_as_due() {
        let sub = Subscription::new("u1", "Music", 12.0, BillingCadence::Monthly, date(2025, 3, 28));
        assert!(sub.renews_within(date(2025, 4, 1), 7));
    }

    #[test]
    fn test_following_billing_date_clamps_month_end() {
        let sub = Subscription::new("u1", "Gym", 30.0, BillingCadence::Monthly, date(2025, 1, 31));
        assert_eq!(sub.following_billing_date(), Some(date(2025, 2, 28)));

        let yearly = Subscription::new("u1", "Cloud", 120.0, BillingCadence::Yearly, date(2024, 2, 29));
        assert_eq!(yearly.following_billing_date(), Some(date(2025, 2, 28)));
    }

    #[test]
    fn test_upcoming_renewals_sorted_soonest_first() {
        let subs = vec![
            Subscription::new("u1", "B", 5.0, BillingCadence::Monthly, date(2025, 4, 20)),
            Subscription::new("u1", "A", 5.0, BillingCadence::Monthly, date(2025, 4, 3)),
            Subscription::new("u1", "C", 5.0, BillingCadence::Monthly, date(2025, 6, 1)),
        ];

        let due = upcoming_renewals(&subs, date(2025, 4, 1), 30);
        let names: Vec<&str> = due.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_total_monthly_cost() {
        let subs = vec![
            Subscription::new("u1", "Music", 12.0, BillingCadence::Monthly, date(2025, 4, 1)),
            Subscription::new("u1", "Cloud", 120.0, BillingCadence::Yearly, date(2025, 4, 1)),
        ];
        assert_eq!(total_monthly_cost(&subs), 22.0);
    }
}
