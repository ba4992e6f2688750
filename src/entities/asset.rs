// 🏭 Asset Entity - depreciating assets with straight-line schedules
//
// Straight-line depreciation: constant annual depreciation = cost × rate.
// Net book value (NBV) = cost − accumulated depreciation, floored at the
// salvage value. The schedule generator emits one line per year until NBV
// reaches salvage (or zero when no salvage value is set).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// ============================================================================
// ASSET ENTITY
// ============================================================================

/// Asset record mirrored from the `assets` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Stable identity (UUID string)
    pub id: String,

    /// Owning user
    pub user_id: String,

    /// Asset name, e.g. "Laptop", "Car"
    pub name: String,

    /// Purchase cost
    pub cost: f64,

    pub purchase_date: NaiveDate,

    /// Annual depreciation rate as a fraction of cost (0.20 = 20% per year)
    pub depreciation_rate: f64,

    /// Value the asset never depreciates below; defaults to zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salvage_value: Option<f64>,
}

/// One year of a straight-line depreciation schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationLine {
    /// Calendar year the line covers
    pub year: i32,

    /// NBV at the start of the year
    pub opening_value: f64,

    /// Depreciation charged this year (truncated in the final year so the
    /// closing value never drops below salvage)
    pub depreciation: f64,

    /// Accumulated depreciation through the end of the year
    pub accumulated: f64,

    /// NBV at the end of the year
    pub closing_value: f64,
}

impl Asset {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        cost: f64,
        purchase_date: NaiveDate,
        depreciation_rate: f64,
    ) -> Self {
        Asset {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            cost,
            purchase_date,
            depreciation_rate,
            salvage_value: None,
        }
    }

    pub fn with_salvage(mut self, salvage_value: f64) -> Self {
        self.salvage_value = Some(salvage_value);
        self
    }

    /// Salvage floor, treating an unset value as zero
    pub fn salvage_floor(&self) -> f64 {
        self.salvage_value.unwrap_or(0.0).max(0.0)
    }

    /// Constant annual depreciation charge (cost × rate)
    pub fn annual_depreciation(&self) -> f64 {
        self.cost * self.depreciation_rate
    }

    /// Full straight-line schedule, one line per calendar year starting with
    /// the purchase year.
    ///
    /// A non-positive rate or cost at/below salvage yields an empty schedule
    /// (the asset never depreciates).
    pub fn depreciation_schedule(&self) -> Vec<DepreciationLine> {
        let mut lines = Vec::new();

        let annual = self.annual_depreciation();
        let floor = self.salvage_floor();
        if annual <= 0.0 || self.cost <= floor {
            return lines;
        }

        let mut opening = self.cost;
        let mut accumulated = 0.0;
        let mut year = self.purchase_date.year();

        while opening > floor {
            // Final year truncates so closing never undershoots salvage
            let charge = annual.min(opening - floor);
            accumulated += charge;
            let closing = opening - charge;

            lines.push(DepreciationLine {
                year,
                opening_value: opening,
                depreciation: charge,
                accumulated,
                closing_value: closing,
            });

            opening = closing;
            year += 1;
        }

        lines
    }

    /// Net book value at the end of the given calendar year
    pub fn nbv_at_year_end(&self, year: i32) -> f64 {
        if year < self.purchase_date.year() {
            return self.cost;
        }
        let years_held = (year - self.purchase_date.year() + 1) as f64;
        let accumulated = self.annual_depreciation() * years_held;
        (self.cost - accumulated).max(self.salvage_floor())
    }

    /// Current net book value as of `today`
    pub fn current_nbv(&self, today: NaiveDate) -> f64 {
        self.nbv_at_year_end(today.year() - 1).min(self.cost)
    }
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
    fn test_schedule_runs_to_zero_without_salvage() {
        let asset = Asset::new("u1", "Laptop", 1000.0, date(2024, 6, 1), 0.25);
        let schedule = asset.depreciation_schedule();

        assert_eq!(schedule.len(), 4);
        assert_eq!(schedule[0].year, 2024);
        assert_eq!(schedule[0].opening_value, 1000.0);
        assert_eq!(schedule[0].depreciation, 250.0);
        assert_eq!(schedule[3].closing_value, 0.0);
        assert_eq!(schedule[3].accumulated, 1000.0);
    }

    #[test]
    fn test_final_year_truncates_at_salvage() {
        let asset = Asset::new("u1", "Car", 10000.0, date(2024, 1, 1), 0.25).with_salvage(3000.0);
        let schedule = asset.depreciation_schedule();

        // 2500/year against 7000 of depreciable value: 2500, 2500, 2000
        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule[2].depreciation, 2000.0);
        assert_eq!(schedule[2].closing_value, 3000.0);

        // Closing values never undershoot salvage
        for line in &schedule {
            assert!(line.closing_value >= 3000.0 - 1e-9);
        }
    }

    #[test]
    fn test_zero_rate_yields_empty_schedule() {
        let asset = Asset::new("u1", "Land", 50000.0, date(2024, 1, 1), 0.0);
        assert!(asset.depreciation_schedule().is_empty());

        let negative = Asset::new("u1", "Land", 50000.0, date(2024, 1, 1), -0.1);
        assert!(negative.depreciation_schedule().is_empty());
    }

    #[test]
    fn test_cost_at_or_below_salvage_yields_empty_schedule() {
        let asset = Asset::new("u1", "Trinket", 100.0, date(2024, 1, 1), 0.2).with_salvage(100.0);
        assert!(asset.depreciation_schedule().is_empty());
    }

    #[test]
    fn test_schedule_lines_chain() {
        let asset = Asset::new("u1", "Printer", 900.0, date(2023, 3, 15), 0.40);
        let schedule = asset.depreciation_schedule();

        for pair in schedule.windows(2) {
            assert_eq!(pair[0].closing_value, pair[1].opening_value);
            assert_eq!(pair[1].year, pair[0].year + 1);
        }
    }

    #[test]
    fn test_nbv_at_year_end() {
        let asset = Asset::new("u1", "Laptop", 1000.0, date(2024, 6, 1), 0.25);

        assert_eq!(asset.nbv_at_year_end(2023), 1000.0);
        assert_eq!(asset.nbv_at_year_end(2024), 750.0);
        assert_eq!(asset.nbv_at_year_end(2025), 500.0);
        assert_eq!(asset.nbv_at_year_end(2030), 0.0);
    }

    #[test]
    fn test_nbv_respects_salvage_floor() {
        let asset = Asset::new("u1", "Car", 10000.0, date(2020, 1, 1), 0.30).with_salvage(2500.0);
        assert_eq!(asset.nbv_at_year_end(2030), 2500.0);
    }
}
