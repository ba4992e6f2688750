// 💚 Financial Health Score - weighted heuristics over monthly aggregates
//
// Five sub-scores, each a piecewise-linear clamp between a "bad" and a "good"
// threshold on a derived ratio:
//
//   income-vs-expenses  30%  expense ratio (expenses / income)
//   savings-rate        25%  savings / income
//   spending-consistency 20% coefficient of variation of monthly expenses
//   volatility          15%  coefficient of variation of monthly income
//   emergency-buffer    10%  emergency fund / average monthly expenses
//
// Final score = round(Σ weight·sub), clamped to [0, 100]. Deterministic and
// side-effect free; the delta against the previous month re-runs the same
// function on the window that excludes the newest month.

use serde::{Deserialize, Serialize};

use crate::aggregates::MonthlyAggregate;
use crate::money::format_amount;

// ============================================================================
// WEIGHTS & THRESHOLDS
// ============================================================================

pub const WEIGHT_INCOME_VS_EXPENSES: f64 = 0.30;
pub const WEIGHT_SAVINGS_RATE: f64 = 0.25;
pub const WEIGHT_SPENDING_CONSISTENCY: f64 = 0.20;
pub const WEIGHT_VOLATILITY: f64 = 0.15;
pub const WEIGHT_EMERGENCY_BUFFER: f64 = 0.10;

/// Scoring thresholds. `good` earns 100, `bad` earns 0, linear in between.
/// For ratio-style metrics lower is better; for rate/buffer higher is better.
#[derive(Debug, Clone)]
pub struct Thresholds {
    /// expenses/income: at or below → 100
    pub expense_ratio_good: f64,
    /// expenses/income: at or above → 0
    pub expense_ratio_bad: f64,

    /// savings/income: at or above → 100
    pub savings_rate_good: f64,
    /// savings/income: at or below → 0
    pub savings_rate_bad: f64,

    /// expense CV: at or below → 100
    pub expense_cv_good: f64,
    /// expense CV: at or above → 0
    pub expense_cv_bad: f64,

    /// income CV: at or below → 100
    pub income_cv_good: f64,
    /// income CV: at or above → 0
    pub income_cv_bad: f64,

    /// buffer months: at or above → 100
    pub buffer_months_good: f64,
    /// buffer months: at or below → 0
    pub buffer_months_bad: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            expense_ratio_good: 0.70,
            expense_ratio_bad: 1.00,
            savings_rate_good: 0.20,
            savings_rate_bad: 0.00,
            expense_cv_good: 0.15,
            expense_cv_bad: 0.60,
            income_cv_good: 0.10,
            income_cv_bad: 0.60,
            buffer_months_good: 6.0,
            buffer_months_bad: 0.0,
        }
    }
}

// ============================================================================
// OPTIONS & REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreOptions {
    /// Cash set aside for emergencies, used by the buffer sub-score
    #[serde(default)]
    pub emergency_fund_amount: f64,

    /// Number of most-recent months the ratios and CVs are computed over
    #[serde(default = "default_lookback")]
    pub lookback_months: usize,
}

fn default_lookback() -> usize {
    6
}

impl Default for ScoreOptions {
    fn default() -> Self {
        ScoreOptions {
            emergency_fund_amount: 0.0,
            lookback_months: default_lookback(),
        }
    }
}

/// Raw sub-scores, each in [0, 100] before weighting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub income_vs_expenses: f64,
    pub savings_rate: f64,
    pub spending_consistency: f64,
    pub volatility: f64,
    pub emergency_buffer: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Weighted score, rounded, clamped to [0, 100]
    pub score: u32,

    pub breakdown: ScoreBreakdown,

    /// Rule-based textual insights, worst findings first
    pub insights: Vec<String>,

    /// Score minus the score of the window without the newest month;
    /// `None` when fewer than two months exist
    pub delta_from_previous_month: Option<i32>,
}

impl HealthReport {
    /// One-line summary for logs and the CLI
    pub fn summary(&self) -> String {
        match self.delta_from_previous_month {
            Some(delta) => format!("Health score: {}/100 ({:+} vs previous month)", self.score, delta),
            None => format!("Health score: {}/100", self.score),
        }
    }
}

// ============================================================================
// SCORER
// ============================================================================

pub struct HealthScorer {
    thresholds: Thresholds,
}

impl HealthScorer {
    pub fn new() -> Self {
        HealthScorer {
            thresholds: Thresholds::default(),
        }
    }

    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        HealthScorer { thresholds }
    }

    /// Score an ordered (oldest-first) sequence of monthly aggregates.
    ///
    /// An empty sequence scores 0 with a single "no history" insight.
    pub fn score(&self, months: &[MonthlyAggregate], options: &ScoreOptions) -> HealthReport {
        if months.is_empty() {
            return HealthReport {
                score: 0,
                breakdown: ScoreBreakdown {
                    income_vs_expenses: 0.0,
                    savings_rate: 0.0,
                    spending_consistency: 0.0,
                    volatility: 0.0,
                    emergency_buffer: 0.0,
                },
                insights: vec!["No transaction history yet - log a few months to get a score.".to_string()],
                delta_from_previous_month: None,
            };
        }

        let breakdown = self.breakdown_for(months, options);
        let score = weighted_total(&breakdown);
        let insights = self.insights_for(months, options, &breakdown);

        // Delta: same scorer on the window without the newest month
        let delta_from_previous_month = if months.len() >= 2 {
            let prior = &months[..months.len() - 1];
            let prior_breakdown = self.breakdown_for(prior, options);
            let prior_score = weighted_total(&prior_breakdown);
            Some(score as i32 - prior_score as i32)
        } else {
            None
        };

        HealthReport {
            score,
            breakdown,
            insights,
            delta_from_previous_month,
        }
    }

    fn breakdown_for(&self, months: &[MonthlyAggregate], options: &ScoreOptions) -> ScoreBreakdown {
        let window = lookback_window(months, options.lookback_months);
        let t = &self.thresholds;

        let avg_income = mean(window.iter().map(|m| m.income));
        let avg_expenses = mean(window.iter().map(|m| m.expenses));

        // income-vs-expenses: expense ratio, lower is better. No income at
        // all is scored as the worst case.
        let income_vs_expenses = match expense_ratio(avg_income, avg_expenses) {
            Some(ratio) => clamp_lower_better(ratio, t.expense_ratio_good, t.expense_ratio_bad),
            None => 0.0,
        };

        // savings-rate: explicit savings when tracked, income − expenses
        // otherwise, higher is better
        let savings_rate = match savings_rate(window, avg_income, avg_expenses) {
            Some(rate) => clamp_higher_better(rate, t.savings_rate_good, t.savings_rate_bad),
            None => 0.0,
        };

        // spending-consistency: CV of monthly expenses, lower is better.
        // Zero average spending means perfectly consistent.
        let spending_consistency = match coefficient_of_variation(window.iter().map(|m| m.expenses)) {
            Some(cv) => clamp_lower_better(cv, t.expense_cv_good, t.expense_cv_bad),
            None => 100.0,
        };

        // volatility: CV of monthly income, lower is better. No income at
        // all scores worst.
        let volatility = match coefficient_of_variation(window.iter().map(|m| m.income)) {
            Some(cv) => clamp_lower_better(cv, t.income_cv_good, t.income_cv_bad),
            None => 0.0,
        };

        // emergency-buffer: months of average spending the fund covers.
        // No spending means any fund lasts forever.
        let emergency_buffer = if avg_expenses > 0.0 {
            let buffer_months = options.emergency_fund_amount / avg_expenses;
            clamp_higher_better(buffer_months, t.buffer_months_good, t.buffer_months_bad)
        } else {
            100.0
        };

        ScoreBreakdown {
            income_vs_expenses,
            savings_rate,
            spending_consistency,
            volatility,
            emergency_buffer,
        }
    }

    fn insights_for(
        &self,
        months: &[MonthlyAggregate],
        options: &ScoreOptions,
        breakdown: &ScoreBreakdown,
    ) -> Vec<String> {
        let window = lookback_window(months, options.lookback_months);
        let t = &self.thresholds;
        let mut insights = Vec::new();

        let avg_income = mean(window.iter().map(|m| m.income));
        let avg_expenses = mean(window.iter().map(|m| m.expenses));

        match expense_ratio(avg_income, avg_expenses) {
            Some(ratio) if ratio >= 1.0 => insights.push(format!(
                "Spending ({}) meets or exceeds income ({}) - you are not keeping any of what you earn.",
                format_amount(avg_expenses),
                format_amount(avg_income)
            )),
            Some(ratio) if ratio > t.expense_ratio_good => insights.push(format!(
                "Expenses take {:.0}% of income - aim for {:.0}% or less.",
                ratio * 100.0,
                t.expense_ratio_good * 100.0
            )),
            Some(_) => insights.push("Spending sits comfortably below income - keep it up.".to_string()),
            None => insights.push("No income recorded in the lookback window.".to_string()),
        }

        if let Some(rate) = savings_rate(window, avg_income, avg_expenses) {
            if rate >= t.savings_rate_good {
                insights.push(format!("Strong savings rate of {:.0}% of income.", rate * 100.0));
            } else if rate < 0.10 {
                insights.push(format!(
                    "Savings rate is {:.0}% - building toward 20% gives you more room.",
                    (rate.max(0.0)) * 100.0
                ));
            }
        }

        if avg_expenses > 0.0 {
            let buffer_months = options.emergency_fund_amount / avg_expenses;
            if buffer_months < 3.0 {
                insights.push(format!(
                    "Emergency fund covers {:.1} months of spending - 3 to 6 months is the usual target.",
                    buffer_months
                ));
            }
        }

        if breakdown.spending_consistency < 50.0 {
            insights.push("Spending swings a lot month to month - recurring budgets can smooth it out.".to_string());
        }

        if breakdown.volatility < 50.0 && avg_income > 0.0 {
            insights.push("Income varies widely between months - a larger buffer helps bridge lean ones.".to_string());
        }

        insights
    }
}

impl Default for HealthScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience wrapper over `HealthScorer` with default thresholds
pub fn health_score(months: &[MonthlyAggregate], options: &ScoreOptions) -> HealthReport {
    HealthScorer::new().score(months, options)
}

// ============================================================================
// SCORING PRIMITIVES
// ============================================================================

fn lookback_window(months: &[MonthlyAggregate], lookback: usize) -> &[MonthlyAggregate] {
    let lookback = lookback.max(1);
    if months.len() > lookback {
        &months[months.len() - lookback..]
    } else {
        months
    }
}

fn weighted_total(b: &ScoreBreakdown) -> u32 {
    let total = b.income_vs_expenses * WEIGHT_INCOME_VS_EXPENSES
        + b.savings_rate * WEIGHT_SAVINGS_RATE
        + b.spending_consistency * WEIGHT_SPENDING_CONSISTENCY
        + b.volatility * WEIGHT_VOLATILITY
        + b.emergency_buffer * WEIGHT_EMERGENCY_BUFFER;
    total.round().clamp(0.0, 100.0) as u32
}

/// Piecewise-linear clamp where values at or below `good` earn 100 and
/// values at or above `bad` earn 0
fn clamp_lower_better(value: f64, good: f64, bad: f64) -> f64 {
    if value <= good {
        100.0
    } else if value >= bad {
        0.0
    } else {
        100.0 * (bad - value) / (bad - good)
    }
}

/// Piecewise-linear clamp where values at or above `good` earn 100 and
/// values at or below `bad` earn 0
fn clamp_higher_better(value: f64, good: f64, bad: f64) -> f64 {
    if value >= good {
        100.0
    } else if value <= bad {
        0.0
    } else {
        100.0 * (value - bad) / (good - bad)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn expense_ratio(avg_income: f64, avg_expenses: f64) -> Option<f64> {
    if avg_income > 0.0 {
        Some(avg_expenses / avg_income)
    } else {
        None
    }
}

/// Window savings rate: average explicit savings when any month tracks
/// them, (income − expenses) / income otherwise
fn savings_rate(window: &[MonthlyAggregate], avg_income: f64, avg_expenses: f64) -> Option<f64> {
    if avg_income <= 0.0 {
        return None;
    }
    if window.iter().any(|m| m.savings.is_some()) {
        let avg_savings = mean(window.iter().map(|m| m.effective_savings()));
        Some(avg_savings / avg_income)
    } else {
        Some((avg_income - avg_expenses) / avg_income)
    }
}

/// Population coefficient of variation (σ/μ); `None` when the mean is zero
/// or negative
fn coefficient_of_variation(values: impl Iterator<Item = f64> + Clone) -> Option<f64> {
    let mu = mean(values.clone());
    if mu <= 0.0 {
        return None;
    }
    let variance = mean(values.map(|v| (v - mu) * (v - mu)));
    Some(variance.sqrt() / mu)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::MonthKey;

    fn month(y: i32, m: u32, income: f64, expenses: f64) -> MonthlyAggregate {
        MonthlyAggregate::new(MonthKey::new(y, m), income, expenses)
    }

    fn steady(income: f64, expenses: f64, count: u32) -> Vec<MonthlyAggregate> {
        (1..=count).map(|m| month(2025, m, income, expenses)).collect()
    }

    #[test]
    fn test_score_always_within_bounds() {
        let cases: Vec<Vec<MonthlyAggregate>> = vec![
            vec![],
            steady(0.0, 0.0, 3),
            steady(0.0, 5000.0, 6),
            steady(10000.0, 0.0, 6),
            steady(3000.0, 2900.0, 12),
            vec![month(2025, 1, 1e9, 1e9), month(2025, 2, 0.0, 1e9)],
        ];

        for months in cases {
            for fund in [0.0, 1000.0, 1e7] {
                let options = ScoreOptions {
                    emergency_fund_amount: fund,
                    lookback_months: 6,
                };
                let report = health_score(&months, &options);
                assert!(report.score <= 100, "score {} out of range", report.score);
            }
        }
    }

    #[test]
    fn test_expense_ratio_at_or_below_good_threshold_scores_100() {
        // 70% expense ratio exactly
        let report = health_score(&steady(1000.0, 700.0, 3), &ScoreOptions::default());
        assert_eq!(report.breakdown.income_vs_expenses, 100.0);

        // Well below
        let report = health_score(&steady(1000.0, 200.0, 3), &ScoreOptions::default());
        assert_eq!(report.breakdown.income_vs_expenses, 100.0);
    }

    #[test]
    fn test_expense_ratio_above_bad_threshold_scores_0() {
        let report = health_score(&steady(1000.0, 1200.0, 3), &ScoreOptions::default());
        assert_eq!(report.breakdown.income_vs_expenses, 0.0);
    }

    #[test]
    fn test_expense_ratio_linear_between_thresholds() {
        // ratio 0.85 is halfway between 0.70 and 1.00
        let report = health_score(&steady(1000.0, 850.0, 3), &ScoreOptions::default());
        assert!((report.breakdown.income_vs_expenses - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_savings_rate_at_or_above_20_percent_scores_100() {
        // Derived savings: (1000 - 800) / 1000 = 0.20
        let report = health_score(&steady(1000.0, 800.0, 3), &ScoreOptions::default());
        assert_eq!(report.breakdown.savings_rate, 100.0);

        // Explicit savings: 300 / 1000 = 0.30
        let mut months = steady(1000.0, 900.0, 3);
        for m in &mut months {
            m.savings = Some(300.0);
        }
        let report = health_score(&months, &ScoreOptions::default());
        assert_eq!(report.breakdown.savings_rate, 100.0);
    }

    #[test]
    fn test_single_month_has_no_delta() {
        let report = health_score(&steady(3000.0, 1500.0, 1), &ScoreOptions::default());
        assert_eq!(report.delta_from_previous_month, None);

        let report = health_score(&steady(3000.0, 1500.0, 2), &ScoreOptions::default());
        assert!(report.delta_from_previous_month.is_some());
    }

    #[test]
    fn test_delta_reflects_a_bad_new_month() {
        let mut months = steady(3000.0, 1500.0, 5);
        months.push(month(2025, 6, 3000.0, 3500.0));

        let report = health_score(&months, &ScoreOptions::default());
        let delta = report.delta_from_previous_month.unwrap();
        assert!(delta < 0, "expected a drop, got {:+}", delta);
    }

    #[test]
    fn test_more_income_never_lowers_the_score() {
        // Hold expenses fixed, add income uniformly across the window
        let base: Vec<MonthlyAggregate> = vec![
            month(2025, 1, 2800.0, 2300.0),
            month(2025, 2, 3100.0, 2500.0),
            month(2025, 3, 2900.0, 2700.0),
            month(2025, 4, 3000.0, 2400.0),
        ];
        let options = ScoreOptions {
            emergency_fund_amount: 4000.0,
            lookback_months: 6,
        };

        let mut previous = health_score(&base, &options).score;
        for bump in [100.0, 250.0, 500.0, 1000.0, 2500.0, 10000.0] {
            let raised: Vec<MonthlyAggregate> = base
                .iter()
                .map(|m| MonthlyAggregate::new(m.month, m.income + bump, m.expenses))
                .collect();
            let score = health_score(&raised, &options).score;
            assert!(
                score >= previous,
                "score fell from {} to {} after +{} income",
                previous,
                score,
                bump
            );
            previous = score;
        }
    }

    #[test]
    fn test_emergency_buffer_thresholds() {
        // 6 months of average spending on hand → 100
        let report = health_score(
            &steady(3000.0, 1000.0, 3),
            &ScoreOptions {
                emergency_fund_amount: 6000.0,
                lookback_months: 6,
            },
        );
        assert_eq!(report.breakdown.emergency_buffer, 100.0);

        // Nothing on hand → 0
        let report = health_score(&steady(3000.0, 1000.0, 3), &ScoreOptions::default());
        assert_eq!(report.breakdown.emergency_buffer, 0.0);

        // 3 months → halfway
        let report = health_score(
            &steady(3000.0, 1000.0, 3),
            &ScoreOptions {
                emergency_fund_amount: 3000.0,
                lookback_months: 6,
            },
        );
        assert!((report.breakdown.emergency_buffer - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_steady_months_score_perfect_consistency() {
        let report = health_score(&steady(3000.0, 1500.0, 6), &ScoreOptions::default());
        assert_eq!(report.breakdown.spending_consistency, 100.0);
        assert_eq!(report.breakdown.volatility, 100.0);
    }

    #[test]
    fn test_erratic_spending_lowers_consistency() {
        let months = vec![
            month(2025, 1, 3000.0, 500.0),
            month(2025, 2, 3000.0, 4000.0),
            month(2025, 3, 3000.0, 300.0),
            month(2025, 4, 3000.0, 3500.0),
        ];
        let report = health_score(&months, &ScoreOptions::default());
        assert!(report.breakdown.spending_consistency < 50.0);
    }

    #[test]
    fn test_lookback_window_limits_history() {
        // Terrible early year, clean recent months; lookback 3 should only
        // see the clean ones
        let mut months = steady(1000.0, 2000.0, 9);
        months.extend([
            month(2025, 10, 5000.0, 1000.0),
            month(2025, 11, 5000.0, 1000.0),
            month(2025, 12, 5000.0, 1000.0),
        ]);

        let narrow = health_score(
            &months,
            &ScoreOptions {
                emergency_fund_amount: 0.0,
                lookback_months: 3,
            },
        );
        assert_eq!(narrow.breakdown.income_vs_expenses, 100.0);
    }

    #[test]
    fn test_no_income_scores_worst_on_income_metrics() {
        let report = health_score(&steady(0.0, 1000.0, 3), &ScoreOptions::default());
        assert_eq!(report.breakdown.income_vs_expenses, 0.0);
        assert_eq!(report.breakdown.savings_rate, 0.0);
        assert_eq!(report.breakdown.volatility, 0.0);
    }

    #[test]
    fn test_empty_history_reports_zero_with_insight() {
        let report = health_score(&[], &ScoreOptions::default());
        assert_eq!(report.score, 0);
        assert_eq!(report.delta_from_previous_month, None);
        assert_eq!(report.insights.len(), 1);
    }

    #[test]
    fn test_overspending_produces_critical_insight() {
        let report = health_score(&steady(2000.0, 2500.0, 3), &ScoreOptions::default());
        assert!(report
            .insights
            .iter()
            .any(|i| i.contains("meets or exceeds income")));
    }

    #[test]
    fn test_summary_includes_delta_when_present() {
        let report = health_score(&steady(3000.0, 1500.0, 3), &ScoreOptions::default());
        assert!(report.summary().contains("/100"));
        assert!(report.summary().contains("vs previous month"));
    }
}
