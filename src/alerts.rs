// 🔔 Smart Alerts - fixed rule evaluation over one month of transactions
//
// A pure function: filter transactions to the requested month, run each rule,
// collect alerts. No state machine, no persistence - the server recomputes
// per request and the dashboard renders whatever comes back.

use serde::{Deserialize, Serialize};

use crate::aggregates::{transactions_in_month, MonthKey};
use crate::entities::{Category, Transaction};
use crate::money::format_amount;

// ============================================================================
// ALERT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no action needed
    Info,
    /// Worth a look
    Warning,
    /// Money is actively leaking
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Overspend,
    NoIncome,
    BudgetExceeded,
    NoActivity,
    Summary,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Overspend => "overspend",
            AlertKind::NoIncome => "no_income",
            AlertKind::BudgetExceeded => "budget_exceeded",
            AlertKind::NoActivity => "no_activity",
            AlertKind::Summary => "summary",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
}

impl Alert {
    fn new(kind: AlertKind, severity: Severity, message: String) -> Self {
        Alert {
            kind,
            severity,
            message,
        }
    }
}

// ============================================================================
// RULE EVALUATION
// ============================================================================

/// Evaluate the fixed alert rules for one calendar month.
///
/// Rules, in emission order:
/// 1. no activity (short-circuits the rest)
/// 2. overspend - month expenses exceed month income
/// 3. no income recorded
/// 4. per-category budget overruns (categories with a monthly budget)
/// 5. month summary
pub fn evaluate_alerts(
    transactions: &[Transaction],
    categories: &[Category],
    month: MonthKey,
) -> Vec<Alert> {
    let month_txs = transactions_in_month(transactions, month);
    let mut alerts = Vec::new();

    if month_txs.is_empty() {
        alerts.push(Alert::new(
            AlertKind::NoActivity,
            Severity::Info,
            format!("No transactions recorded for {}.", month.label()),
        ));
        return alerts;
    }

    let income: f64 = month_txs.iter().filter(|t| t.is_income()).map(|t| t.amount.abs()).sum();
    let expenses: f64 = month_txs.iter().filter(|t| t.is_expense()).map(|t| t.amount.abs()).sum();

    // Rule: overspend
    if expenses > income {
        let severity = if income > 0.0 && expenses > income * 1.25 {
            Severity::Critical
        } else {
            Severity::Warning
        };
        alerts.push(Alert::new(
            AlertKind::Overspend,
            severity,
            format!(
                "Spent {} against {} of income in {} - {} over.",
                format_amount(expenses),
                format_amount(income),
                month.label(),
                format_amount(expenses - income)
            ),
        ));
    }

    // Rule: no income recorded
    if income <= 0.0 {
        alerts.push(Alert::new(
            AlertKind::NoIncome,
            Severity::Warning,
            format!("No income recorded for {}.", month.label()),
        ));
    }

    // Rule: per-category budget overruns
    for category in categories.iter().filter(|c| c.has_budget()) {
        let budget = category.monthly_budget.unwrap_or(0.0);
        let spent: f64 = month_txs
            .iter()
            .filter(|t| t.is_expense() && t.category_id.as_deref() == Some(category.id.as_str()))
            .map(|t| t.amount.abs())
            .sum();

        if spent > budget {
            alerts.push(Alert::new(
                AlertKind::BudgetExceeded,
                Severity::Warning,
                format!(
                    "{} is over budget: {} spent of {} ({:.0}%).",
                    category.name,
                    format_amount(spent),
                    format_amount(budget),
                    spent / budget * 100.0
                ),
            ));
        }
    }

    // Rule: summary (always last)
    alerts.push(Alert::new(
        AlertKind::Summary,
        Severity::Info,
        format!(
            "{}: {} transactions, {} in, {} out, net {}.",
            month.label(),
            month_txs.len(),
            format_amount(income),
            format_amount(expenses),
            format_amount(income - expenses)
        ),
    ));

    alerts
}

// ============================================================================
// TESTS
// ============================================================================
