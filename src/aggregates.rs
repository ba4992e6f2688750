// 📊 Monthly Aggregation - rollups the dashboard, score, and alerts consume
//
// Everything here is a pure fold over transaction slices. The server calls
// these per request; the CLI calls them over an imported CSV.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::entities::{Category, Transaction};

// ============================================================================
// MONTH KEY
// ============================================================================

/// Calendar month identifier, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        MonthKey { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        MonthKey {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month before this one
    pub fn previous(&self) -> MonthKey {
        if self.month == 1 {
            MonthKey::new(self.year - 1, 12)
        } else {
            MonthKey::new(self.year, self.month - 1)
        }
    }

    /// "2025-03" style label used in API payloads and chart axes
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Parse a "2025-03" style label
    pub fn parse_label(label: &str) -> Option<MonthKey> {
        let (year, month) = label.trim().split_once('-')?;
        let year: i32 = year.parse().ok()?;
        let month: u32 = month.parse().ok()?;
        if (1..=12).contains(&month) {
            Some(MonthKey { year, month })
        } else {
            None
        }
    }
}

// ============================================================================
// MONTHLY AGGREGATE
// ============================================================================

/// One month of income/expense totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub month: MonthKey,
    pub income: f64,
    pub expenses: f64,

    /// Explicit savings for the month when the user tracks them; the health
    /// score falls back to income − expenses otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings: Option<f64>,
}

impl MonthlyAggregate {
    pub fn new(month: MonthKey, income: f64, expenses: f64) -> Self {
        MonthlyAggregate {
            month,
            income,
            expenses,
            savings: None,
        }
    }

    pub fn net(&self) -> f64 {
        self.income - self.expenses
    }

    /// Savings for the month: explicit if tracked, income − expenses
    /// (floored at zero) otherwise
    pub fn effective_savings(&self) -> f64 {
        self.savings.unwrap_or_else(|| self.net().max(0.0))
    }

    /// expenses / income; `None` when there was no income
    pub fn expense_ratio(&self) -> Option<f64> {
        if self.income > 0.0 {
            Some(self.expenses / self.income)
        } else {
            None
        }
    }

    /// savings / income; `None` when there was no income
    pub fn savings_rate(&self) -> Option<f64> {
        if self.income > 0.0 {
            Some(self.effective_savings() / self.income)
        } else {
            None
        }
    }
}

// ============================================================================
// ROLLUPS
// ============================================================================

/// Fold transactions into per-month aggregates, oldest month first.
/// Months with no transactions do not appear.
pub fn monthly_aggregates(transactions: &[Transaction]) -> Vec<MonthlyAggregate> {
    let mut by_month: HashMap<MonthKey, (f64, f64)> = HashMap::new();

    for tx in transactions {
        let entry = by_month.entry(MonthKey::from_date(tx.date)).or_insert((0.0, 0.0));
        if tx.is_income() {
            entry.0 += tx.amount.abs();
        } else {
            entry.1 += tx.amount.abs();
        }
    }

    let mut months: Vec<MonthlyAggregate> = by_month
        .into_iter()
        .map(|(month, (income, expenses))| MonthlyAggregate::new(month, income, expenses))
        .collect();
    months.sort_by_key(|m| m.month);
    months
}

/// Spending total for one category in a breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySpend {
    /// Category id, or `None` for uncategorized spending
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub name: String,
    pub total: f64,
}

/// Expense totals grouped by category, largest first.
/// Transactions without a known category land in "Uncategorized".
pub fn spending_by_category(
    transactions: &[Transaction],
    categories: &[Category],
) -> Vec<CategorySpend> {
    let names: HashMap<&str, &str> = categories
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let mut totals: HashMap<Option<String>, f64> = HashMap::new();
    for tx in transactions.iter().filter(|t| t.is_expense()) {
        let key = tx
            .category_id
            .as_deref()
            .filter(|id| names.contains_key(id))
            .map(|id| id.to_string());
        *totals.entry(key).or_insert(0.0) += tx.amount.abs();
    }

    let mut breakdown: Vec<CategorySpend> = totals
        .into_iter()
        .map(|(category_id, total)| {
            let name = category_id
                .as_deref()
                .and_then(|id| names.get(id))
                .map_or_else(|| "Uncategorized".to_string(), |n| (*n).to_string());
            CategorySpend {
                category_id,
                name,
                total,
            }
        })
        .collect();
    breakdown.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
    breakdown
}

/// Transactions for one calendar month
pub fn transactions_in_month(transactions: &[Transaction], month: MonthKey) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| t.in_month(month.year, month.month))
        .cloned()
        .collect()
}

/// Newest `limit` transactions, most recent date first
pub fn recent_transactions(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut sorted: Vec<Transaction> = transactions.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.truncate(limit);
    sorted
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CategoryKind, TransactionKind};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(name: &str, amount: f64, kind: TransactionKind, d: NaiveDate) -> Transaction {
        Transaction::new("u1", name, amount, kind, d)
    }

    #[test]
    fn test_month_key_ordering_and_previous() {
        assert!(MonthKey::new(2025, 1) > MonthKey::new(2024, 12));
        assert_eq!(MonthKey::new(2025, 1).previous(), MonthKey::new(2024, 12));
        assert_eq!(MonthKey::new(2025, 6).previous(), MonthKey::new(2025, 5));
        assert_eq!(MonthKey::new(2025, 3).label(), "2025-03");
    }

    #[test]
    fn test_month_key_parse_label() {
        assert_eq!(MonthKey::parse_label("2025-03"), Some(MonthKey::new(2025, 3)));
        assert_eq!(MonthKey::parse_label(" 2024-12 "), Some(MonthKey::new(2024, 12)));
        assert_eq!(MonthKey::parse_label("2025-13"), None);
        assert_eq!(MonthKey::parse_label("2025"), None);
        assert_eq!(MonthKey::parse_label("march"), None);
    }

    #[test]
    fn test_monthly_aggregates_split_by_month_and_kind() {
        let txs = vec![
            tx("Salary", 3000.0, TransactionKind::Income, date(2025, 2, 1)),
            tx("Rent", 1200.0, TransactionKind::Expense, date(2025, 2, 3)),
            tx("Salary", 3000.0, TransactionKind::Income, date(2025, 3, 1)),
            tx("Rent", 1200.0, TransactionKind::Expense, date(2025, 3, 3)),
            tx("Groceries", 400.0, TransactionKind::Expense, date(2025, 3, 10)),
        ];

        let months = monthly_aggregates(&txs);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, MonthKey::new(2025, 2));
        assert_eq!(months[0].income, 3000.0);
        assert_eq!(months[0].expenses, 1200.0);
        assert_eq!(months[1].expenses, 1600.0);
        assert_eq!(months[1].net(), 1400.0);
    }

    #[test]
    fn test_expense_ratio_and_savings_rate() {
        let agg = MonthlyAggregate::new(MonthKey::new(2025, 3), 3000.0, 1800.0);
        assert_eq!(agg.expense_ratio(), Some(0.6));
        assert_eq!(agg.savings_rate(), Some(0.4));

        let broke = MonthlyAggregate::new(MonthKey::new(2025, 3), 0.0, 500.0);
        assert_eq!(broke.expense_ratio(), None);
        assert_eq!(broke.savings_rate(), None);
    }

    #[test]
    fn test_explicit_savings_override() {
        let mut agg = MonthlyAggregate::new(MonthKey::new(2025, 3), 3000.0, 1800.0);
        agg.savings = Some(300.0);
        assert_eq!(agg.savings_rate(), Some(0.1));
    }

    #[test]
    fn test_spending_by_category_sorted_and_uncategorized() {
        let groceries = Category::new("Groceries", CategoryKind::Expense);
        let dining = Category::new("Dining", CategoryKind::Expense);

        let txs = vec![
            tx("Market", 300.0, TransactionKind::Expense, date(2025, 3, 2))
                .with_category(groceries.id.clone()),
            tx("Cafe", 40.0, TransactionKind::Expense, date(2025, 3, 4))
                .with_category(dining.id.clone()),
            tx("Market", 150.0, TransactionKind::Expense, date(2025, 3, 9))
                .with_category(groceries.id.clone()),
            tx("Cash", 60.0, TransactionKind::Expense, date(2025, 3, 12)),
            tx("Salary", 3000.0, TransactionKind::Income, date(2025, 3, 1)),
        ];

        let breakdown = spending_by_category(&txs, &[groceries.clone(), dining]);
        assert_eq!(breakdown.len(), 3);
        assert_eq!(breakdown[0].name, "Groceries");
        assert_eq!(breakdown[0].total, 450.0);
        assert!(breakdown.iter().any(|c| c.name == "Uncategorized" && c.total == 60.0));
    }

    #[test]
    fn test_unknown_category_id_falls_back_to_uncategorized() {
        let txs = vec![
            tx("Mystery", 25.0, TransactionKind::Expense, date(2025, 3, 2))
                .with_category("deleted-category-id"),
        ];
        let breakdown = spending_by_category(&txs, &[]);
        assert_eq!(breakdown[0].name, "Uncategorized");
    }

    #[test]
    fn test_recent_transactions_newest_first() {
        let txs = vec![
            tx("Old", 10.0, TransactionKind::Expense, date(2025, 1, 1)),
            tx("New", 10.0, TransactionKind::Expense, date(2025, 3, 1)),
            tx("Mid", 10.0, TransactionKind::Expense, date(2025, 2, 1)),
        ];

        let recent = recent_transactions(&txs, 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].name, "New");
        assert_eq!(recent[1].name, "Mid");
    }
}
