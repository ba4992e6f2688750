// 💳 Transaction Entity - a single income or expense entry
//
// Rows come from the hosted `transactions` table. Local validation stops at
// "amount is a finite number" and "kind is income|expense"; everything else
// (ownership, category foreign key) is enforced by the external database.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// TRANSACTION KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// Parse from a loose string ("income", "Expense", "EXPENSE")
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(TransactionKind::Income),
            "expense" => Some(TransactionKind::Expense),
            _ => None,
        }
    }
}

// ============================================================================
// TRANSACTION ENTITY
// ============================================================================

/// Transaction record mirrored from the `transactions` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Stable identity (UUID string)
    pub id: String,

    /// Owning user (UUID string from the hosted auth service)
    pub user_id: String,

    /// Category foreign key, if assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,

    /// Short label, e.g. "Weekly groceries"
    pub name: String,

    /// Amount in the account currency, always positive; `kind` carries the
    /// direction
    pub amount: f64,

    /// Income or expense
    pub kind: TransactionKind,

    /// Date the transaction happened
    pub date: NaiveDate,

    /// Free-form note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Server-side insert timestamp, present on rows read back from the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Create a new transaction with a fresh UUID
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        amount: f64,
        kind: TransactionKind,
        date: NaiveDate,
    ) -> Self {
        Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            category_id: None,
            name: name.into(),
            amount,
            kind,
            date,
            note: None,
            created_at: None,
        }
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    /// Amount with sign: income positive, expense negative
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount.abs(),
            TransactionKind::Expense => -self.amount.abs(),
        }
    }

    /// True if the transaction falls in the given calendar month
    pub fn in_month(&self, year: i32, month: u32) -> bool {
        self.date.year() == year && self.date.month() == month
    }

    /// Local validation only: amount finite and non-negative.
    /// Kind validity is already guaranteed by the enum.
    pub fn validate(&self) -> Result<(), String> {
        if !self.amount.is_finite() {
            return Err(format!("amount is not a number: {}", self.amount));
        }
        if self.amount < 0.0 {
            return Err(format!("amount must not be negative: {}", self.amount));
        }
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        Ok(())
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
    fn test_kind_parse() {
        assert_eq!(TransactionKind::parse("income"), Some(TransactionKind::Income));
        assert_eq!(TransactionKind::parse(" Expense "), Some(TransactionKind::Expense));
        assert_eq!(TransactionKind::parse("EXPENSE"), Some(TransactionKind::Expense));
        assert_eq!(TransactionKind::parse("transfer"), None);
    }

    #[test]
    fn test_signed_amount() {
        let income = Transaction::new("u1", "Salary", 3000.0, TransactionKind::Income, date(2025, 3, 1));
        let expense = Transaction::new("u1", "Rent", 1200.0, TransactionKind::Expense, date(2025, 3, 2));

        assert_eq!(income.signed_amount(), 3000.0);
        assert_eq!(expense.signed_amount(), -1200.0);
    }

    #[test]
    fn test_in_month() {
        let tx = Transaction::new("u1", "Rent", 1200.0, TransactionKind::Expense, date(2025, 3, 31));

        assert!(tx.in_month(2025, 3));
        assert!(!tx.in_month(2025, 4));
        assert!(!tx.in_month(2024, 3));
    }

    #[test]
    fn test_validate_rejects_bad_amounts() {
        let mut tx = Transaction::new("u1", "Rent", 1200.0, TransactionKind::Expense, date(2025, 3, 1));
        assert!(tx.validate().is_ok());

        tx.amount = f64::NAN;
        assert!(tx.validate().is_err());

        tx.amount = -5.0;
        assert!(tx.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let tx = Transaction::new("u1", "   ", 10.0, TransactionKind::Expense, date(2025, 3, 1));
        assert!(tx.validate().is_err());
    }

    #[test]
    fn test_serde_round_trip_keeps_date() {
        let tx = Transaction::new("u1", "Rent", 1200.0, TransactionKind::Expense, date(2025, 3, 1));
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();

        assert_eq!(back.date, date(2025, 3, 1));
        assert_eq!(back.kind, TransactionKind::Expense);
    }
}
