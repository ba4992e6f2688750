// 🏷️ Category Entity - labels for transactions plus optional monthly budgets
//
// Categories are user-owned rows in the hosted `categories` table. A category
// is either an income or an expense label; expense categories may carry a
// monthly budget that the alert evaluator checks against actual spending.

use serde::{Deserialize, Serialize};

// ============================================================================
// CATEGORY KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Expense category (money going out)
    Expense,

    /// Income category (money coming in)
    Income,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Expense => "expense",
            CategoryKind::Income => "income",
        }
    }
}

// ============================================================================
// CATEGORY ENTITY
// ============================================================================

/// Category record mirrored from the `categories` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Stable identity (UUID string)
    pub id: String,

    /// Category name (e.g. "Groceries", "Salary")
    pub name: String,

    /// Income or expense
    pub kind: CategoryKind,

    /// Optional icon for UI (e.g. "🛒")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Optional color for UI (e.g. "#4CAF50")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Monthly budget for this category, if the user set one.
    /// Only meaningful for expense categories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_budget: Option<f64>,
}

impl Category {
    /// Create a new category with a fresh UUID
    pub fn new(name: impl Into<String>, kind: CategoryKind) -> Self {
        Category {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            icon: None,
            color: None,
            monthly_budget: None,
        }
    }

    /// Create a category with icon and color for the UI
    pub fn with_display(
        name: impl Into<String>,
        kind: CategoryKind,
        icon: Option<String>,
        color: Option<String>,
    ) -> Self {
        let mut category = Self::new(name, kind);
        category.icon = icon;
        category.color = color;
        category
    }

    /// Attach a monthly budget (expense categories only; income budgets are
    /// accepted but ignored by the alert rules)
    pub fn with_budget(mut self, budget: f64) -> Self {
        self.monthly_budget = Some(budget);
        self
    }

    pub fn is_expense(&self) -> bool {
        self.kind == CategoryKind::Expense
    }

    pub fn is_income(&self) -> bool {
        self.kind == CategoryKind::Income
    }

    /// Budget set and usable by the overspend rules
    pub fn has_budget(&self) -> bool {
        self.is_expense() && self.monthly_budget.map_or(false, |b| b > 0.0)
    }
}

// ============================================================================
// DEFAULT SET
// ============================================================================

/// Starter categories seeded for a new user.
///
/// Mirrors what the hosted onboarding inserts; the CLI uses these when a CSV
/// row references a category name that has no row yet.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::with_display("Groceries", CategoryKind::Expense, Some("🛒".into()), Some("#4CAF50".into())),
        Category::with_display("Dining", CategoryKind::Expense, Some("🍽️".into()), Some("#FF5733".into())),
        Category::with_display("Transport", CategoryKind::Expense, Some("🚗".into()), Some("#2196F3".into())),
        Category::with_display("Housing", CategoryKind::Expense, Some("🏠".into()), Some("#795548".into())),
        Category::with_display("Utilities", CategoryKind::Expense, Some("💡".into()), Some("#FFC107".into())),
        Category::with_display("Entertainment", CategoryKind::Expense, Some("🎬".into()), Some("#9C27B0".into())),
        Category::with_display("Health", CategoryKind::Expense, Some("🏥".into()), Some("#F44336".into())),
        Category::with_display("Shopping", CategoryKind::Expense, Some("🛍️".into()), Some("#E91E63".into())),
        Category::with_display("Salary", CategoryKind::Income, Some("💼".into()), Some("#66BB6A".into())),
        Category::with_display("Freelance", CategoryKind::Income, Some("💻".into()), Some("#81C784".into())),
        Category::with_display("Other Income", CategoryKind::Income, Some("💰".into()), Some("#A5D6A7".into())),
    ]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_category_has_uuid() {
        let a = Category::new("Groceries", CategoryKind::Expense);
        let b = Category::new("Groceries", CategoryKind::Expense);

        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_kind_predicates() {
        let expense = Category::new("Dining", CategoryKind::Expense);
        let income = Category::new("Salary", CategoryKind::Income);

        assert!(expense.is_expense());
        assert!(!expense.is_income());
        assert!(income.is_income());
    }

    #[test]
    fn test_has_budget_requires_expense_and_positive_amount() {
        let budgeted = Category::new("Dining", CategoryKind::Expense).with_budget(300.0);
        let zero = Category::new("Dining", CategoryKind::Expense).with_budget(0.0);
        let unbudgeted = Category::new("Dining", CategoryKind::Expense);
        let income = Category::new("Salary", CategoryKind::Income).with_budget(300.0);

        assert!(budgeted.has_budget());
        assert!(!zero.has_budget());
        assert!(!unbudgeted.has_budget());
        assert!(!income.has_budget());
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&CategoryKind::Expense).unwrap();
        assert_eq!(json, "\"expense\"");

        let parsed: CategoryKind = serde_json::from_str("\"income\"").unwrap();
        assert_eq!(parsed, CategoryKind::Income);
    }

    #[test]
    fn test_default_categories_cover_both_kinds() {
        let defaults = default_categories();

        assert!(defaults.iter().any(|c| c.is_expense()));
        assert!(defaults.iter().any(|c| c.is_income()));
        assert!(defaults.iter().all(|c| !c.name.is_empty()));
    }
}
