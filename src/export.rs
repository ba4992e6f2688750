// 📄 Report Export - CSV in/out and the printable HTML report
//
// CSV columns match what the web UI downloads: Date, Name, Category, Type,
// Amount, Note. Import is lenient about amounts (goes through the money
// parser) so re-importing a hand-edited file keeps working.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregates::{spending_by_category, MonthlyAggregate};
use crate::alerts::{Alert, Severity};
use crate::entities::{Category, Transaction, TransactionKind};
use crate::health::HealthReport;
use crate::money::{format_amount, parse_lenient};

// ============================================================================
// CSV ROW
// ============================================================================

/// One row of the export file
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: NaiveDate,

    #[serde(rename = "Name")]
    name: String,

    #[serde(rename = "Category")]
    category: String,

    #[serde(rename = "Type")]
    kind: String,

    #[serde(rename = "Amount")]
    amount: String,

    #[serde(rename = "Note")]
    note: String,
}

// ============================================================================
// CSV EXPORT / IMPORT
// ============================================================================

/// Serialize transactions to CSV, oldest first
pub fn transactions_to_csv(transactions: &[Transaction], categories: &[Category]) -> Result<String> {
    let names: HashMap<&str, &str> = categories
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by_key(|t| t.date);

    let mut writer = csv::Writer::from_writer(Vec::new());
    for tx in sorted {
        let category = tx
            .category_id
            .as_deref()
            .and_then(|id| names.get(id))
            .map_or("", |n| *n);

        writer
            .serialize(CsvRow {
                date: tx.date,
                name: tx.name.clone(),
                category: category.to_string(),
                kind: tx.kind.as_str().to_string(),
                amount: format!("{:.2}", tx.amount),
                note: tx.note.clone().unwrap_or_default(),
            })
            .context("Failed to serialize transaction row")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e))?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

/// Parse transactions from CSV text.
///
/// Category names are matched case-insensitively against the given
/// categories; unmatched names import as uncategorized. Amounts go through
/// the lenient money parser, so "$1,234.56" survives a spreadsheet round
/// trip.
pub fn transactions_from_csv(
    text: &str,
    user_id: &str,
    categories: &[Category],
) -> Result<Vec<Transaction>> {
    let ids_by_name: HashMap<String, &str> = categories
        .iter()
        .map(|c| (c.name.to_lowercase(), c.id.as_str()))
        .collect();

    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let mut transactions = Vec::new();

    for (i, result) in reader.deserialize().enumerate() {
        let row: CsvRow = result.with_context(|| format!("Failed to parse CSV row {}", i + 1))?;

        let amount = parse_lenient(&row.amount)
            .with_context(|| format!("Row {}: unreadable amount {:?}", i + 1, row.amount))?;

        // Explicit type column wins; otherwise a negative amount means expense
        let kind = TransactionKind::parse(&row.kind).unwrap_or_else(|| {
            if amount < 0.0 {
                TransactionKind::Expense
            } else {
                TransactionKind::Income
            }
        });

        let mut tx = Transaction::new(user_id, row.name, amount.abs(), kind, row.date);
        if let Some(id) = ids_by_name.get(&row.category.trim().to_lowercase()) {
            tx.category_id = Some((*id).to_string());
        }
        if !row.note.trim().is_empty() {
            tx.note = Some(row.note);
        }

        tx.validate().map_err(anyhow::Error::msg)
            .with_context(|| format!("Row {}: invalid transaction", i + 1))?;
        transactions.push(tx);
    }

    Ok(transactions)
}

/// Load transactions from a CSV file on disk (CLI path)
pub fn load_transactions_csv(
    path: &Path,
    user_id: &str,
    categories: &[Category],
) -> Result<Vec<Transaction>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read CSV file: {:?}", path))?;
    transactions_from_csv(&text, user_id, categories)
}

// ============================================================================
// HTML REPORT
// ============================================================================

/// Everything the printable report renders
pub struct ReportBundle<'a> {
    pub title: String,
    pub transactions: &'a [Transaction],
    pub categories: &'a [Category],
    pub months: &'a [MonthlyAggregate],
    pub health: &'a HealthReport,
    pub alerts: &'a [Alert],
}

/// Render the standalone printable HTML report
pub fn render_html_report(bundle: &ReportBundle<'_>) -> String {
    let mut html = String::new();

    html.push_str(&render_head(&bundle.title));
    html.push_str("<body>\n<div class=\"container\">\n");
    html.push_str(&format!(
        "<div class=\"header\"><h1>{}</h1><p class=\"score\">{}</p></div>\n",
        escape_html(&bundle.title),
        escape_html(&bundle.health.summary())
    ));

    html.push_str(&render_months_table(bundle.months));
    html.push_str(&render_category_table(bundle));
    html.push_str(&render_alerts(bundle.alerts));
    html.push_str(&render_insights(&bundle.health.insights));
    html.push_str(&render_transactions_table(bundle));

    html.push_str("<div class=\"footer\"><button onclick=\"window.print()\">Print</button></div>\n");
    html.push_str("</div>\n</body>\n</html>");
    html
}

fn render_head(title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{}</title>
<style>
body {{ font-family: -apple-system, 'Segoe UI', sans-serif; margin: 0; color: #1a202c; }}
.container {{ max-width: 900px; margin: 0 auto; padding: 24px; }}
.header h1 {{ margin-bottom: 4px; }}
.score {{ color: #4a5568; }}
h2 {{ border-bottom: 1px solid #e2e8f0; padding-bottom: 6px; margin-top: 28px; }}
table {{ width: 100%; border-collapse: collapse; font-size: 14px; }}
th, td {{ text-align: left; padding: 6px 10px; border-bottom: 1px solid #edf2f7; }}
td.num, th.num {{ text-align: right; }}
.warning {{ color: #b7791f; }}
.critical {{ color: #c53030; }}
.info {{ color: #4a5568; }}
.footer {{ margin-top: 32px; }}
@media print {{ .footer {{ display: none; }} }}
</style>
</head>
"#,
        escape_html(title)
    )
}

fn render_months_table(months: &[MonthlyAggregate]) -> String {
    let mut out = String::from("<h2>Monthly Overview</h2>\n<table>\n<tr><th>Month</th><th class=\"num\">Income</th><th class=\"num\">Expenses</th><th class=\"num\">Net</th></tr>\n");
    for m in months {
        out.push_str(&format!(
            "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>\n",
            m.month.label(),
            format_amount(m.income),
            format_amount(m.expenses),
            format_amount(m.net())
        ));
    }
    out.push_str("</table>\n");
    out
}

fn render_category_table(bundle: &ReportBundle<'_>) -> String {
    let breakdown = spending_by_category(bundle.transactions, bundle.categories);
    if breakdown.is_empty() {
        return String::new();
    }

    let mut out = String::from("<h2>Spending by Category</h2>\n<table>\n<tr><th>Category</th><th class=\"num\">Total</th></tr>\n");
    for spend in &breakdown {
        out.push_str(&format!(
            "<tr><td>{}</td><td class=\"num\">{}</td></tr>\n",
            escape_html(&spend.name),
            format_amount(spend.total)
        ));
    }
    out.push_str("</table>\n");
    out
}

fn render_alerts(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return String::new();
    }
    let mut out = String::from("<h2>Alerts</h2>\n<ul>\n");
    for alert in alerts {
        let class = match alert.severity {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        out.push_str(&format!(
            "<li class=\"{}\">{}</li>\n",
            class,
            escape_html(&alert.message)
        ));
    }
    out.push_str("</ul>\n");
    out
}

fn render_insights(insights: &[String]) -> String {
    if insights.is_empty() {
        return String::new();
    }
    let mut out = String::from("<h2>Insights</h2>\n<ul>\n");
    for insight in insights {
        out.push_str(&format!("<li>{}</li>\n", escape_html(insight)));
    }
    out.push_str("</ul>\n");
    out
}

fn render_transactions_table(bundle: &ReportBundle<'_>) -> String {
    let names: HashMap<&str, &str> = bundle
        .categories
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let mut sorted: Vec<&Transaction> = bundle.transactions.iter().collect();
    sorted.sort_by_key(|t| t.date);

    let mut out = String::from("<h2>Transactions</h2>\n<table>\n<tr><th>Date</th><th>Name</th><th>Category</th><th>Type</th><th class=\"num\">Amount</th></tr>\n");
    for tx in sorted {
        let category = tx
            .category_id
            .as_deref()
            .and_then(|id| names.get(id))
            .map_or("-", |n| *n);
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"num\">{}</td></tr>\n",
            tx.date,
            escape_html(&tx.name),
            escape_html(category),
            tx.kind.as_str(),
            format_amount(tx.signed_amount())
        ));
    }
    out.push_str("</table>\n");
    out
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::{monthly_aggregates, MonthKey};
    use crate::alerts::evaluate_alerts;
    use crate::entities::CategoryKind;
    use crate::health::{health_score, ScoreOptions};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> (Vec<Transaction>, Vec<Category>) {
        let groceries = Category::new("Groceries", CategoryKind::Expense);
        let txs = vec![
            Transaction::new("u1", "Salary", 3000.0, TransactionKind::Income, date(2025, 3, 1)),
            Transaction::new("u1", "Market", 120.50, TransactionKind::Expense, date(2025, 3, 4))
                .with_category(groceries.id.clone()),
        ];
        (txs, vec![groceries])
    }

    #[test]
    fn test_csv_export_has_header_and_rows() {
        let (txs, cats) = sample();
        let csv = transactions_to_csv(&txs, &cats).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Date,Name,Category,Type,Amount,Note");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("2025-03-01,Salary,,income,3000.00"));
        assert!(lines[2].contains("Groceries"));
        assert!(lines[2].contains("120.50"));
    }

    #[test]
    fn test_csv_import_matches_categories_by_name() {
        let cats = vec![Category::new("Groceries", CategoryKind::Expense)];
        let text = "Date,Name,Category,Type,Amount,Note\n\
                    2025-03-04,Market,groceries,expense,120.50,weekly run\n";

        let txs = transactions_from_csv(text, "u1", &cats).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].category_id.as_deref(), Some(cats[0].id.as_str()));
        assert_eq!(txs[0].amount, 120.50);
        assert_eq!(txs[0].note.as_deref(), Some("weekly run"));
    }

    #[test]
    fn test_csv_import_is_lenient_about_amounts_and_kind() {
        let text = "Date,Name,Category,Type,Amount,Note\n\
                    2025-03-04,Refund,,,\"$1,234.56\",\n\
                    2025-03-05,Cash out,,,-40.00,\n";

        let txs = transactions_from_csv(text, "u1", &[]).unwrap();
        assert_eq!(txs[0].kind, TransactionKind::Income);
        assert_eq!(txs[0].amount, 1234.56);
        // No type column and a negative amount: imported as expense
        assert_eq!(txs[1].kind, TransactionKind::Expense);
        assert_eq!(txs[1].amount, 40.0);
    }

    #[test]
    fn test_csv_import_rejects_unreadable_amount() {
        let text = "Date,Name,Category,Type,Amount,Note\n\
                    2025-03-04,Market,,expense,not-money,\n";

        let err = transactions_from_csv(text, "u1", &[]).unwrap_err();
        assert!(err.to_string().contains("Row 1"));
    }

    #[test]
    fn test_exported_csv_reimports() {
        let (txs, cats) = sample();
        let csv = transactions_to_csv(&txs, &cats).unwrap();
        let back = transactions_from_csv(&csv, "u1", &cats).unwrap();

        assert_eq!(back.len(), txs.len());
        assert_eq!(back[1].name, "Market");
        assert_eq!(back[1].category_id.as_deref(), Some(cats[0].id.as_str()));
    }

    #[test]
    fn test_html_report_renders_and_escapes() {
        let (mut txs, cats) = sample();
        txs[1].name = "Market <script>".to_string();

        let months = monthly_aggregates(&txs);
        let health = health_score(&months, &ScoreOptions::default());
        let alerts = evaluate_alerts(&txs, &cats, MonthKey::new(2025, 3));
        let bundle = ReportBundle {
            title: "March 2025 Report".to_string(),
            transactions: &txs,
            categories: &cats,
            months: &months,
            health: &health,
            alerts: &alerts,
        };

        let html = render_html_report(&bundle);
        assert!(html.contains("<h2>Monthly Overview</h2>"));
        assert!(html.contains("Market &lt;script&gt;"));
        assert!(!html.contains("Market <script>"));
        assert!(html.contains("window.print()"));
        assert!(html.contains("$3,000.00"));
    }
}
