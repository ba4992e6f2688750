// Finora CLI - offline reports from a transaction CSV export
//
// The web app owns day-to-day tracking; this binary answers "how am I doing"
// from an exported CSV without touching the hosted backend.

use std::env;
use std::path::Path;

use anyhow::{bail, Context, Result};

use finora::aggregates::{monthly_aggregates, MonthKey};
use finora::alerts::evaluate_alerts;
use finora::entities::default_categories;
use finora::export::{load_transactions_csv, render_html_report, ReportBundle};
use finora::health::{health_score, ScoreOptions};
use finora::money::format_amount;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("report") => run_report(&args[2..]),
        Some("html") => run_html(&args[2..]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("Finora - personal finance reports");
    println!();
    println!("Usage:");
    println!("  finora report <transactions.csv> [emergency_fund]");
    println!("  finora html <transactions.csv> <out.html> [emergency_fund]");
    println!();
    println!("The CSV is the export format of the web app:");
    println!("  Date,Name,Category,Type,Amount,Note");
}

fn parse_fund(arg: Option<&String>) -> Result<f64> {
    match arg {
        Some(raw) => finora::money::parse_lenient(raw)
            .with_context(|| format!("Unreadable emergency fund amount: {:?}", raw)),
        None => Ok(0.0),
    }
}

fn run_report(args: &[String]) -> Result<()> {
    let Some(csv_path) = args.first() else {
        bail!("Usage: finora report <transactions.csv> [emergency_fund]");
    };
    let fund = parse_fund(args.get(1))?;

    println!("📂 Loading transactions...");
    let categories = default_categories();
    let transactions = load_transactions_csv(Path::new(csv_path), "local", &categories)?;
    println!("✓ Loaded {} transactions", transactions.len());

    let months = monthly_aggregates(&transactions);
    if months.is_empty() {
        println!("\nNothing to report - the file has no transactions.");
        return Ok(());
    }

    // Monthly table
    println!("\n📊 Monthly overview");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{:<10} {:>12} {:>12} {:>12}", "Month", "Income", "Expenses", "Net");
    for m in &months {
        println!(
            "{:<10} {:>12} {:>12} {:>12}",
            m.month.label(),
            format_amount(m.income),
            format_amount(m.expenses),
            format_amount(m.net())
        );
    }

    // Health score
    let options = ScoreOptions {
        emergency_fund_amount: fund,
        lookback_months: 6,
    };
    let report = health_score(&months, &options);

    println!("\n💚 {}", report.summary());
    println!("   income vs expenses   {:>5.1}", report.breakdown.income_vs_expenses);
    println!("   savings rate         {:>5.1}", report.breakdown.savings_rate);
    println!("   spending consistency {:>5.1}", report.breakdown.spending_consistency);
    println!("   income volatility    {:>5.1}", report.breakdown.volatility);
    println!("   emergency buffer     {:>5.1}", report.breakdown.emergency_buffer);

    if !report.insights.is_empty() {
        println!("\n💡 Insights");
        for insight in &report.insights {
            println!("   • {}", insight);
        }
    }

    // Alerts for the newest month
    let latest: MonthKey = months.last().map(|m| m.month).unwrap();
    let alerts = evaluate_alerts(&transactions, &categories, latest);
    println!("\n🔔 Alerts for {}", latest.label());
    for alert in &alerts {
        println!("   [{:?}] {}", alert.severity, alert.message);
    }

    Ok(())
}

fn run_html(args: &[String]) -> Result<()> {
    let (Some(csv_path), Some(out_path)) = (args.first(), args.get(1)) else {
        bail!("Usage: finora html <transactions.csv> <out.html> [emergency_fund]");
    };
    let fund = parse_fund(args.get(2))?;

    println!("📂 Loading transactions...");
    let categories = default_categories();
    let transactions = load_transactions_csv(Path::new(csv_path), "local", &categories)?;
    println!("✓ Loaded {} transactions", transactions.len());

    let months = monthly_aggregates(&transactions);
    let options = ScoreOptions {
        emergency_fund_amount: fund,
        lookback_months: 6,
    };
    let report = health_score(&months, &options);
    let alerts = months
        .last()
        .map(|m| evaluate_alerts(&transactions, &categories, m.month))
        .unwrap_or_default();

    let bundle = ReportBundle {
        title: "Finora Report".to_string(),
        transactions: &transactions,
        categories: &categories,
        months: &months,
        health: &report,
        alerts: &alerts,
    };

    let html = render_html_report(&bundle);
    std::fs::write(out_path, html).with_context(|| format!("Failed to write {}", out_path))?;
    println!("✓ Report written to {}", out_path);

    Ok(())
}
