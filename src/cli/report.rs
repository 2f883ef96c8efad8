use chrono::Months;
use colored::Colorize;
use comfy_table::{Cell, Table};

use super::{home_currency, month_or_current, open_db};
use crate::error::{FinlightError, Result};
use crate::fmt::{money, parse_month};
use crate::reports::{self, SpendingItem};

fn month_parts(month: Option<&str>) -> Result<(Option<i32>, Option<u32>)> {
    match month {
        Some(raw) => {
            let (y, m) = parse_month(raw)
                .ok_or_else(|| FinlightError::Validation(format!("'{raw}' is not a YYYY-MM month")))?;
            Ok((Some(y), Some(m)))
        }
        None => Ok((None, None)),
    }
}

pub fn summary(
    month: Option<&str>,
    year: Option<i32>,
    from_date: Option<&str>,
    to_date: Option<&str>,
) -> Result<()> {
    let conn = open_db()?;
    let currency = home_currency();
    let (my, mm) = month_parts(month)?;
    let s = reports::get_summary(&conn, my.or(year), mm, from_date, to_date)?;

    let mut table = Table::new();
    table.set_header(vec!["", "Amount"]);
    table.add_row(vec![Cell::new("Income".green().bold()), Cell::new(money(s.total_income, &currency))]);
    table.add_row(vec![Cell::new("Expenses".red().bold()), Cell::new(money(s.total_expenses, &currency))]);
    let net_label = if s.net >= 0.0 { "Net".green().bold() } else { "Net".red().bold() };
    table.add_row(vec![Cell::new(net_label), Cell::new(money(s.net, &currency))]);
    table.add_row(vec![Cell::new("Transactions"), Cell::new(s.count)]);
    println!("Summary\n{table}");
    Ok(())
}

fn print_spending(title: &str, label: &str, items: &[SpendingItem], currency: &str) {
    if items.is_empty() {
        println!("No expenses found.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![label, "Amount", "%", "Count"]);
    for item in items {
        table.add_row(vec![
            Cell::new(&item.name),
            Cell::new(money(item.total, currency)),
            Cell::new(format!("{:.1}%", item.pct)),
            Cell::new(item.count),
        ]);
    }
    let total: f64 = items.iter().map(|i| i.total).sum();
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(total, currency)),
        Cell::new(""),
        Cell::new(""),
    ]);
    println!("{title}\n{table}");
}

pub fn categories(month: Option<&str>) -> Result<()> {
    let conn = open_db()?;
    let (year, m) = month_or_current(month)?;
    let items = reports::category_spending(&conn, year, m)?;
    print_spending(
        &format!("Spending by category {year:04}-{m:02}"),
        "Category",
        &items,
        &home_currency(),
    );
    Ok(())
}

pub fn merchants(month: Option<&str>) -> Result<()> {
    let conn = open_db()?;
    let (year, m) = month_or_current(month)?;
    let items = reports::merchant_spending(&conn, year, m)?;
    print_spending(
        &format!("Spending by merchant {year:04}-{m:02}"),
        "Merchant",
        &items,
        &home_currency(),
    );
    Ok(())
}

pub fn trend(since: Option<&str>) -> Result<()> {
    let conn = open_db()?;
    let currency = home_currency();
    let since = match since {
        Some(raw) => chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|_| FinlightError::Validation(format!("'{raw}' is not a YYYY-MM-DD date")))?,
        None => {
            let today = chrono::Local::now().date_naive();
            today.checked_sub_months(Months::new(12)).unwrap_or(today)
        }
    };
    let months = reports::monthly_trend(&conn, &since.format("%Y-%m-%d").to_string())?;

    let mut table = Table::new();
    table.set_header(vec!["Month", "Income", "Expenses", "Net"]);
    for m in &months {
        let net = m.income - m.expenses;
        let net_str = if net >= 0.0 {
            money(net, &currency).green().to_string()
        } else {
            money(net, &currency).red().to_string()
        };
        table.add_row(vec![
            Cell::new(&m.month),
            Cell::new(money(m.income, &currency)),
            Cell::new(money(m.expenses, &currency)),
            Cell::new(net_str),
        ]);
    }
    println!("Monthly trend\n{table}");
    Ok(())
}
