use colored::Colorize;
use comfy_table::{Cell, Table};

use super::{home_currency, month_or_current, open_db};
use crate::budgets;
use crate::error::Result;
use crate::fmt::money;

pub fn set(category: &str, amount: f64, month: Option<&str>) -> Result<()> {
    let conn = open_db()?;
    let (year, m) = month_or_current(month)?;
    budgets::set(&conn, category, amount, year, m)?;
    println!("Budget for {category} in {year:04}-{m:02}: {}", money(amount, &home_currency()));
    Ok(())
}

pub fn list(month: Option<&str>) -> Result<()> {
    let conn = open_db()?;
    let currency = home_currency();
    let (year, m) = month_or_current(month)?;
    let rows = budgets::list_for_month(&conn, year, m)?;
    if rows.is_empty() {
        println!("No budgets for {year:04}-{m:02}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Category", "Budget", "Spent", "Remaining"]);
    for status in &rows {
        let remaining = if status.is_over() {
            money(status.remaining(), &currency).red().to_string()
        } else {
            money(status.remaining(), &currency).green().to_string()
        };
        table.add_row(vec![
            Cell::new(&status.budget.category_name),
            Cell::new(money(status.budget.amount, &currency)),
            Cell::new(money(status.spent, &currency)),
            Cell::new(remaining),
        ]);
    }
    println!("Budgets {year:04}-{m:02}\n{table}");
    Ok(())
}

pub fn delete(category: &str, month: Option<&str>) -> Result<()> {
    let conn = open_db()?;
    let (year, m) = month_or_current(month)?;
    budgets::delete(&conn, category, year, m)?;
    println!("Deleted budget for {category} in {year:04}-{m:02}");
    Ok(())
}
