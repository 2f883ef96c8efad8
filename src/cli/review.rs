use colored::Colorize;
use comfy_table::{Cell, Table};
use dialoguer::{Confirm, Input};

use super::{home_currency, open_db};
use crate::error::Result;
use crate::fmt::money;
use crate::models::TransactionType;
use crate::reviewer::{apply_review, pending};

fn signed_money(amount: f64, kind: TransactionType, currency: &str) -> String {
    match kind {
        TransactionType::Income => money(amount, currency).green().to_string(),
        TransactionType::Expense => money(-amount, currency).red().to_string(),
    }
}

pub fn run() -> Result<()> {
    let conn = open_db()?;
    let queue = pending(&conn)?;

    if queue.is_empty() {
        println!("{}", "No transactions need review.".green());
        return Ok(());
    }

    let categories = crate::categories::list(&conn)?;
    let home = home_currency();
    println!("\n{} transactions to review\n", queue.len());

    let mut cat_table = Table::new();
    cat_table.set_header(vec!["#", "Name"]);
    for (i, cat) in categories.iter().enumerate() {
        cat_table.add_row(vec![Cell::new(i + 1), Cell::new(&cat.name)]);
    }
    println!("Categories\n{cat_table}\n");

    for row in &queue {
        let txn = &row.transaction;
        let currency = txn.currency_code.as_deref().unwrap_or(&home);
        println!("{}", "\u{2500}".repeat(60));
        println!("  Date:        {}", txn.date);
        println!("  Description: {}", txn.description);
        println!("  Amount:      {}", signed_money(txn.amount, txn.transaction_type, currency));
        println!("  Account:     {}", row.account_name);
        println!();

        let choice: String = Input::new()
            .with_prompt("Category # (or s=skip, q=quit)")
            .interact_text()
            .unwrap_or_else(|_| "s".to_string());

        match choice.trim().to_lowercase().as_str() {
            "q" => {
                println!("{}", "Review paused.".yellow());
                return Ok(());
            }
            "s" => continue,
            _ => {}
        }

        let cat = match choice.trim().parse::<usize>() {
            Ok(n) if n >= 1 && n <= categories.len() => &categories[n - 1],
            _ => {
                println!("{}", "Invalid choice, skipping.".red());
                continue;
            }
        };

        let description: String = Input::new()
            .with_prompt("Description (Enter to keep)")
            .default(String::new())
            .show_default(false)
            .interact_text()
            .unwrap_or_default();
        let description = Some(description.trim()).filter(|d| !d.is_empty());

        let learn = Confirm::new()
            .with_prompt(format!("Always file {} under {}?", txn.description, cat.name))
            .default(false)
            .interact()
            .unwrap_or(false);

        apply_review(&conn, txn.id, cat.id, description, learn)?;
        println!("{}", format!("\u{2192} Categorized as {}", cat.name).green());
        println!();
    }

    println!("{}", "Review complete!".green());
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let queue = pending(&conn)?;
    if queue.is_empty() {
        println!("{}", "No transactions need review.".green());
        return Ok(());
    }
    let home = home_currency();

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Amount", "Account"]);
    for row in &queue {
        let txn = &row.transaction;
        let currency = txn.currency_code.as_deref().unwrap_or(&home);
        table.add_row(vec![
            Cell::new(txn.id),
            Cell::new(&txn.date),
            Cell::new(&txn.description),
            Cell::new(signed_money(txn.amount, txn.transaction_type, currency)),
            Cell::new(&row.account_name),
        ]);
    }
    println!("Needs review\n{table}");
    Ok(())
}

pub fn apply(id: i64, category: &str, description: Option<&str>, learn: bool) -> Result<()> {
    let conn = open_db()?;
    let cat = crate::categories::require(&conn, category)?;
    apply_review(&conn, id, cat.id, description, learn)?;
    println!("{}", format!("\u{2192} #{id} categorized as {}", cat.name).green());
    Ok(())
}
