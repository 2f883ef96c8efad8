use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};
use dialoguer::Confirm;

use super::open_db;
use crate::error::Result;
use crate::{backup, csv_import};

fn confirm(prompt: &str) -> bool {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}

pub fn json(file: &str, yes: bool) -> Result<()> {
    let conn = open_db()?;
    if !yes && !confirm("Replace ALL existing data with this export?") {
        println!("Cancelled.");
        return Ok(());
    }
    let snap = backup::import_json(&conn, Path::new(file))?;
    println!(
        "{}",
        format!(
            "Imported {} transactions, {} accounts, {} categories",
            snap.transactions.len(),
            snap.accounts.len(),
            snap.categories.len()
        )
        .green()
    );
    Ok(())
}

pub fn csv(file: &str, dry_run: bool, yes: bool) -> Result<()> {
    let conn = open_db()?;
    let report = csv_import::validate_csv(&conn, Path::new(file))?;

    let mut table = Table::new();
    table.set_header(vec!["Line", "Date", "Description", "Amount", "Status"]);
    for review in &report.rows {
        let raw = |name: &str| {
            report
                .header
                .iter()
                .position(|h| h == name)
                .and_then(|i| review.raw.get(i))
                .cloned()
                .unwrap_or_default()
        };
        let (date, description, amount) = match &review.row {
            Some(row) => (row.date.clone(), row.description.clone(), format!("{:.2}", row.amount)),
            None => (raw("Date"), raw("Description"), raw("Amount")),
        };
        let status = if review.status.is_importable() {
            review.status.message().green().to_string()
        } else {
            review.status.message().red().to_string()
        };
        table.add_row(vec![
            Cell::new(review.line),
            Cell::new(date),
            Cell::new(description),
            Cell::new(amount),
            Cell::new(status),
        ]);
    }
    println!("CSV validation\n{table}");
    println!("{} rows ready, {} will be skipped", report.importable(), report.skipped());

    if dry_run || report.importable() == 0 {
        return Ok(());
    }
    if !yes && !confirm("Import the ready rows?") {
        println!("Cancelled.");
        return Ok(());
    }
    let result = csv_import::commit(&conn, &report)?;
    println!(
        "{}",
        format!(
            "Imported {} transactions ({} split parts), {} skipped; created {} accounts, {} categories",
            result.transactions, result.splits, result.skipped, result.accounts_created, result.categories_created
        )
        .green()
    );
    Ok(())
}
