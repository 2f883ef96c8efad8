use colored::Colorize;
use comfy_table::{Cell, Table};
use dialoguer::Confirm;

use super::{home_currency, open_db};
use crate::accounts;
use crate::error::Result;
use crate::fmt::money;

pub fn add(name: &str, account_type: &str) -> Result<()> {
    let conn = open_db()?;
    let id = accounts::create(&conn, name, account_type)?;
    println!("Added account #{id}: {}", name.trim());
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let currency = home_currency();
    let rows = accounts::list_with_balance(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Type", "Balance"]);
    let mut total = 0.0;
    for (account, balance) in &rows {
        total += balance;
        let shown = if *balance < 0.0 {
            money(*balance, &currency).red().to_string()
        } else {
            money(*balance, &currency)
        };
        table.add_row(vec![
            Cell::new(account.id),
            Cell::new(&account.name),
            Cell::new(&account.account_type),
            Cell::new(shown),
        ]);
    }
    table.add_row(vec![
        Cell::new(""),
        Cell::new("Total".bold()),
        Cell::new(""),
        Cell::new(money(total, &currency)),
    ]);
    println!("Accounts\n{table}");
    Ok(())
}

pub fn balance(name: &str) -> Result<()> {
    let conn = open_db()?;
    let account = accounts::require(&conn, name)?;
    let value = accounts::balance(&conn, account.id)?;
    println!("{}: {}", account.name, money(value, &home_currency()));
    Ok(())
}

pub fn rename(name: &str, new_name: &str, account_type: Option<&str>) -> Result<()> {
    let conn = open_db()?;
    let account = accounts::require(&conn, name)?;
    accounts::rename(&conn, account.id, new_name, account_type)?;
    println!("Renamed {} to {}", account.name, new_name.trim());
    Ok(())
}

pub fn delete(name: &str, yes: bool) -> Result<()> {
    let conn = open_db()?;
    let account = accounts::require(&conn, name)?;
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {} and all of its transactions?", account.name))
            .default(false)
            .interact()
            .unwrap_or(false);
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }
    let removed = accounts::delete(&conn, account.id)?;
    println!("Deleted {} ({removed} transactions removed)", account.name);
    Ok(())
}
