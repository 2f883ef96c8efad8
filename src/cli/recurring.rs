use colored::Colorize;
use comfy_table::{Cell, Table};

use super::{home_currency, open_db};
use crate::error::{FinlightError, Result};
use crate::fmt::money;
use crate::models::{RecurrenceInterval, RecurringTransaction, TransactionType};
use crate::recurring::{self, NewRecurring};
use crate::{accounts, categories};

pub struct AddArgs<'a> {
    pub description: &'a str,
    pub amount: f64,
    pub account: &'a str,
    pub every: &'a str,
    pub transaction_type: &'a str,
    pub category: Option<&'a str>,
    pub start: Option<&'a str>,
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn add(args: AddArgs<'_>) -> Result<()> {
    let conn = open_db()?;
    let account = accounts::require(&conn, args.account)?;
    let recurrence_interval = RecurrenceInterval::parse(args.every).ok_or_else(|| {
        FinlightError::Validation(format!("'{}' is not daily, weekly, monthly or yearly", args.every))
    })?;
    let transaction_type = TransactionType::parse(args.transaction_type).ok_or_else(|| {
        FinlightError::Validation(format!("'{}' is not income or expense", args.transaction_type))
    })?;
    let category_id = match args.category {
        Some(name) => Some(categories::require(&conn, name)?.id),
        None => None,
    };
    let start_date = args
        .start
        .map(str::to_string)
        .unwrap_or_else(|| today().format("%Y-%m-%d").to_string());

    let id = recurring::create(
        &conn,
        &NewRecurring {
            description: args.description.to_string(),
            amount: args.amount,
            transaction_type,
            recurrence_interval,
            start_date,
            account_id: account.id,
            category_id,
        },
    )?;
    println!("Added recurring transaction #{id}");
    Ok(())
}

fn print_table(title: &str, rules: &[RecurringTransaction]) {
    let currency = home_currency();
    let mut table = Table::new();
    table.set_header(vec!["ID", "Description", "Amount", "Every", "Next due", "Last run"]);
    for rule in rules {
        let next = recurring::next_due(rule).map(|d| d.format("%Y-%m-%d").to_string());
        table.add_row(vec![
            Cell::new(rule.id),
            Cell::new(&rule.description),
            Cell::new(money(rule.amount, &currency)),
            Cell::new(rule.recurrence_interval.as_str()),
            Cell::new(next.unwrap_or_default()),
            Cell::new(rule.last_run_date.as_deref().unwrap_or("never")),
        ]);
    }
    println!("{title}\n{table}");
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let rules = recurring::list(&conn)?;
    if rules.is_empty() {
        println!("No recurring transactions.");
        return Ok(());
    }
    print_table("Recurring transactions", &rules);
    Ok(())
}

pub fn due() -> Result<()> {
    let conn = open_db()?;
    let rules = recurring::due(&conn, today())?;
    if rules.is_empty() {
        println!("Nothing is due.");
        return Ok(());
    }
    print_table("Due today", &rules);
    println!("Record one with `finlight recurring confirm <ID>`.");
    Ok(())
}

pub fn confirm(id: i64) -> Result<()> {
    let conn = open_db()?;
    let txn_id = recurring::confirm(&conn, id, today())?;
    println!("{}", format!("Recorded transaction #{txn_id}").green());
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = open_db()?;
    recurring::delete(&conn, id)?;
    println!("Deleted recurring transaction #{id}");
    Ok(())
}
