use colored::Colorize;
use comfy_table::{Cell, Table};

use super::{home_currency, open_db};
use crate::error::{FinlightError, Result};
use crate::fmt::{money, normalize_date, now_timestamp, parse_month};
use crate::models::TransactionType;
use crate::splits::{self, NewSplit};
use crate::transactions::{self, NewTransaction, TransactionFilter, TransactionUpdate};
use crate::{accounts, categories, tags};

fn parse_type(raw: &str) -> Result<TransactionType> {
    TransactionType::parse(raw)
        .ok_or_else(|| FinlightError::Validation(format!("'{raw}' is not income or expense")))
}

fn parse_date(raw: &str) -> Result<String> {
    normalize_date(raw).ok_or_else(|| FinlightError::Validation(format!("'{raw}' is not a YYYY-MM-DD date")))
}

#[allow(clippy::too_many_arguments)]
pub fn add(
    description: &str,
    amount: f64,
    account: &str,
    transaction_type: &str,
    category: Option<&str>,
    date: Option<&str>,
    notes: Option<&str>,
    tag_names: &[String],
) -> Result<()> {
    let conn = open_db()?;
    let account = accounts::require(&conn, account)?;
    let date = match date {
        Some(raw) => parse_date(raw)?,
        None => now_timestamp(),
    };
    let mut txn = NewTransaction::manual(description, amount, parse_type(transaction_type)?, account.id, &date);
    txn.category_id = match category {
        Some(name) => Some(categories::require(&conn, name)?.id),
        None => None,
    };
    txn.notes = notes.map(str::to_string);

    let tx = conn.unchecked_transaction()?;
    let id = transactions::add(&tx, &txn)?;
    for tag in tag_names {
        tags::attach(&tx, id, tag)?;
    }
    tx.commit()?;
    println!("Added transaction #{id}");
    Ok(())
}

pub fn list(month: Option<&str>, account: Option<&str>, category: Option<&str>, limit: usize) -> Result<()> {
    let conn = open_db()?;
    let currency = home_currency();
    let mut filter = TransactionFilter {
        limit: Some(limit),
        ..Default::default()
    };
    if let Some(raw) = month {
        filter.month =
            Some(parse_month(raw).ok_or_else(|| FinlightError::Validation(format!("'{raw}' is not a YYYY-MM month")))?);
    }
    if let Some(name) = account {
        filter.account_id = Some(accounts::require(&conn, name)?.id);
    }
    if let Some(name) = category {
        filter.category_id = Some(categories::require(&conn, name)?.id);
    }

    let rows = transactions::list(&conn, &filter)?;
    if rows.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Amount", "Category", "Account", "Source"]);
    for row in &rows {
        let t = &row.transaction;
        let shown = money(t.signed_amount(), t.currency_code.as_deref().unwrap_or(&currency));
        let amount = match t.transaction_type {
            TransactionType::Income => shown.green().to_string(),
            TransactionType::Expense => shown.red().to_string(),
        };
        let description = if t.is_excluded {
            format!("{} (excluded)", t.description).dimmed().to_string()
        } else {
            t.description.clone()
        };
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(&t.date[..10.min(t.date.len())]),
            Cell::new(description),
            Cell::new(amount),
            Cell::new(if t.is_split {
                splits::SPLIT_CATEGORY
            } else {
                row.category_name.as_deref().unwrap_or("")
            }),
            Cell::new(&row.account_name),
            Cell::new(t.source.as_str()),
        ]);
    }
    println!("Transactions\n{table}");
    Ok(())
}

pub fn show(id: i64) -> Result<()> {
    let conn = open_db()?;
    let t = transactions::get(&conn, id)?;
    let account = accounts::get(&conn, t.account_id)?;
    let category = match t.category_id {
        Some(cid) => categories::list(&conn)?
            .into_iter()
            .find(|c| c.id == cid)
            .map(|c| c.name),
        None => None,
    };
    let tag_names: Vec<String> = tags::for_transaction(&conn, id)?.into_iter().map(|t| t.name).collect();
    let currency = t.currency_code.clone().unwrap_or_else(home_currency);

    println!("  ID:          {}", t.id);
    println!("  Date:        {}", t.date);
    println!("  Description: {}", t.description);
    if let Some(original) = &t.original_description {
        println!("  Parsed as:   {original}");
    }
    println!("  Amount:      {} ({})", money(t.amount, &currency), t.transaction_type.as_str());
    println!("  Account:     {}", account.name);
    if t.is_split {
        println!("  Category:    {}", splits::SPLIT_CATEGORY);
        for part in splits::list(&conn, id)? {
            let notes = part.split.notes.map(|n| format!(" ({n})")).unwrap_or_default();
            println!(
                "    - {} {}{notes}",
                money(part.split.amount, &currency),
                part.category_name.as_deref().unwrap_or("(none)")
            );
        }
    } else {
        println!("  Category:    {}", category.as_deref().unwrap_or("(none)"));
    }
    println!("  Source:      {}", t.source.as_str());
    if let Some(notes) = &t.notes {
        println!("  Notes:       {notes}");
    }
    if !tag_names.is_empty() {
        println!("  Tags:        {}", tag_names.join(", "));
    }
    if t.is_excluded {
        println!("  {}", "Excluded from balances and reports".yellow());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn edit(
    id: i64,
    description: Option<String>,
    amount: Option<f64>,
    notes: Option<String>,
    category: Option<&str>,
    account: Option<&str>,
    date: Option<&str>,
    transaction_type: Option<&str>,
) -> Result<()> {
    let conn = open_db()?;
    let mut changes = TransactionUpdate {
        description,
        amount,
        // an empty --notes clears them
        notes: notes.map(|n| Some(n).filter(|n| !n.trim().is_empty())),
        ..Default::default()
    };
    if let Some(name) = category {
        changes.category_id = Some(Some(categories::require(&conn, name)?.id));
    }
    if let Some(name) = account {
        changes.account_id = Some(accounts::require(&conn, name)?.id);
    }
    if let Some(raw) = date {
        changes.date = Some(parse_date(raw)?);
    }
    if let Some(raw) = transaction_type {
        changes.transaction_type = Some(parse_type(raw)?);
    }
    transactions::update(&conn, id, &changes)?;
    println!("Updated transaction #{id}");
    Ok(())
}

pub fn set_excluded(id: i64, excluded: bool) -> Result<()> {
    let conn = open_db()?;
    transactions::set_excluded(&conn, id, excluded)?;
    if excluded {
        println!("Transaction #{id} excluded");
    } else {
        println!("Transaction #{id} included");
    }
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = open_db()?;
    transactions::delete(&conn, id)?;
    println!("Deleted transaction #{id}");
    Ok(())
}

// AMOUNT:CATEGORY or AMOUNT:CATEGORY:NOTES
fn parse_part(conn: &rusqlite::Connection, raw: &str) -> Result<NewSplit> {
    let mut fields = raw.splitn(3, ':');
    let amount = fields
        .next()
        .and_then(|a| a.trim().parse::<f64>().ok())
        .ok_or_else(|| FinlightError::Validation(format!("'{raw}' does not start with an amount")))?;
    let category_id = match fields.next().map(str::trim).filter(|c| !c.is_empty()) {
        Some(name) => Some(categories::require(conn, name)?.id),
        None => None,
    };
    Ok(NewSplit {
        amount,
        category_id,
        notes: fields.next().map(str::to_string),
    })
}

pub fn split(id: i64, parts: &[String]) -> Result<()> {
    let conn = open_db()?;
    let parts = parts
        .iter()
        .map(|raw| parse_part(&conn, raw))
        .collect::<Result<Vec<_>>>()?;
    splits::set(&conn, id, &parts)?;
    println!("Split transaction #{id} into {} parts", parts.len());
    Ok(())
}

pub fn unsplit(id: i64) -> Result<()> {
    let conn = open_db()?;
    let removed = splits::clear(&conn, id)?;
    println!("Removed {removed} parts from #{id}");
    Ok(())
}

pub fn tag(id: i64, name: &str) -> Result<()> {
    let conn = open_db()?;
    tags::attach(&conn, id, name)?;
    println!("Tagged #{id} with {}", name.trim());
    Ok(())
}

pub fn untag(id: i64, name: &str) -> Result<()> {
    let conn = open_db()?;
    tags::detach(&conn, id, name)?;
    println!("Removed {name} from #{id}");
    Ok(())
}
