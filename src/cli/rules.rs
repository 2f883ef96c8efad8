use comfy_table::{Cell, Table};

use super::open_db;
use crate::error::Result;
use crate::models::IgnoreRuleType;
use crate::rules;

pub fn ignore_list() -> Result<()> {
    let conn = open_db()?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Match", "Pattern", "Enabled", "Default"]);
    for rule in rules::list_ignore(&conn)? {
        table.add_row(vec![
            Cell::new(rule.id),
            Cell::new(match rule.rule_type {
                IgnoreRuleType::Sender => "sender",
                IgnoreRuleType::BodyPhrase => "body",
            }),
            Cell::new(&rule.pattern),
            Cell::new(if rule.is_enabled { "yes" } else { "no" }),
            Cell::new(if rule.is_default { "yes" } else { "" }),
        ]);
    }
    println!("Ignore rules\n{table}");
    Ok(())
}

pub fn ignore_add(pattern: &str, sender: bool) -> Result<()> {
    let conn = open_db()?;
    let rule_type = if sender { IgnoreRuleType::Sender } else { IgnoreRuleType::BodyPhrase };
    let id = rules::add_ignore(&conn, rule_type, pattern)?;
    println!("Added ignore rule #{id}: {}", pattern.trim());
    Ok(())
}

pub fn ignore_enable(id: i64, enabled: bool) -> Result<()> {
    let conn = open_db()?;
    rules::set_ignore_enabled(&conn, id, enabled)?;
    println!("Ignore rule #{id} {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

pub fn ignore_delete(id: i64) -> Result<()> {
    let conn = open_db()?;
    rules::delete_ignore(&conn, id)?;
    println!("Deleted ignore rule #{id}");
    Ok(())
}

pub fn custom_list() -> Result<()> {
    let conn = open_db()?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Priority", "Trigger", "Merchant", "Amount", "Account"]);
    for rule in rules::list_custom(&conn)? {
        table.add_row(vec![
            Cell::new(rule.id),
            Cell::new(rule.priority),
            Cell::new(&rule.trigger_phrase),
            Cell::new(rule.merchant_regex.as_deref().unwrap_or("")),
            Cell::new(rule.amount_regex.as_deref().unwrap_or("")),
            Cell::new(rule.account_regex.as_deref().unwrap_or("")),
        ]);
    }
    println!("Custom rules\n{table}");
    Ok(())
}

pub fn custom_add(
    trigger: &str,
    merchant: Option<&str>,
    amount: Option<&str>,
    account: Option<&str>,
    priority: i64,
) -> Result<()> {
    let conn = open_db()?;
    let id = rules::add_custom(&conn, trigger, merchant, amount, account, priority)?;
    println!("Added custom rule #{id} for \"{}\"", trigger.trim());
    Ok(())
}

pub fn custom_delete(id: i64) -> Result<()> {
    let conn = open_db()?;
    rules::delete_custom(&conn, id)?;
    println!("Deleted custom rule #{id}");
    Ok(())
}

pub fn rename_list() -> Result<()> {
    let conn = open_db()?;
    let mut renames: Vec<(String, String)> = rules::rename_map(&conn)?.into_iter().collect();
    renames.sort();
    let mut table = Table::new();
    table.set_header(vec!["Parsed name", "Shown as"]);
    for (from, to) in renames {
        table.add_row(vec![Cell::new(from), Cell::new(to)]);
    }
    println!("Merchant renames\n{table}");
    Ok(())
}

pub fn rename_set(from: &str, to: &str) -> Result<()> {
    let conn = open_db()?;
    rules::set_rename(&conn, from, to)?;
    println!("{} -> {}", from.trim(), to.trim());
    Ok(())
}

pub fn rename_delete(from: &str) -> Result<()> {
    let conn = open_db()?;
    rules::delete_rename(&conn, from)?;
    println!("Removed rename for {from}");
    Ok(())
}
