use comfy_table::{Cell, Table};

use super::open_db;
use crate::error::Result;
use crate::rules;

pub fn merchants() -> Result<()> {
    let conn = open_db()?;
    let mut table = Table::new();
    table.set_header(vec!["Sender", "Merchant"]);
    for m in rules::list_merchant_mappings(&conn)? {
        table.add_row(vec![Cell::new(&m.sms_sender), Cell::new(&m.merchant_name)]);
    }
    println!("Merchant mappings\n{table}");
    Ok(())
}

pub fn set_merchant(sender: &str, merchant: &str) -> Result<()> {
    let conn = open_db()?;
    rules::set_merchant_mapping(&conn, sender, merchant)?;
    println!("Messages from {} will be filed as {}", sender.trim(), merchant.trim());
    Ok(())
}

pub fn delete_merchant(sender: &str) -> Result<()> {
    let conn = open_db()?;
    rules::delete_merchant_mapping(&conn, sender)?;
    println!("Removed mapping for {sender}");
    Ok(())
}

pub fn categories() -> Result<()> {
    let conn = open_db()?;
    let mut table = Table::new();
    table.set_header(vec!["Merchant", "Category"]);
    for (merchant, category) in rules::list_category_mappings(&conn)? {
        table.add_row(vec![Cell::new(merchant), Cell::new(category)]);
    }
    println!("Category mappings\n{table}");
    Ok(())
}

pub fn set_category(merchant: &str, category: &str) -> Result<()> {
    let conn = open_db()?;
    let cat = crate::categories::require(&conn, category)?;
    rules::set_category_mapping(&conn, merchant, cat.id)?;
    println!("{} -> {}", merchant.trim(), cat.name);
    Ok(())
}

pub fn delete_category(merchant: &str) -> Result<()> {
    let conn = open_db()?;
    rules::delete_category_mapping(&conn, merchant)?;
    println!("Removed category mapping for {merchant}");
    Ok(())
}
