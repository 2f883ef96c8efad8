use comfy_table::{Cell, Table};

use super::open_db;
use crate::error::Result;
use crate::tags;

pub fn add(name: &str) -> Result<()> {
    let conn = open_db()?;
    tags::create(&conn, name)?;
    println!("Added tag: {}", name.trim());
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name"]);
    for tag in tags::list(&conn)? {
        table.add_row(vec![Cell::new(tag.id), Cell::new(&tag.name)]);
    }
    println!("Tags\n{table}");
    Ok(())
}

pub fn delete(name: &str) -> Result<()> {
    let conn = open_db()?;
    tags::delete(&conn, name)?;
    println!("Deleted tag: {name}");
    Ok(())
}
