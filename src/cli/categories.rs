use comfy_table::{Cell, Table};

use super::open_db;
use crate::categories;
use crate::error::Result;

pub fn add(name: &str, icon: &str, color: &str) -> Result<()> {
    let conn = open_db()?;
    categories::create(&conn, name, icon, color)?;
    println!("Added category: {}", name.trim());
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Icon", "Color"]);
    for cat in categories::list(&conn)? {
        table.add_row(vec![
            Cell::new(cat.id),
            Cell::new(&cat.name),
            Cell::new(&cat.icon_key),
            Cell::new(&cat.color_key),
        ]);
    }
    println!("Categories\n{table}");
    Ok(())
}

pub fn update(name: &str, rename: Option<&str>, icon: Option<&str>, color: Option<&str>) -> Result<()> {
    let conn = open_db()?;
    categories::update(&conn, name, rename, icon, color)?;
    println!("Updated category: {}", rename.unwrap_or(name).trim());
    Ok(())
}

pub fn delete(name: &str) -> Result<()> {
    let conn = open_db()?;
    categories::delete(&conn, name)?;
    println!("Deleted category: {name}");
    Ok(())
}
