use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::settings::{load_settings, save_settings, set_value};

pub fn show() -> Result<()> {
    let s = load_settings();
    let mut table = Table::new();
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec![Cell::new("data_dir"), Cell::new(&s.data_dir)]);
    table.add_row(vec![Cell::new("home_currency"), Cell::new(&s.home_currency)]);
    table.add_row(vec![Cell::new("log_level"), Cell::new(&s.log_level)]);
    table.add_row(vec![Cell::new("notify_unknown"), Cell::new(s.notify_unknown)]);
    println!("Settings\n{table}");
    Ok(())
}

pub fn set(key: &str, value: &str) -> Result<()> {
    let mut settings = load_settings();
    set_value(&mut settings, key, value)?;
    save_settings(&settings)?;
    println!("Set {key}");
    Ok(())
}
