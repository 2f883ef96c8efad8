use comfy_table::{Cell, Table};

use super::{home_currency, open_db};
use crate::error::Result;
use crate::fmt::money;
use crate::{accounts, goals};

pub fn add(name: &str, target: f64, account: &str, by: Option<&str>) -> Result<()> {
    let conn = open_db()?;
    let account = accounts::require(&conn, account)?;
    let id = goals::create(&conn, name, target, by, account.id)?;
    println!("Added goal #{id}: {} ({})", name.trim(), money(target, &home_currency()));
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let currency = home_currency();
    let rows = goals::list(&conn)?;
    if rows.is_empty() {
        println!("No goals yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Goal", "Saved", "Target", "Remaining", "Progress", "By", "Account"]);
    for g in &rows {
        table.add_row(vec![
            Cell::new(g.goal.id),
            Cell::new(&g.goal.name),
            Cell::new(money(g.goal.saved_amount, &currency)),
            Cell::new(money(g.goal.target_amount, &currency)),
            Cell::new(money(g.remaining(), &currency)),
            Cell::new(format!("{:.0}%", g.progress_pct())),
            Cell::new(g.goal.target_date.as_deref().unwrap_or("")),
            Cell::new(&g.account_name),
        ]);
    }
    println!("Goals\n{table}");
    Ok(())
}

pub fn contribute(id: i64, amount: f64) -> Result<()> {
    let conn = open_db()?;
    let goal = goals::contribute(&conn, id, amount)?;
    let currency = home_currency();
    println!(
        "{}: {} of {} saved",
        goal.name,
        money(goal.saved_amount, &currency),
        money(goal.target_amount, &currency)
    );
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = open_db()?;
    goals::delete(&conn, id)?;
    println!("Deleted goal #{id}");
    Ok(())
}
