use rusqlite::{Connection, OptionalExtension};

use crate::error::{FinlightError, Result};
use crate::models::Goal;

pub const GOAL_COLUMNS: &str = "id, name, target_amount, saved_amount, target_date, account_id";

pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: row.get(0)?,
        name: row.get(1)?,
        target_amount: row.get(2)?,
        saved_amount: row.get(3)?,
        target_date: row.get(4)?,
        account_id: row.get(5)?,
    })
}

#[derive(Debug, Clone)]
pub struct GoalDetails {
    pub goal: Goal,
    pub account_name: String,
}

impl GoalDetails {
    /// Share of the target saved so far, capped at 100.
    pub fn progress_pct(&self) -> f64 {
        (self.goal.saved_amount * 100.0 / self.goal.target_amount).clamp(0.0, 100.0)
    }

    pub fn remaining(&self) -> f64 {
        (self.goal.target_amount - self.goal.saved_amount).max(0.0)
    }
}

fn check_target_date(raw: &str) -> Result<String> {
    chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| FinlightError::Validation(format!("'{raw}' is not a YYYY-MM-DD date")))
}

pub fn create(
    conn: &Connection,
    name: &str,
    target_amount: f64,
    target_date: Option<&str>,
    account_id: i64,
) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FinlightError::Validation("Goal name cannot be empty.".into()));
    }
    if !target_amount.is_finite() || target_amount <= 0.0 {
        return Err(FinlightError::Validation("Please enter a valid, positive amount.".into()));
    }
    let target_date = target_date.map(check_target_date).transpose()?;
    crate::accounts::get(conn, account_id)?;
    conn.execute(
        "INSERT INTO goals (name, target_amount, saved_amount, target_date, account_id) VALUES (?1, ?2, 0, ?3, ?4)",
        rusqlite::params![name, target_amount, target_date, account_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> Result<Goal> {
    conn.query_row(&format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?1"), [id], from_row)
        .optional()?
        .ok_or(FinlightError::UnknownGoal(id))
}

pub fn list(conn: &Connection) -> Result<Vec<GoalDetails>> {
    let mut stmt = conn.prepare(
        "SELECT g.id, g.name, g.target_amount, g.saved_amount, g.target_date, g.account_id, a.name \
         FROM goals g JOIN accounts a ON g.account_id = a.id \
         ORDER BY g.target_date IS NULL, g.target_date, g.name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(GoalDetails {
                goal: from_row(row)?,
                account_name: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Adds to the saved amount; a negative amount withdraws, never below zero.
pub fn contribute(conn: &Connection, id: i64, amount: f64) -> Result<Goal> {
    if !amount.is_finite() || amount == 0.0 {
        return Err(FinlightError::Validation("Please enter a valid, non-zero amount.".into()));
    }
    let goal = get(conn, id)?;
    let saved = goal.saved_amount + amount;
    if saved < 0.0 {
        return Err(FinlightError::Validation(format!(
            "Only {:.2} is saved towards '{}'.",
            goal.saved_amount, goal.name
        )));
    }
    conn.execute(
        "UPDATE goals SET saved_amount = ?1 WHERE id = ?2",
        rusqlite::params![saved, id],
    )?;
    Ok(Goal {
        saved_amount: saved,
        ..goal
    })
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    if conn.execute("DELETE FROM goals WHERE id = ?1", [id])? == 0 {
        return Err(FinlightError::UnknownGoal(id));
    }
    Ok(())
}
