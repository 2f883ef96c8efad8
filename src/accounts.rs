use rusqlite::{Connection, OptionalExtension};

use crate::error::{FinlightError, Result};
use crate::models::Account;

pub const UNKNOWN_ACCOUNT: &str = "Unknown Account";
pub const UNKNOWN_ACCOUNT_TYPE: &str = "General";

// Signed contribution of one transaction row aliased `t`.
const SIGNED_AMOUNT: &str = "CASE WHEN t.transaction_type = 'income' THEN t.amount ELSE -t.amount END";

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        account_type: row.get(2)?,
    })
}

pub fn create(conn: &Connection, name: &str, account_type: &str) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FinlightError::Validation("Account name cannot be empty.".into()));
    }
    if find_by_name(conn, name)?.is_some() {
        return Err(FinlightError::Duplicate(format!("account '{name}'")));
    }
    conn.execute(
        "INSERT INTO accounts (name, account_type) VALUES (?1, ?2)",
        rusqlite::params![name, account_type.trim()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Account>> {
    Ok(conn
        .query_row(
            "SELECT id, name, account_type FROM accounts WHERE name = ?1 COLLATE NOCASE",
            [name.trim()],
            from_row,
        )
        .optional()?)
}

pub fn get(conn: &Connection, id: i64) -> Result<Account> {
    conn.query_row("SELECT id, name, account_type FROM accounts WHERE id = ?1", [id], from_row)
        .optional()?
        .ok_or_else(|| FinlightError::UnknownAccount(id.to_string()))
}

pub fn require(conn: &Connection, name: &str) -> Result<Account> {
    find_by_name(conn, name)?.ok_or_else(|| FinlightError::UnknownAccount(name.to_string()))
}

/// Returns the id of the account with this name, creating it when missing.
pub fn find_or_create(conn: &Connection, name: &str, account_type: &str) -> Result<i64> {
    if let Some(existing) = find_by_name(conn, name)? {
        return Ok(existing.id);
    }
    tracing::info!(name, account_type, "creating account");
    create(conn, name, account_type)
}

pub fn list(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare("SELECT id, name, account_type FROM accounts ORDER BY name")?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Every account with its derived balance.
pub fn list_with_balance(conn: &Connection) -> Result<Vec<(Account, f64)>> {
    let sql = format!(
        "SELECT a.id, a.name, a.account_type, \
         COALESCE(SUM(CASE WHEN t.is_excluded = 0 THEN {SIGNED_AMOUNT} ELSE 0 END), 0) \
         FROM accounts a LEFT JOIN transactions t ON t.account_id = a.id \
         GROUP BY a.id ORDER BY a.name"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| Ok((from_row(row)?, row.get::<_, f64>(3)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Signed sum of the account's non-excluded transactions.
pub fn balance(conn: &Connection, account_id: i64) -> Result<f64> {
    let sql = format!(
        "SELECT COALESCE(SUM({SIGNED_AMOUNT}), 0) FROM transactions t \
         WHERE t.account_id = ?1 AND t.is_excluded = 0"
    );
    Ok(conn.query_row(&sql, [account_id], |row| row.get(0))?)
}

pub fn rename(conn: &Connection, id: i64, new_name: &str, account_type: Option<&str>) -> Result<()> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(FinlightError::Validation("Account name cannot be empty.".into()));
    }
    if let Some(other) = find_by_name(conn, new_name)? {
        if other.id != id {
            return Err(FinlightError::Duplicate(format!("account '{new_name}'")));
        }
    }
    let changed = conn.execute(
        "UPDATE accounts SET name = ?1, account_type = COALESCE(?2, account_type) WHERE id = ?3",
        rusqlite::params![new_name, account_type, id],
    )?;
    if changed == 0 {
        return Err(FinlightError::UnknownAccount(id.to_string()));
    }
    Ok(())
}

/// Deletes the account and, through the foreign key, all of its transactions.
pub fn delete(conn: &Connection, id: i64) -> Result<usize> {
    let removed: usize = conn.query_row(
        "SELECT count(*) FROM transactions WHERE account_id = ?1",
        [id],
        |row| row.get::<_, i64>(0),
    )? as usize;
    if conn.execute("DELETE FROM accounts WHERE id = ?1", [id])? == 0 {
        return Err(FinlightError::UnknownAccount(id.to_string()));
    }
    Ok(removed)
}
