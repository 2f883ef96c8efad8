use rusqlite::{Connection, OptionalExtension};

use crate::error::{FinlightError, Result};
use crate::models::Category;

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        icon_key: row.get(2)?,
        color_key: row.get(3)?,
    })
}

pub fn create(conn: &Connection, name: &str, icon_key: &str, color_key: &str) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FinlightError::Validation("Category name cannot be empty.".into()));
    }
    if find_by_name(conn, name)?.is_some() {
        return Err(FinlightError::Duplicate(format!("category '{name}'")));
    }
    conn.execute(
        "INSERT INTO categories (name, icon_key, color_key) VALUES (?1, ?2, ?3)",
        rusqlite::params![name, icon_key, color_key],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Category>> {
    Ok(conn
        .query_row(
            "SELECT id, name, icon_key, color_key FROM categories WHERE name = ?1 COLLATE NOCASE",
            [name.trim()],
            from_row,
        )
        .optional()?)
}

pub fn require(conn: &Connection, name: &str) -> Result<Category> {
    find_by_name(conn, name)?.ok_or_else(|| FinlightError::UnknownCategory(name.to_string()))
}

pub fn list(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name, icon_key, color_key FROM categories ORDER BY name")?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Renames and/or restyles a category. Budgets keyed by the old name follow it.
pub fn update(
    conn: &Connection,
    name: &str,
    new_name: Option<&str>,
    icon_key: Option<&str>,
    color_key: Option<&str>,
) -> Result<()> {
    let category = require(conn, name)?;
    let target = new_name.map(str::trim).unwrap_or(&category.name);
    if target.is_empty() {
        return Err(FinlightError::Validation("Category name cannot be empty.".into()));
    }
    if let Some(other) = find_by_name(conn, target)? {
        if other.id != category.id {
            return Err(FinlightError::Duplicate(format!("category '{target}'")));
        }
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE categories SET name = ?1, icon_key = COALESCE(?2, icon_key), color_key = COALESCE(?3, color_key) \
         WHERE id = ?4",
        rusqlite::params![target, icon_key, color_key, category.id],
    )?;
    if target != category.name {
        tx.execute(
            "UPDATE budgets SET category_name = ?1 WHERE category_name = ?2",
            rusqlite::params![target, category.name],
        )?;
    }
    tx.commit()?;
    Ok(())
}

/// Deletes the category; its transactions become uncategorized.
pub fn delete(conn: &Connection, name: &str) -> Result<()> {
    let category = require(conn, name)?;
    conn.execute("DELETE FROM categories WHERE id = ?1", [category.id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    #[test]
    fn test_defaults_are_seeded() {
        let (_dir, conn) = test_db();
        assert!(find_by_name(&conn, "groceries").unwrap().is_some());
        assert!(!list(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_create_unique() {
        let (_dir, conn) = test_db();
        create(&conn, "Pets", "pets", "brown").unwrap();
        assert!(matches!(create(&conn, "pets", "x", "y"), Err(FinlightError::Duplicate(_))));
    }

    #[test]
    fn test_update_renames_budgets() {
        let (_dir, conn) = test_db();
        conn.execute(
            "INSERT INTO budgets (category_name, amount, month, year) VALUES ('Travel', 5000, 6, 2025)",
            [],
        )
        .unwrap();
        update(&conn, "Travel", Some("Trips"), None, Some("blue")).unwrap();
        let cat = require(&conn, "Trips").unwrap();
        assert_eq!(cat.color_key, "blue");
        assert_eq!(cat.icon_key, "flight");
        let budget_name: String = conn
            .query_row("SELECT category_name FROM budgets", [], |r| r.get(0))
            .unwrap();
        assert_eq!(budget_name, "Trips");
    }

    #[test]
    fn test_delete_uncategorizes_transactions() {
        let (_dir, conn) = test_db();
        conn.execute("INSERT INTO accounts (name, account_type) VALUES ('Cash', 'Wallet')", []).unwrap();
        let cat = require(&conn, "Shopping").unwrap();
        conn.execute(
            "INSERT INTO transactions (description, amount, date, account_id, category_id) \
             VALUES ('shoes', 10, '2025-06-01 00:00:00', 1, ?1)",
            [cat.id],
        )
        .unwrap();
        delete(&conn, "Shopping").unwrap();
        let category_id: Option<i64> = conn
            .query_row("SELECT category_id FROM transactions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(category_id, None);
        assert!(matches!(delete(&conn, "Shopping"), Err(FinlightError::UnknownCategory(_))));
    }
}
