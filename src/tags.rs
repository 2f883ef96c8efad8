use rusqlite::{Connection, OptionalExtension};

use crate::error::{FinlightError, Result};
use crate::models::Tag;

fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Tag>> {
    Ok(conn
        .query_row(
            "SELECT id, name FROM tags WHERE name = ?1 COLLATE NOCASE",
            [name.trim()],
            from_row,
        )
        .optional()?)
}

pub fn create(conn: &Connection, name: &str) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FinlightError::Validation("Tag name cannot be empty.".into()));
    }
    if find_by_name(conn, name)?.is_some() {
        return Err(FinlightError::Duplicate(format!("tag '{name}'")));
    }
    conn.execute("INSERT INTO tags (name) VALUES (?1)", [name])?;
    Ok(conn.last_insert_rowid())
}

pub fn find_or_create(conn: &Connection, name: &str) -> Result<i64> {
    match find_by_name(conn, name)? {
        Some(tag) => Ok(tag.id),
        None => create(conn, name),
    }
}

pub fn list(conn: &Connection) -> Result<Vec<Tag>> {
    let mut stmt = conn.prepare("SELECT id, name FROM tags ORDER BY name COLLATE NOCASE")?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete(conn: &Connection, name: &str) -> Result<()> {
    let tag = find_by_name(conn, name)?.ok_or_else(|| FinlightError::UnknownTag(name.to_string()))?;
    conn.execute("DELETE FROM tags WHERE id = ?1", [tag.id])?;
    Ok(())
}

/// Attaching the same tag twice is a no-op.
pub fn attach(conn: &Connection, transaction_id: i64, tag_name: &str) -> Result<()> {
    crate::transactions::get(conn, transaction_id)?;
    let tag_id = find_or_create(conn, tag_name)?;
    conn.execute(
        "INSERT OR IGNORE INTO transaction_tags (transaction_id, tag_id) VALUES (?1, ?2)",
        rusqlite::params![transaction_id, tag_id],
    )?;
    Ok(())
}

pub fn detach(conn: &Connection, transaction_id: i64, tag_name: &str) -> Result<()> {
    let tag = find_by_name(conn, tag_name)?.ok_or_else(|| FinlightError::UnknownTag(tag_name.to_string()))?;
    conn.execute(
        "DELETE FROM transaction_tags WHERE transaction_id = ?1 AND tag_id = ?2",
        rusqlite::params![transaction_id, tag.id],
    )?;
    Ok(())
}

pub fn for_transaction(conn: &Connection, transaction_id: i64) -> Result<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name FROM tags t JOIN transaction_tags tt ON tt.tag_id = t.id \
         WHERE tt.transaction_id = ?1 ORDER BY t.name COLLATE NOCASE",
    )?;
    let rows = stmt
        .query_map([transaction_id], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
