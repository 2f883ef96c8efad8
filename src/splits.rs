use rusqlite::Connection;

use crate::error::{FinlightError, Result};
use crate::models::SplitTransaction;

/// Category label a split parent carries in CSV files.
pub const SPLIT_CATEGORY: &str = "Split Transaction";

// Sums closer than half a cent count as equal.
const TOLERANCE: f64 = 0.005;

/// Per-category expense lines: unsplit transactions whole, split ones by part.
/// Exposes the `date`, `transaction_type`, `is_excluded`, `category_id` and
/// `amount` columns of `transactions`.
pub const CATEGORY_LINES: &str = "(SELECT t.date, t.transaction_type, t.is_excluded, t.category_id, t.amount \
     FROM transactions t WHERE t.is_split = 0 \
     UNION ALL \
     SELECT p.date, p.transaction_type, p.is_excluded, s.category_id, s.amount \
     FROM split_transactions s JOIN transactions p ON s.parent_transaction_id = p.id WHERE p.is_split = 1)";

#[derive(Debug, Clone)]
pub struct NewSplit {
    pub amount: f64,
    pub category_id: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SplitDetails {
    pub split: SplitTransaction,
    pub category_name: Option<String>,
}

pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SplitTransaction> {
    Ok(SplitTransaction {
        id: row.get(0)?,
        parent_transaction_id: row.get(1)?,
        amount: row.get(2)?,
        category_id: row.get(3)?,
        notes: row.get(4)?,
    })
}

/// Stores one part without checking it against its siblings.
pub fn insert(conn: &Connection, parent_id: i64, split: &NewSplit) -> Result<i64> {
    conn.execute(
        "INSERT INTO split_transactions (parent_transaction_id, amount, category_id, notes) \
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            parent_id,
            split.amount,
            split.category_id,
            split.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Replaces the parts of a transaction. Parts must be positive and add up to
/// the parent amount; the parent's own category is cleared.
pub fn set(conn: &Connection, parent_id: i64, splits: &[NewSplit]) -> Result<Vec<i64>> {
    let parent = crate::transactions::get(conn, parent_id)?;
    if splits.len() < 2 {
        return Err(FinlightError::Validation("A split needs at least two parts.".into()));
    }
    if splits.iter().any(|s| !s.amount.is_finite() || s.amount <= 0.0) {
        return Err(FinlightError::Validation("Please enter a valid, positive amount.".into()));
    }
    let total: f64 = splits.iter().map(|s| s.amount).sum();
    if (total - parent.amount).abs() > TOLERANCE {
        return Err(FinlightError::Validation(format!(
            "Split amounts add up to {total:.2} but the transaction is {:.2}.",
            parent.amount
        )));
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM split_transactions WHERE parent_transaction_id = ?1", [parent_id])?;
    let ids = splits
        .iter()
        .map(|s| insert(&tx, parent_id, s))
        .collect::<Result<Vec<_>>>()?;
    tx.execute(
        "UPDATE transactions SET is_split = 1, category_id = NULL WHERE id = ?1",
        [parent_id],
    )?;
    tx.commit()?;
    tracing::info!(parent_id, parts = ids.len(), "split transaction");
    Ok(ids)
}

/// Removes all parts; the transaction counts whole again, uncategorized.
pub fn clear(conn: &Connection, parent_id: i64) -> Result<usize> {
    crate::transactions::get(conn, parent_id)?;
    let tx = conn.unchecked_transaction()?;
    let removed = tx.execute("DELETE FROM split_transactions WHERE parent_transaction_id = ?1", [parent_id])?;
    tx.execute("UPDATE transactions SET is_split = 0 WHERE id = ?1", [parent_id])?;
    tx.commit()?;
    Ok(removed)
}

pub fn list(conn: &Connection, parent_id: i64) -> Result<Vec<SplitDetails>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.parent_transaction_id, s.amount, s.category_id, s.notes, c.name \
         FROM split_transactions s LEFT JOIN categories c ON s.category_id = c.id \
         WHERE s.parent_transaction_id = ?1 ORDER BY s.id",
    )?;
    let rows = stmt
        .query_map([parent_id], |row| {
            Ok(SplitDetails {
                split: from_row(row)?,
                category_name: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::models::TransactionType;
    use crate::transactions::{self, NewTransaction, TransactionUpdate};

    fn parent(conn: &Connection) -> i64 {
        let acct = crate::accounts::create(conn, "Cash", "Wallet").unwrap();
        let mut txn = NewTransaction::manual("DMart", 1000.0, TransactionType::Expense, acct, "2025-06-10 18:00:00");
        txn.category_id = Some(crate::categories::require(conn, "Shopping").unwrap().id);
        transactions::add(conn, &txn).unwrap()
    }

    fn part(conn: &Connection, amount: f64, category: &str) -> NewSplit {
        NewSplit {
            amount,
            category_id: Some(crate::categories::require(conn, category).unwrap().id),
            notes: None,
        }
    }

    #[test]
    fn test_set_marks_parent_and_lists_parts() {
        let (_dir, conn) = test_db();
        let id = parent(&conn);
        let parts = [part(&conn, 600.0, "Groceries"), part(&conn, 400.0, "Health")];
        assert_eq!(set(&conn, id, &parts).unwrap().len(), 2);

        let txn = transactions::get(&conn, id).unwrap();
        assert!(txn.is_split);
        assert_eq!(txn.category_id, None);
        let listed = list(&conn, id).unwrap();
        assert_eq!(listed[0].category_name.as_deref(), Some("Groceries"));
        assert_eq!(listed[1].split.amount, 400.0);
    }

    #[test]
    fn test_set_rejects_parts_that_do_not_add_up() {
        let (_dir, conn) = test_db();
        let id = parent(&conn);
        let short = [part(&conn, 600.0, "Groceries"), part(&conn, 300.0, "Health")];
        match set(&conn, id, &short) {
            Err(FinlightError::Validation(msg)) => assert!(msg.contains("900.00"), "{msg}"),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(set(&conn, id, &[part(&conn, 1000.0, "Groceries")]).is_err());
        let negative = [part(&conn, 1100.0, "Groceries"), part(&conn, -100.0, "Health")];
        assert!(set(&conn, id, &negative).is_err());
        assert!(!transactions::get(&conn, id).unwrap().is_split);
        assert!(list(&conn, id).unwrap().is_empty());
    }

    #[test]
    fn test_set_replaces_previous_parts() {
        let (_dir, conn) = test_db();
        let id = parent(&conn);
        set(&conn, id, &[part(&conn, 500.0, "Groceries"), part(&conn, 500.0, "Health")]).unwrap();
        set(
            &conn,
            id,
            &[part(&conn, 250.0, "Bills"), part(&conn, 250.0, "Bills"), part(&conn, 500.0, "Travel")],
        )
        .unwrap();
        assert_eq!(list(&conn, id).unwrap().len(), 3);
    }

    #[test]
    fn test_clear_and_cascade() {
        let (_dir, conn) = test_db();
        let id = parent(&conn);
        set(&conn, id, &[part(&conn, 500.0, "Groceries"), part(&conn, 500.0, "Health")]).unwrap();
        assert_eq!(clear(&conn, id).unwrap(), 2);
        assert!(!transactions::get(&conn, id).unwrap().is_split);

        set(&conn, id, &[part(&conn, 500.0, "Groceries"), part(&conn, 500.0, "Health")]).unwrap();
        transactions::delete(&conn, id).unwrap();
        let left: i64 = conn.query_row("SELECT count(*) FROM split_transactions", [], |r| r.get(0)).unwrap();
        assert_eq!(left, 0);
    }

    #[test]
    fn test_split_parent_amount_is_locked() {
        let (_dir, conn) = test_db();
        let id = parent(&conn);
        set(&conn, id, &[part(&conn, 500.0, "Groceries"), part(&conn, 500.0, "Health")]).unwrap();
        let bigger = TransactionUpdate {
            amount: Some(1200.0),
            ..Default::default()
        };
        assert!(matches!(transactions::update(&conn, id, &bigger), Err(FinlightError::Validation(_))));
        let rename = TransactionUpdate {
            description: Some("DMart Andheri".into()),
            ..Default::default()
        };
        transactions::update(&conn, id, &rename).unwrap();
    }
}
