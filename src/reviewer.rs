use rusqlite::Connection;

use crate::error::Result;
use crate::models::TransactionSource;
use crate::transactions::{self, TransactionDetails, TransactionFilter};

/// Auto-saved SMS transactions still waiting for a category, oldest first.
pub fn pending(conn: &Connection) -> Result<Vec<TransactionDetails>> {
    let mut rows = transactions::list(
        conn,
        &TransactionFilter {
            source: Some(TransactionSource::NeedsReview),
            ..Default::default()
        },
    )?;
    rows.reverse();
    Ok(rows)
}

pub fn pending_count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT count(*) FROM transactions WHERE source = ?1",
        [TransactionSource::NeedsReview],
        |row| row.get(0),
    )?)
}

/// Categorizes a pending transaction and marks it reviewed. With
/// `learn_category` the parsed merchant name is mapped to the category so
/// later messages from the same merchant import without review.
pub fn apply_review(
    conn: &Connection,
    transaction_id: i64,
    category_id: i64,
    description: Option<&str>,
    learn_category: bool,
) -> Result<()> {
    let txn = transactions::get(conn, transaction_id)?;
    let tx = conn.unchecked_transaction()?;
    transactions::update(
        &tx,
        transaction_id,
        &transactions::TransactionUpdate {
            description: description.map(str::to_string),
            category_id: Some(Some(category_id)),
            ..Default::default()
        },
    )?;
    tx.execute(
        "UPDATE transactions SET source = ?1 WHERE id = ?2",
        rusqlite::params![TransactionSource::ReviewedImport, transaction_id],
    )?;
    if learn_category {
        let merchant = txn.original_description.as_deref().unwrap_or(&txn.description);
        crate::rules::set_category_mapping(&tx, merchant, category_id)?;
    }
    tx.commit()?;
    Ok(())
}
