use rusqlite::{Connection, OptionalExtension};

use crate::error::{FinlightError, Result};
use crate::models::{Transaction, TransactionSource, TransactionType, TRANSACTION_COLUMNS};

/// Fields for a transaction about to be stored.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub description: String,
    pub category_id: Option<i64>,
    pub amount: f64,
    pub date: String,
    pub account_id: i64,
    pub notes: Option<String>,
    pub transaction_type: TransactionType,
    pub source_sms_id: Option<i64>,
    pub source_sms_hash: Option<String>,
    pub source: TransactionSource,
    pub original_description: Option<String>,
    pub currency_code: Option<String>,
}

impl NewTransaction {
    pub fn manual(description: &str, amount: f64, transaction_type: TransactionType, account_id: i64, date: &str) -> Self {
        Self {
            description: description.to_string(),
            category_id: None,
            amount,
            date: date.to_string(),
            account_id,
            notes: None,
            transaction_type,
            source_sms_id: None,
            source_sms_hash: None,
            source: TransactionSource::Manual,
            original_description: None,
            currency_code: None,
        }
    }
}

/// A stored transaction joined with display names.
#[derive(Debug, Clone)]
pub struct TransactionDetails {
    pub transaction: Transaction,
    pub account_name: String,
    pub category_name: Option<String>,
}

/// Optional narrowing for [`list`].
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
    /// (year, month)
    pub month: Option<(i32, u32)>,
    pub source: Option<TransactionSource>,
    pub limit: Option<usize>,
}

fn validate(description: &str, amount: f64) -> Result<()> {
    if description.trim().is_empty() {
        return Err(FinlightError::Validation("Description cannot be empty.".into()));
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(FinlightError::Validation("Please enter a valid, positive amount.".into()));
    }
    Ok(())
}

pub fn add(conn: &Connection, txn: &NewTransaction) -> Result<i64> {
    validate(&txn.description, txn.amount)?;
    conn.execute(
        "INSERT INTO transactions (description, category_id, amount, date, account_id, notes, transaction_type, \
         source_sms_id, source_sms_hash, source, original_description, currency_code) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        rusqlite::params![
            txn.description.trim(),
            txn.category_id,
            txn.amount,
            txn.date,
            txn.account_id,
            txn.notes,
            txn.transaction_type,
            txn.source_sms_id,
            txn.source_sms_hash,
            txn.source,
            txn.original_description,
            txn.currency_code,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> Result<Transaction> {
    conn.query_row(
        &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"),
        [id],
        Transaction::from_row,
    )
    .optional()?
    .ok_or(FinlightError::UnknownTransaction(id))
}

/// Partial edit; `None` leaves a field unchanged. `Some(None)` clears notes
/// or category.
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub notes: Option<Option<String>>,
    pub category_id: Option<Option<i64>>,
    pub account_id: Option<i64>,
    pub date: Option<String>,
    pub transaction_type: Option<TransactionType>,
}

pub fn update(conn: &Connection, id: i64, changes: &TransactionUpdate) -> Result<()> {
    let current = get(conn, id)?;
    let description = changes.description.clone().unwrap_or(current.description);
    let amount = changes.amount.unwrap_or(current.amount);
    validate(&description, amount)?;
    if current.is_split && amount != current.amount {
        return Err(FinlightError::Validation(
            "Remove the splits before changing the amount of a split transaction.".into(),
        ));
    }

    conn.execute(
        "UPDATE transactions SET description = ?1, amount = ?2, notes = ?3, category_id = ?4, \
         account_id = ?5, date = ?6, transaction_type = ?7 WHERE id = ?8",
        rusqlite::params![
            description.trim(),
            amount,
            changes.notes.clone().unwrap_or(current.notes),
            changes.category_id.unwrap_or(current.category_id),
            changes.account_id.unwrap_or(current.account_id),
            changes.date.clone().unwrap_or(current.date),
            changes.transaction_type.unwrap_or(current.transaction_type),
            id,
        ],
    )?;
    Ok(())
}

pub fn set_excluded(conn: &Connection, id: i64, excluded: bool) -> Result<()> {
    if conn.execute(
        "UPDATE transactions SET is_excluded = ?1 WHERE id = ?2",
        rusqlite::params![excluded, id],
    )? == 0
    {
        return Err(FinlightError::UnknownTransaction(id));
    }
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    if conn.execute("DELETE FROM transactions WHERE id = ?1", [id])? == 0 {
        return Err(FinlightError::UnknownTransaction(id));
    }
    Ok(())
}

/// Newest first.
pub fn list(conn: &Connection, filter: &TransactionFilter) -> Result<Vec<TransactionDetails>> {
    let columns = TRANSACTION_COLUMNS
        .split(", ")
        .map(|c| format!("t.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!(
        "SELECT {columns}, a.name, c.name FROM transactions t \
         JOIN accounts a ON t.account_id = a.id \
         LEFT JOIN categories c ON t.category_id = c.id WHERE 1 = 1"
    );
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(account_id) = filter.account_id {
        params.push(Box::new(account_id));
        sql.push_str(&format!(" AND t.account_id = ?{}", params.len()));
    }
    if let Some(category_id) = filter.category_id {
        params.push(Box::new(category_id));
        sql.push_str(&format!(" AND t.category_id = ?{}", params.len()));
    }
    if let Some((year, month)) = filter.month {
        params.push(Box::new(format!("{year:04}-{month:02}")));
        sql.push_str(&format!(" AND substr(t.date, 1, 7) = ?{}", params.len()));
    }
    if let Some(source) = filter.source {
        params.push(Box::new(source));
        sql.push_str(&format!(" AND t.source = ?{}", params.len()));
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok(TransactionDetails {
                transaction: Transaction::from_row(row)?,
                account_name: row.get(15)?,
                category_name: row.get(16)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    fn setup(conn: &Connection) -> i64 {
        crate::accounts::create(conn, "Cash", "Wallet").unwrap()
    }

    #[test]
    fn test_add_validates() {
        let (_dir, conn) = test_db();
        let acct = setup(&conn);
        let blank = NewTransaction::manual("  ", 10.0, TransactionType::Expense, acct, "2025-06-01 00:00:00");
        match add(&conn, &blank) {
            Err(FinlightError::Validation(msg)) => assert_eq!(msg, "Description cannot be empty."),
            other => panic!("expected validation error, got {other:?}"),
        }
        let negative = NewTransaction::manual("Lunch", -5.0, TransactionType::Expense, acct, "2025-06-01 00:00:00");
        match add(&conn, &negative) {
            Err(FinlightError::Validation(msg)) => assert_eq!(msg, "Please enter a valid, positive amount."),
            other => panic!("expected validation error, got {other:?}"),
        }
        let zero = NewTransaction::manual("Lunch", 0.0, TransactionType::Expense, acct, "2025-06-01 00:00:00");
        assert!(add(&conn, &zero).is_err());
    }

    #[test]
    fn test_add_and_get() {
        let (_dir, conn) = test_db();
        let acct = setup(&conn);
        let id = add(
            &conn,
            &NewTransaction::manual(" Lunch ", 120.0, TransactionType::Expense, acct, "2025-06-01 13:00:00"),
        )
        .unwrap();
        let txn = get(&conn, id).unwrap();
        assert_eq!(txn.description, "Lunch");
        assert_eq!(txn.source, TransactionSource::Manual);
        assert!(!txn.is_excluded);
        assert!(matches!(get(&conn, 999), Err(FinlightError::UnknownTransaction(999))));
    }

    #[test]
    fn test_update_partial() {
        let (_dir, conn) = test_db();
        let acct = setup(&conn);
        let id = add(
            &conn,
            &NewTransaction::manual("Lunch", 120.0, TransactionType::Expense, acct, "2025-06-01 13:00:00"),
        )
        .unwrap();
        let food = crate::categories::require(&conn, "Food & Drinks").unwrap();
        update(
            &conn,
            id,
            &TransactionUpdate {
                amount: Some(150.0),
                category_id: Some(Some(food.id)),
                ..Default::default()
            },
        )
        .unwrap();
        let txn = get(&conn, id).unwrap();
        assert_eq!(txn.amount, 150.0);
        assert_eq!(txn.description, "Lunch");
        assert_eq!(txn.category_id, Some(food.id));

        let bad = TransactionUpdate {
            amount: Some(-1.0),
            ..Default::default()
        };
        assert!(update(&conn, id, &bad).is_err());
    }

    #[test]
    fn test_update_clears_notes() {
        let (_dir, conn) = test_db();
        let acct = setup(&conn);
        let mut txn = NewTransaction::manual("Lunch", 120.0, TransactionType::Expense, acct, "2025-06-01 13:00:00");
        txn.notes = Some("split with Sam".into());
        let id = add(&conn, &txn).unwrap();

        let keep = TransactionUpdate {
            amount: Some(130.0),
            ..Default::default()
        };
        update(&conn, id, &keep).unwrap();
        assert_eq!(get(&conn, id).unwrap().notes.as_deref(), Some("split with Sam"));

        let clear = TransactionUpdate {
            notes: Some(None),
            ..Default::default()
        };
        update(&conn, id, &clear).unwrap();
        assert_eq!(get(&conn, id).unwrap().notes, None);
    }

    #[test]
    fn test_exclude_and_delete() {
        let (_dir, conn) = test_db();
        let acct = setup(&conn);
        let id = add(
            &conn,
            &NewTransaction::manual("Transfer", 500.0, TransactionType::Expense, acct, "2025-06-01 13:00:00"),
        )
        .unwrap();
        set_excluded(&conn, id, true).unwrap();
        assert!(get(&conn, id).unwrap().is_excluded);
        assert_eq!(crate::accounts::balance(&conn, acct).unwrap(), 0.0);
        delete(&conn, id).unwrap();
        assert!(delete(&conn, id).is_err());
    }

    #[test]
    fn test_list_filters_by_month_and_joins_names() {
        let (_dir, conn) = test_db();
        let acct = setup(&conn);
        let mut june = NewTransaction::manual("June", 10.0, TransactionType::Expense, acct, "2025-06-10 09:00:00");
        june.category_id = Some(crate::categories::require(&conn, "Groceries").unwrap().id);
        add(&conn, &june).unwrap();
        add(
            &conn,
            &NewTransaction::manual("July", 20.0, TransactionType::Income, acct, "2025-07-02 09:00:00"),
        )
        .unwrap();

        let all = list(&conn, &TransactionFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].transaction.description, "July");

        let filtered = list(
            &conn,
            &TransactionFilter {
                month: Some((2025, 6)),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].account_name, "Cash");
        assert_eq!(filtered[0].category_name.as_deref(), Some("Groceries"));
    }
}
