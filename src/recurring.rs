use chrono::{Days, Months, NaiveDate};
use rusqlite::{Connection, OptionalExtension};

use crate::error::{FinlightError, Result};
use crate::models::{RecurrenceInterval, RecurringTransaction, TransactionType};
use crate::transactions::{self, NewTransaction};

pub const RECURRING_COLUMNS: &str = "id, description, amount, transaction_type, recurrence_interval, start_date, \
     account_id, category_id, last_run_date";

pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecurringTransaction> {
    Ok(RecurringTransaction {
        id: row.get(0)?,
        description: row.get(1)?,
        amount: row.get(2)?,
        transaction_type: row.get(3)?,
        recurrence_interval: row.get(4)?,
        start_date: row.get(5)?,
        account_id: row.get(6)?,
        category_id: row.get(7)?,
        last_run_date: row.get(8)?,
    })
}

#[derive(Debug, Clone)]
pub struct NewRecurring {
    pub description: String,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub recurrence_interval: RecurrenceInterval,
    /// `YYYY-MM-DD`
    pub start_date: String,
    pub account_id: i64,
    pub category_id: Option<i64>,
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

/// The date one interval after `date`. Month ends clamp: Jan 31 + 1 month is Feb 28/29.
pub fn advance(date: NaiveDate, interval: RecurrenceInterval) -> Option<NaiveDate> {
    match interval {
        RecurrenceInterval::Daily => date.checked_add_days(Days::new(1)),
        RecurrenceInterval::Weekly => date.checked_add_days(Days::new(7)),
        RecurrenceInterval::Monthly => date.checked_add_months(Months::new(1)),
        RecurrenceInterval::Yearly => date.checked_add_months(Months::new(12)),
    }
}

/// First date the rule is due: its start date until it has run once, then one
/// interval after the last run.
pub fn next_due(rule: &RecurringTransaction) -> Option<NaiveDate> {
    match rule.last_run_date.as_deref() {
        None => parse_day(&rule.start_date),
        Some(last) => advance(parse_day(last)?, rule.recurrence_interval),
    }
}

pub fn is_due(rule: &RecurringTransaction, today: NaiveDate) -> bool {
    let started = parse_day(&rule.start_date).is_some_and(|start| start <= today);
    started && next_due(rule).is_some_and(|due| due <= today)
}

pub fn create(conn: &Connection, rule: &NewRecurring) -> Result<i64> {
    if rule.description.trim().is_empty() {
        return Err(FinlightError::Validation("Description cannot be empty.".into()));
    }
    if !rule.amount.is_finite() || rule.amount <= 0.0 {
        return Err(FinlightError::Validation("Please enter a valid, positive amount.".into()));
    }
    let start = parse_day(&rule.start_date)
        .ok_or_else(|| FinlightError::Validation(format!("'{}' is not a YYYY-MM-DD date", rule.start_date)))?;
    crate::accounts::get(conn, rule.account_id)?;
    conn.execute(
        "INSERT INTO recurring_transactions (description, amount, transaction_type, recurrence_interval, \
         start_date, account_id, category_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            rule.description.trim(),
            rule.amount,
            rule.transaction_type,
            rule.recurrence_interval,
            start.format("%Y-%m-%d").to_string(),
            rule.account_id,
            rule.category_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> Result<RecurringTransaction> {
    conn.query_row(
        &format!("SELECT {RECURRING_COLUMNS} FROM recurring_transactions WHERE id = ?1"),
        [id],
        from_row,
    )
    .optional()?
    .ok_or(FinlightError::UnknownRecurring(id))
}

pub fn list(conn: &Connection) -> Result<Vec<RecurringTransaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECURRING_COLUMNS} FROM recurring_transactions ORDER BY description COLLATE NOCASE"
    ))?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Rules that should be confirmed on `today`.
pub fn due(conn: &Connection, today: NaiveDate) -> Result<Vec<RecurringTransaction>> {
    Ok(list(conn)?.into_iter().filter(|rule| is_due(rule, today)).collect())
}

/// Records the rule's transaction dated `today` and marks the rule as run.
pub fn confirm(conn: &Connection, id: i64, today: NaiveDate) -> Result<i64> {
    let rule = get(conn, id)?;
    if !is_due(&rule, today) {
        let when = next_due(&rule).map_or_else(|| "never".to_string(), |d| d.format("%Y-%m-%d").to_string());
        return Err(FinlightError::Validation(format!(
            "'{}' is not due until {when}.",
            rule.description
        )));
    }
    let date = today.format("%Y-%m-%d 00:00:00").to_string();
    let mut txn = NewTransaction::manual(&rule.description, rule.amount, rule.transaction_type, rule.account_id, &date);
    txn.category_id = rule.category_id;

    let tx = conn.unchecked_transaction()?;
    let txn_id = transactions::add(&tx, &txn)?;
    tx.execute(
        "UPDATE recurring_transactions SET last_run_date = ?1 WHERE id = ?2",
        rusqlite::params![today.format("%Y-%m-%d").to_string(), id],
    )?;
    tx.commit()?;
    tracing::info!(rule = id, transaction = txn_id, "recorded recurring transaction");
    Ok(txn_id)
}

pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    if conn.execute("DELETE FROM recurring_transactions WHERE id = ?1", [id])? == 0 {
        return Err(FinlightError::UnknownRecurring(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn rule(interval: RecurrenceInterval, start: &str, last_run: Option<&str>) -> RecurringTransaction {
        RecurringTransaction {
            id: 1,
            description: "Rent".into(),
            amount: 20000.0,
            transaction_type: TransactionType::Expense,
            recurrence_interval: interval,
            start_date: start.into(),
            account_id: 1,
            category_id: None,
            last_run_date: last_run.map(str::to_string),
        }
    }

    fn netflix(conn: &Connection, start: &str) -> i64 {
        let acct = crate::accounts::find_or_create(conn, "Card", "Credit Card").unwrap();
        create(
            conn,
            &NewRecurring {
                description: "Netflix".into(),
                amount: 649.0,
                transaction_type: TransactionType::Expense,
                recurrence_interval: RecurrenceInterval::Monthly,
                start_date: start.into(),
                account_id: acct,
                category_id: Some(crate::categories::require(conn, "Entertainment").unwrap().id),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_advance_clamps_month_end() {
        assert_eq!(advance(day("2025-01-31"), RecurrenceInterval::Monthly), Some(day("2025-02-28")));
        assert_eq!(advance(day("2024-02-29"), RecurrenceInterval::Yearly), Some(day("2025-02-28")));
        assert_eq!(advance(day("2025-06-28"), RecurrenceInterval::Weekly), Some(day("2025-07-05")));
        assert_eq!(advance(day("2025-12-31"), RecurrenceInterval::Daily), Some(day("2026-01-01")));
    }

    #[test]
    fn test_is_due() {
        let never_run = rule(RecurrenceInterval::Monthly, "2025-06-05", None);
        assert!(!is_due(&never_run, day("2025-06-04")));
        assert!(is_due(&never_run, day("2025-06-05")));

        let ran = rule(RecurrenceInterval::Monthly, "2025-06-05", Some("2025-06-05"));
        assert!(!is_due(&ran, day("2025-07-04")));
        assert!(is_due(&ran, day("2025-07-05")));
        assert!(is_due(&ran, day("2025-09-01")));

        let weekly = rule(RecurrenceInterval::Weekly, "2025-06-01", Some("2025-06-10"));
        assert_eq!(next_due(&weekly), Some(day("2025-06-17")));
        let future = rule(RecurrenceInterval::Daily, "2030-01-01", Some("2025-01-01"));
        assert!(!is_due(&future, day("2025-06-01")));
    }

    #[test]
    fn test_create_validates() {
        let (_dir, conn) = test_db();
        let acct = crate::accounts::create(&conn, "Cash", "Wallet").unwrap();
        let mut new = NewRecurring {
            description: "Gym".into(),
            amount: 0.0,
            transaction_type: TransactionType::Expense,
            recurrence_interval: RecurrenceInterval::Monthly,
            start_date: "2025-06-01".into(),
            account_id: acct,
            category_id: None,
        };
        assert!(matches!(create(&conn, &new), Err(FinlightError::Validation(_))));
        new.amount = 1500.0;
        new.start_date = "June".into();
        assert!(matches!(create(&conn, &new), Err(FinlightError::Validation(_))));
        new.start_date = "2025-06-01".into();
        let id = create(&conn, &new).unwrap();
        assert_eq!(get(&conn, id).unwrap().recurrence_interval, RecurrenceInterval::Monthly);
    }

    #[test]
    fn test_confirm_records_and_advances() {
        let (_dir, conn) = test_db();
        let id = netflix(&conn, "2025-06-05");
        assert_eq!(due(&conn, day("2025-06-10")).unwrap().len(), 1);

        let txn_id = confirm(&conn, id, day("2025-06-10")).unwrap();
        let txn = transactions::get(&conn, txn_id).unwrap();
        assert_eq!(txn.date, "2025-06-10 00:00:00");
        assert_eq!(txn.amount, 649.0);
        assert!(txn.category_id.is_some());
        assert_eq!(get(&conn, id).unwrap().last_run_date.as_deref(), Some("2025-06-10"));

        assert!(due(&conn, day("2025-07-09")).unwrap().is_empty());
        match confirm(&conn, id, day("2025-07-09")) {
            Err(FinlightError::Validation(msg)) => assert!(msg.contains("2025-07-10"), "{msg}"),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(due(&conn, day("2025-07-10")).unwrap().len(), 1);
    }

    #[test]
    fn test_delete() {
        let (_dir, conn) = test_db();
        let id = netflix(&conn, "2025-06-05");
        delete(&conn, id).unwrap();
        assert!(matches!(delete(&conn, id), Err(FinlightError::UnknownRecurring(_))));
        assert!(list(&conn).unwrap().is_empty());
    }
}
