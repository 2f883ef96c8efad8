use rusqlite::Connection;

use crate::error::{FinlightError, Result};
use crate::models::Budget;
use crate::splits::CATEGORY_LINES;

/// A budget next to what was actually spent against it.
#[derive(Debug, Clone)]
pub struct BudgetStatus {
    pub budget: Budget,
    pub spent: f64,
}

impl BudgetStatus {
    pub fn remaining(&self) -> f64 {
        self.budget.amount - self.spent
    }

    pub fn is_over(&self) -> bool {
        self.spent > self.budget.amount
    }
}

/// Creates or replaces the budget for a category in one month.
pub fn set(conn: &Connection, category_name: &str, amount: f64, year: i32, month: u32) -> Result<i64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(FinlightError::Validation("Please enter a valid, positive amount.".into()));
    }
    let category = crate::categories::require(conn, category_name)?;
    conn.execute(
        "INSERT INTO budgets (category_name, amount, month, year) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT (category_name, month, year) DO UPDATE SET amount = excluded.amount",
        rusqlite::params![category.name, amount, month, year],
    )?;
    Ok(conn.query_row(
        "SELECT id FROM budgets WHERE category_name = ?1 AND month = ?2 AND year = ?3",
        rusqlite::params![category.name, month, year],
        |row| row.get(0),
    )?)
}

/// Spending for a category: non-excluded expenses in the same year-month,
/// counting the matching parts of split transactions.
pub fn spending(conn: &Connection, category_name: &str, year: i32, month: u32) -> Result<f64> {
    let sql = format!(
        "SELECT COALESCE(SUM(t.amount), 0) FROM {CATEGORY_LINES} t \
         JOIN categories c ON t.category_id = c.id \
         WHERE c.name = ?1 AND t.transaction_type = 'expense' AND t.is_excluded = 0 \
         AND substr(t.date, 1, 7) = ?2"
    );
    Ok(conn.query_row(
        &sql,
        rusqlite::params![category_name, format!("{year:04}-{month:02}")],
        |row| row.get(0),
    )?)
}

pub fn list_for_month(conn: &Connection, year: i32, month: u32) -> Result<Vec<BudgetStatus>> {
    let mut stmt = conn.prepare(
        "SELECT id, category_name, amount, month, year FROM budgets \
         WHERE year = ?1 AND month = ?2 ORDER BY category_name",
    )?;
    let budgets = stmt
        .query_map(rusqlite::params![year, month], |row| {
            Ok(Budget {
                id: row.get(0)?,
                category_name: row.get(1)?,
                amount: row.get(2)?,
                month: row.get(3)?,
                year: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    budgets
        .into_iter()
        .map(|budget| {
            let spent = spending(conn, &budget.category_name, year, month)?;
            Ok(BudgetStatus { budget, spent })
        })
        .collect()
}

pub fn delete(conn: &Connection, category_name: &str, year: i32, month: u32) -> Result<()> {
    let removed = conn.execute(
        "DELETE FROM budgets WHERE category_name = ?1 COLLATE NOCASE AND year = ?2 AND month = ?3",
        rusqlite::params![category_name, year, month],
    )?;
    if removed == 0 {
        return Err(FinlightError::Other(format!(
            "no budget for '{category_name}' in {year:04}-{month:02}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::models::TransactionType;
    use crate::transactions::{self, NewTransaction};

    fn spend(conn: &Connection, acct: i64, category: &str, amount: f64, date: &str, kind: TransactionType) -> i64 {
        let mut txn = NewTransaction::manual("x", amount, kind, acct, date);
        txn.category_id = Some(crate::categories::require(conn, category).unwrap().id);
        transactions::add(conn, &txn).unwrap()
    }

    #[test]
    fn test_set_upserts() {
        let (_dir, conn) = test_db();
        let first = set(&conn, "Groceries", 5000.0, 2025, 6).unwrap();
        let second = set(&conn, "groceries", 6000.0, 2025, 6).unwrap();
        assert_eq!(first, second);
        let list = list_for_month(&conn, 2025, 6).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].budget.amount, 6000.0);
        assert_eq!(list[0].budget.category_name, "Groceries");
    }

    #[test]
    fn test_set_requires_known_category() {
        let (_dir, conn) = test_db();
        assert!(matches!(set(&conn, "Nope", 10.0, 2025, 6), Err(FinlightError::UnknownCategory(_))));
        assert!(matches!(set(&conn, "Groceries", 0.0, 2025, 6), Err(FinlightError::Validation(_))));
    }

    #[test]
    fn test_spending_counts_only_matching_expenses() {
        let (_dir, conn) = test_db();
        let acct = crate::accounts::create(&conn, "Cash", "Wallet").unwrap();
        spend(&conn, acct, "Groceries", 1200.0, "2025-06-03 10:00:00", TransactionType::Expense);
        spend(&conn, acct, "Groceries", 300.0, "2025-06-28 10:00:00", TransactionType::Expense);
        spend(&conn, acct, "Groceries", 999.0, "2025-07-01 10:00:00", TransactionType::Expense);
        spend(&conn, acct, "Groceries", 50.0, "2025-06-10 10:00:00", TransactionType::Income);
        let excluded = spend(&conn, acct, "Groceries", 700.0, "2025-06-11 10:00:00", TransactionType::Expense);
        transactions::set_excluded(&conn, excluded, true).unwrap();

        set(&conn, "Groceries", 1000.0, 2025, 6).unwrap();
        let status = &list_for_month(&conn, 2025, 6).unwrap()[0];
        assert_eq!(status.spent, 1500.0);
        assert!(status.is_over());
        assert_eq!(status.remaining(), -500.0);
    }

    #[test]
    fn test_spending_includes_split_parts() {
        let (_dir, conn) = test_db();
        let acct = crate::accounts::create(&conn, "Cash", "Wallet").unwrap();
        let id = spend(&conn, acct, "Shopping", 900.0, "2025-06-05 10:00:00", TransactionType::Expense);
        let groceries = crate::categories::require(&conn, "Groceries").unwrap().id;
        let parts = [600.0, 300.0].map(|amount| crate::splits::NewSplit {
            amount,
            category_id: Some(groceries),
            notes: None,
        });
        crate::splits::set(&conn, id, &parts).unwrap();
        assert_eq!(spending(&conn, "Groceries", 2025, 6).unwrap(), 900.0);
        assert_eq!(spending(&conn, "Shopping", 2025, 6).unwrap(), 0.0);
    }

    #[test]
    fn test_delete() {
        let (_dir, conn) = test_db();
        set(&conn, "Travel", 100.0, 2025, 6).unwrap();
        delete(&conn, "travel", 2025, 6).unwrap();
        assert!(list_for_month(&conn, 2025, 6).unwrap().is_empty());
        assert!(delete(&conn, "Travel", 2025, 6).is_err());
    }
}
