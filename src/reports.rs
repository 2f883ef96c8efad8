use chrono::Datelike;
use rusqlite::Connection;

use crate::error::{FinlightError, Result};
use crate::splits::CATEGORY_LINES;

// ---------------------------------------------------------------------------
// Date filter helper
// ---------------------------------------------------------------------------

/// Picks the `t.date` clause for a report. An explicit range wins over a
/// month or year; with nothing given the current year is used.
fn date_filter(
    year: Option<i32>,
    month: Option<u32>,
    from_date: Option<&str>,
    to_date: Option<&str>,
) -> Result<(String, Vec<String>)> {
    match (from_date, to_date) {
        (Some(from), Some(to)) => {
            return Ok((
                "substr(t.date, 1, 10) BETWEEN ?1 AND ?2".to_string(),
                vec![from.to_string(), to.to_string()],
            ));
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(FinlightError::Other(
                "--from and --to must be given together".to_string(),
            ));
        }
        (None, None) => {}
    }
    let year = year.unwrap_or_else(|| chrono::Local::now().year());
    match month {
        Some(m) => Ok(("t.date LIKE ?1".to_string(), vec![format!("{year:04}-{m:02}%")])),
        None => Ok(("t.date LIKE ?1".to_string(), vec![format!("{year:04}%")])),
    }
}

fn as_params(params: &[String]) -> Vec<&dyn rusqlite::types::ToSql> {
    params.iter().map(|p| p as &dyn rusqlite::types::ToSql).collect()
}

// ---------------------------------------------------------------------------
// Financial summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FinancialSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net: f64,
    pub count: i64,
}

pub fn get_summary(
    conn: &Connection,
    year: Option<i32>,
    month: Option<u32>,
    from_date: Option<&str>,
    to_date: Option<&str>,
) -> Result<FinancialSummary> {
    let (clause, params) = date_filter(year, month, from_date, to_date)?;
    let sql = format!(
        "SELECT COALESCE(SUM(CASE WHEN t.transaction_type = 'income' THEN t.amount ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN t.transaction_type = 'expense' THEN t.amount ELSE 0 END), 0), \
                count(*) \
         FROM transactions t WHERE {clause} AND t.is_excluded = 0"
    );
    let (total_income, total_expenses, count): (f64, f64, i64) =
        conn.query_row(&sql, as_params(&params).as_slice(), |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;
    Ok(FinancialSummary {
        total_income,
        total_expenses,
        net: total_income - total_expenses,
        count,
    })
}

// ---------------------------------------------------------------------------
// Spending breakdowns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SpendingItem {
    pub name: String,
    pub total: f64,
    pub count: i64,
    pub pct: f64,
}

fn spending_by(conn: &Connection, group_expr: &str, from: &str, year: i32, month: u32) -> Result<Vec<SpendingItem>> {
    let (clause, params) = date_filter(Some(year), Some(month), None, None)?;
    let sql = format!(
        "SELECT {group_expr} AS label, SUM(t.amount) AS total, count(*) \
         FROM {from} \
         WHERE {clause} AND t.transaction_type = 'expense' AND t.is_excluded = 0 \
         GROUP BY label ORDER BY total DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(as_params(&params).as_slice(), |row| {
            Ok(SpendingItem {
                name: row.get(0)?,
                total: row.get(1)?,
                count: row.get(2)?,
                pct: 0.0,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let grand: f64 = rows.iter().map(|r| r.total).sum();
    Ok(rows
        .into_iter()
        .map(|mut item| {
            item.pct = if grand > 0.0 { item.total * 100.0 / grand } else { 0.0 };
            item
        })
        .collect())
}

/// Expense totals per category for one month; uncategorized rows group
/// together and split transactions count under each part's category.
pub fn category_spending(conn: &Connection, year: i32, month: u32) -> Result<Vec<SpendingItem>> {
    spending_by(
        conn,
        "COALESCE(c.name, 'Uncategorized')",
        &format!("{CATEGORY_LINES} t LEFT JOIN categories c ON t.category_id = c.id"),
        year,
        month,
    )
}

pub fn merchant_spending(conn: &Connection, year: i32, month: u32) -> Result<Vec<SpendingItem>> {
    spending_by(conn, "t.description", "transactions t", year, month)
}

// ---------------------------------------------------------------------------
// Monthly trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TrendMonth {
    /// `YYYY-MM`
    pub month: String,
    pub income: f64,
    pub expenses: f64,
}

/// Income and expenses per month from `since` (`YYYY-MM-DD`) onward, oldest first.
pub fn monthly_trend(conn: &Connection, since: &str) -> Result<Vec<TrendMonth>> {
    let mut stmt = conn.prepare(
        "SELECT substr(t.date, 1, 7) AS ym, \
                COALESCE(SUM(CASE WHEN t.transaction_type = 'income' THEN t.amount ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN t.transaction_type = 'expense' THEN t.amount ELSE 0 END), 0) \
         FROM transactions t WHERE t.date >= ?1 AND t.is_excluded = 0 \
         GROUP BY ym ORDER BY ym",
    )?;
    let rows = stmt
        .query_map([since], |row| {
            Ok(TrendMonth {
                month: row.get(0)?,
                income: row.get(1)?,
                expenses: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
