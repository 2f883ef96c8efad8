use std::path::Path;

use rusqlite::backup::Backup;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{
    Account, Budget, Category, Goal, MerchantMapping, RecurringTransaction, SplitTransaction, Tag, Transaction,
    TransactionTag, TRANSACTION_COLUMNS,
};

/// Full JSON snapshot of the user's data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub transactions: Vec<Transaction>,
    pub accounts: Vec<Account>,
    pub categories: Vec<Category>,
    pub budgets: Vec<Budget>,
    pub merchant_mappings: Vec<MerchantMapping>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub transaction_tags: Vec<TransactionTag>,
    #[serde(default)]
    pub split_transactions: Vec<SplitTransaction>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub recurring_transactions: Vec<RecurringTransaction>,
}

fn collect<T>(conn: &Connection, sql: &str, map: impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], map)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn snapshot(conn: &Connection) -> Result<Snapshot> {
    Ok(Snapshot {
        transactions: collect(
            conn,
            &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY id"),
            Transaction::from_row,
        )?,
        accounts: collect(conn, "SELECT id, name, account_type FROM accounts ORDER BY id", |row| {
            Ok(Account {
                id: row.get(0)?,
                name: row.get(1)?,
                account_type: row.get(2)?,
            })
        })?,
        categories: collect(conn, "SELECT id, name, icon_key, color_key FROM categories ORDER BY id", |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                icon_key: row.get(2)?,
                color_key: row.get(3)?,
            })
        })?,
        budgets: collect(
            conn,
            "SELECT id, category_name, amount, month, year FROM budgets ORDER BY id",
            |row| {
                Ok(Budget {
                    id: row.get(0)?,
                    category_name: row.get(1)?,
                    amount: row.get(2)?,
                    month: row.get(3)?,
                    year: row.get(4)?,
                })
            },
        )?,
        merchant_mappings: crate::rules::list_merchant_mappings(conn)?,
        tags: collect(conn, "SELECT id, name FROM tags ORDER BY id", |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?,
        transaction_tags: collect(
            conn,
            "SELECT transaction_id, tag_id FROM transaction_tags ORDER BY transaction_id, tag_id",
            |row| {
                Ok(TransactionTag {
                    transaction_id: row.get(0)?,
                    tag_id: row.get(1)?,
                })
            },
        )?,
        split_transactions: collect(
            conn,
            "SELECT id, parent_transaction_id, amount, category_id, notes FROM split_transactions ORDER BY id",
            crate::splits::from_row,
        )?,
        goals: collect(
            conn,
            &format!("SELECT {} FROM goals ORDER BY id", crate::goals::GOAL_COLUMNS),
            crate::goals::from_row,
        )?,
        recurring_transactions: collect(
            conn,
            &format!("SELECT {} FROM recurring_transactions ORDER BY id", crate::recurring::RECURRING_COLUMNS),
            crate::recurring::from_row,
        )?,
    })
}

pub fn export_json(conn: &Connection, dest: &Path) -> Result<usize> {
    let snap = snapshot(conn)?;
    let json = serde_json::to_string_pretty(&snap)?;
    std::fs::write(dest, format!("{json}\n"))?;
    Ok(snap.transactions.len())
}

/// Replaces all stored data with the snapshot. Nothing changes if any row fails.
pub fn restore(conn: &Connection, snap: &Snapshot) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "DELETE FROM split_transactions;
         DELETE FROM goals;
         DELETE FROM recurring_transactions;
         DELETE FROM transaction_tags;
         DELETE FROM tags;
         DELETE FROM transactions;
         DELETE FROM budgets;
         DELETE FROM merchant_mappings;
         DELETE FROM merchant_category_mappings;
         DELETE FROM categories;
         DELETE FROM accounts;",
    )?;

    for a in &snap.accounts {
        tx.execute(
            "INSERT INTO accounts (id, name, account_type) VALUES (?1, ?2, ?3)",
            rusqlite::params![a.id, a.name, a.account_type],
        )?;
    }
    for c in &snap.categories {
        tx.execute(
            "INSERT INTO categories (id, name, icon_key, color_key) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![c.id, c.name, c.icon_key, c.color_key],
        )?;
    }
    for t in &snap.transactions {
        tx.execute(
            &format!(
                "INSERT INTO transactions ({TRANSACTION_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
            ),
            rusqlite::params![
                t.id,
                t.description,
                t.category_id,
                t.amount,
                t.date,
                t.account_id,
                t.notes,
                t.transaction_type,
                t.source_sms_id,
                t.source_sms_hash,
                t.source,
                t.original_description,
                t.is_excluded,
                t.currency_code,
                t.is_split,
            ],
        )?;
    }
    for b in &snap.budgets {
        tx.execute(
            "INSERT INTO budgets (id, category_name, amount, month, year) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![b.id, b.category_name, b.amount, b.month, b.year],
        )?;
    }
    for m in &snap.merchant_mappings {
        tx.execute(
            "INSERT INTO merchant_mappings (sms_sender, merchant_name) VALUES (?1, ?2)",
            rusqlite::params![m.sms_sender, m.merchant_name],
        )?;
    }
    for tag in &snap.tags {
        tx.execute(
            "INSERT INTO tags (id, name) VALUES (?1, ?2)",
            rusqlite::params![tag.id, tag.name],
        )?;
    }
    for link in &snap.transaction_tags {
        tx.execute(
            "INSERT INTO transaction_tags (transaction_id, tag_id) VALUES (?1, ?2)",
            rusqlite::params![link.transaction_id, link.tag_id],
        )?;
    }
    for split in &snap.split_transactions {
        tx.execute(
            "INSERT INTO split_transactions (id, parent_transaction_id, amount, category_id, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![split.id, split.parent_transaction_id, split.amount, split.category_id, split.notes],
        )?;
    }
    for goal in &snap.goals {
        tx.execute(
            &format!(
                "INSERT INTO goals ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                crate::goals::GOAL_COLUMNS
            ),
            rusqlite::params![
                goal.id,
                goal.name,
                goal.target_amount,
                goal.saved_amount,
                goal.target_date,
                goal.account_id
            ],
        )?;
    }
    for rule in &snap.recurring_transactions {
        tx.execute(
            &format!(
                "INSERT INTO recurring_transactions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                crate::recurring::RECURRING_COLUMNS
            ),
            rusqlite::params![
                rule.id,
                rule.description,
                rule.amount,
                rule.transaction_type,
                rule.recurrence_interval,
                rule.start_date,
                rule.account_id,
                rule.category_id,
                rule.last_run_date
            ],
        )?;
    }
    tx.commit()?;
    tracing::info!(
        transactions = snap.transactions.len(),
        accounts = snap.accounts.len(),
        "restored snapshot"
    );
    Ok(())
}

pub fn import_json(conn: &Connection, src: &Path) -> Result<Snapshot> {
    let content = std::fs::read_to_string(src)?;
    let snap: Snapshot = serde_json::from_str(&content)?;
    restore(conn, &snap)?;
    Ok(snap)
}

pub const CSV_HEADER: [&str; 11] = [
    "Id",
    "ParentId",
    "Date",
    "Description",
    "Amount",
    "Type",
    "Category",
    "Account",
    "Notes",
    "IsExcluded",
    "Tags",
];

/// Writes transactions oldest first. A split transaction is followed by one
/// row per part, linked through `ParentId`; tags are joined with `|`.
pub fn export_csv(conn: &Connection, dest: &Path) -> Result<usize> {
    let rows = crate::transactions::list(conn, &Default::default())?;
    let mut wtr = csv::Writer::from_path(dest)?;
    wtr.write_record(CSV_HEADER)?;
    for row in rows.iter().rev() {
        let t = &row.transaction;
        let id = t.id.to_string();
        let amount = format!("{:.2}", t.amount);
        let excluded = if t.is_excluded { "true" } else { "false" };
        let tag_names = crate::tags::for_transaction(conn, t.id)?
            .into_iter()
            .map(|tag| tag.name)
            .collect::<Vec<_>>()
            .join("|");
        let category = if t.is_split {
            crate::splits::SPLIT_CATEGORY
        } else {
            row.category_name.as_deref().unwrap_or("")
        };
        wtr.write_record([
            id.as_str(),
            "",
            t.date.as_str(),
            t.description.as_str(),
            amount.as_str(),
            t.transaction_type.as_str(),
            category,
            row.account_name.as_str(),
            t.notes.as_deref().unwrap_or(""),
            excluded,
            tag_names.as_str(),
        ])?;

        if !t.is_split {
            continue;
        }
        for part in crate::splits::list(conn, t.id)? {
            let part_amount = format!("{:.2}", part.split.amount);
            let category = part.category_name.as_deref().unwrap_or("");
            let notes = part.split.notes.as_deref().unwrap_or("");
            wtr.write_record([
                "",
                id.as_str(),
                t.date.as_str(),
                if notes.is_empty() { category } else { notes },
                part_amount.as_str(),
                t.transaction_type.as_str(),
                category,
                row.account_name.as_str(),
                notes,
                excluded,
                "",
            ])?;
        }
    }
    wtr.flush()?;
    Ok(rows.len())
}

/// Byte-for-byte copy of the live database through SQLite's online backup.
pub fn backup_database(conn: &Connection, dest: &Path) -> Result<u64> {
    let mut dest_conn = Connection::open(dest)?;
    let backup = Backup::new(conn, &mut dest_conn)?;
    backup.run_to_completion(100, std::time::Duration::from_millis(10), None)?;
    drop(backup);
    Ok(std::fs::metadata(dest)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::models::TransactionType;
    use crate::transactions::{self, NewTransaction};

    fn seed(conn: &Connection) -> i64 {
        let acct = crate::accounts::create(conn, "HDFC Bank - xx9922", "Card").unwrap();
        let mut txn = NewTransaction::manual("Amazon", 750.5, TransactionType::Expense, acct, "2025-06-22 10:00:00");
        txn.category_id = Some(crate::categories::require(conn, "Shopping").unwrap().id);
        txn.notes = Some("headphones, case".into());
        txn.source_sms_hash = Some("abc".into());
        let id = transactions::add(conn, &txn).unwrap();
        crate::tags::attach(conn, id, "Gadgets").unwrap();
        crate::budgets::set(conn, "Shopping", 2000.0, 2025, 6).unwrap();
        crate::rules::set_merchant_mapping(conn, "AM-HDFCBK", "Amazon").unwrap();
        id
    }

    #[test]
    fn test_json_roundtrip_reproduces_data() {
        let (dir, conn) = test_db();
        seed(&conn);
        let path = dir.path().join("export.json");
        assert_eq!(export_json(&conn, &path).unwrap(), 1);
        let before = snapshot(&conn).unwrap();

        let (_dir2, other) = test_db();
        crate::accounts::create(&other, "Stale", "Wallet").unwrap();
        import_json(&other, &path).unwrap();
        assert_eq!(snapshot(&other).unwrap(), before);
    }

    #[test]
    fn test_import_without_tags_defaults_empty() {
        let (dir, conn) = test_db();
        let path = dir.path().join("old.json");
        std::fs::write(
            &path,
            r#"{"transactions": [], "accounts": [{"id": 3, "name": "Cash", "account_type": "Wallet"}],
                "categories": [{"id": 1, "name": "Food"}], "budgets": [], "merchant_mappings": []}"#,
        )
        .unwrap();
        let snap = import_json(&conn, &path).unwrap();
        assert!(snap.tags.is_empty());
        assert!(snap.split_transactions.is_empty());
        assert!(snap.goals.is_empty());
        let cat = crate::categories::require(&conn, "Food").unwrap();
        assert_eq!(cat.icon_key, "category");
        assert_eq!(crate::accounts::list(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_import_keeps_existing_data() {
        let (dir, conn) = test_db();
        seed(&conn);
        let mut snap = snapshot(&conn).unwrap();
        // dangling account reference trips the foreign key
        snap.transactions[0].account_id = 999;
        let path = dir.path().join("bad.json");
        std::fs::write(&path, serde_json::to_string(&snap).unwrap()).unwrap();
        assert!(import_json(&conn, &path).is_err());
        assert_eq!(crate::accounts::list(&conn).unwrap().len(), 1);
        assert_eq!(transactions::list(&conn, &Default::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_csv_export() {
        let (dir, conn) = test_db();
        seed(&conn);
        let path = dir.path().join("tx.csv");
        assert_eq!(export_csv(&conn, &path).unwrap(), 1);
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("Id,ParentId,Date,Description,Amount,Type,Category,Account,Notes,IsExcluded,Tags")
        );
        assert_eq!(
            lines.next(),
            Some("1,,2025-06-22 10:00:00,Amazon,750.50,expense,Shopping,HDFC Bank - xx9922,\"headphones, case\",false,Gadgets")
        );
    }

    #[test]
    fn test_csv_export_lists_split_parts_and_reimports() {
        let (dir, conn) = test_db();
        let id = seed(&conn);
        crate::tags::attach(&conn, id, "Work").unwrap();
        let parts = [("Shopping", 500.5, Some("headphones")), ("Health", 250.0, None)].map(|(name, amount, notes)| {
            crate::splits::NewSplit {
                amount,
                category_id: Some(crate::categories::require(&conn, name).unwrap().id),
                notes: notes.map(str::to_string),
            }
        });
        crate::splits::set(&conn, id, &parts).unwrap();

        let path = dir.path().join("tx.csv");
        export_csv(&conn, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("1,,2025-06-22 10:00:00,Amazon,750.50,expense,Split Transaction,"));
        assert!(lines[1].ends_with(",false,Gadgets|Work"));
        assert_eq!(
            lines[2],
            ",1,2025-06-22 10:00:00,headphones,500.50,expense,Shopping,HDFC Bank - xx9922,headphones,false,"
        );
        assert_eq!(lines[3], ",1,2025-06-22 10:00:00,Health,250.00,expense,Health,HDFC Bank - xx9922,,false,");

        let (_dir2, other) = test_db();
        let report = crate::csv_import::validate_csv(&other, &path).unwrap();
        let result = crate::csv_import::commit(&other, &report).unwrap();
        assert_eq!(result.transactions, 1);
        assert_eq!(result.splits, 2);
        let parent = transactions::get(&other, 1).unwrap();
        assert!(parent.is_split);
        assert_eq!(crate::tags::for_transaction(&other, 1).unwrap().len(), 2);
    }

    #[test]
    fn test_snapshot_carries_splits_goals_and_recurring() {
        let (dir, conn) = test_db();
        let id = seed(&conn);
        let parts = [375.25, 375.25].map(|amount| crate::splits::NewSplit {
            amount,
            category_id: None,
            notes: None,
        });
        crate::splits::set(&conn, id, &parts).unwrap();
        let acct = crate::accounts::require(&conn, "HDFC Bank - xx9922").unwrap().id;
        crate::goals::create(&conn, "Laptop", 80000.0, Some("2025-12-31"), acct).unwrap();
        crate::recurring::create(
            &conn,
            &crate::recurring::NewRecurring {
                description: "Netflix".into(),
                amount: 649.0,
                transaction_type: TransactionType::Expense,
                recurrence_interval: crate::models::RecurrenceInterval::Monthly,
                start_date: "2025-06-05".into(),
                account_id: acct,
                category_id: None,
            },
        )
        .unwrap();

        let path = dir.path().join("export.json");
        export_json(&conn, &path).unwrap();
        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"split_transactions\""));
        let (_dir2, other) = test_db();
        let snap = import_json(&other, &path).unwrap();
        assert_eq!(snap.split_transactions.len(), 2);
        assert_eq!(snapshot(&other).unwrap(), snapshot(&conn).unwrap());
    }

    #[test]
    fn test_backup_database() {
        let (dir, conn) = test_db();
        seed(&conn);
        let dest = dir.path().join("copy.db");
        assert!(backup_database(&conn, &dest).unwrap() > 0);
        let copy = Connection::open(&dest).unwrap();
        let count: i64 = copy.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 1);
    }
}
