use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::Result;

pub const DB_FILE: &str = "finlight.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL COLLATE NOCASE UNIQUE,
    account_type TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    icon_key TEXT NOT NULL DEFAULT 'category',
    color_key TEXT NOT NULL DEFAULT 'gray'
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    description TEXT NOT NULL,
    category_id INTEGER,
    amount REAL NOT NULL,
    date TEXT NOT NULL,
    account_id INTEGER NOT NULL,
    notes TEXT,
    transaction_type TEXT NOT NULL DEFAULT 'expense',
    source_sms_id INTEGER,
    source_sms_hash TEXT,
    source TEXT NOT NULL DEFAULT 'Manual Entry',
    original_description TEXT,
    is_excluded INTEGER NOT NULL DEFAULT 0,
    currency_code TEXT,
    is_split INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE,
    FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);
CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_transactions_sms_hash
    ON transactions(source_sms_hash) WHERE source_sms_hash IS NOT NULL;

CREATE TABLE IF NOT EXISTS budgets (
    id INTEGER PRIMARY KEY,
    category_name TEXT NOT NULL,
    amount REAL NOT NULL,
    month INTEGER NOT NULL,
    year INTEGER NOT NULL,
    UNIQUE (category_name, month, year)
);

CREATE TABLE IF NOT EXISTS merchant_mappings (
    sms_sender TEXT PRIMARY KEY,
    merchant_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS merchant_rename_rules (
    original_name TEXT PRIMARY KEY,
    new_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS merchant_category_mappings (
    parsed_name TEXT PRIMARY KEY COLLATE NOCASE,
    category_id INTEGER NOT NULL,
    FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS custom_sms_rules (
    id INTEGER PRIMARY KEY,
    trigger_phrase TEXT NOT NULL UNIQUE,
    merchant_regex TEXT,
    amount_regex TEXT,
    account_regex TEXT,
    priority INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS ignore_rules (
    id INTEGER PRIMARY KEY,
    rule_type TEXT NOT NULL DEFAULT 'body_phrase',
    pattern TEXT NOT NULL UNIQUE,
    is_enabled INTEGER NOT NULL DEFAULT 1,
    is_default INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL COLLATE NOCASE UNIQUE
);

CREATE TABLE IF NOT EXISTS transaction_tags (
    transaction_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    PRIMARY KEY (transaction_id, tag_id),
    FOREIGN KEY (transaction_id) REFERENCES transactions(id) ON DELETE CASCADE,
    FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS split_transactions (
    id INTEGER PRIMARY KEY,
    parent_transaction_id INTEGER NOT NULL,
    amount REAL NOT NULL,
    category_id INTEGER,
    notes TEXT,
    FOREIGN KEY (parent_transaction_id) REFERENCES transactions(id) ON DELETE CASCADE,
    FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_splits_parent ON split_transactions(parent_transaction_id);

CREATE TABLE IF NOT EXISTS goals (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    target_amount REAL NOT NULL,
    saved_amount REAL NOT NULL DEFAULT 0,
    target_date TEXT,
    account_id INTEGER NOT NULL,
    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS recurring_transactions (
    id INTEGER PRIMARY KEY,
    description TEXT NOT NULL,
    amount REAL NOT NULL,
    transaction_type TEXT NOT NULL,
    recurrence_interval TEXT NOT NULL,
    start_date TEXT NOT NULL,
    account_id INTEGER NOT NULL,
    category_id INTEGER,
    last_run_date TEXT,
    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE,
    FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL
);
";

// (name, icon_key, color_key)
const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Bills", "receipt", "red"),
    ("Education", "school", "blue"),
    ("Entertainment", "movie", "purple"),
    ("Food & Drinks", "restaurant", "orange"),
    ("Groceries", "cart", "green"),
    ("Health", "health", "pink"),
    ("Investment", "trending_up", "teal"),
    ("Salary", "work", "green_light"),
    ("Shopping", "shopping_bag", "indigo"),
    ("Transfers", "swap", "gray"),
    ("Travel", "flight", "cyan"),
    ("Other", "category", "gray_light"),
];

/// Phrases seeded as default ignore rules; they match confirmations that
/// are not new money movement.
pub const DEFAULT_IGNORE_PHRASES: &[&str] = &[
    "invoice of",
    "payment of.*is successful",
    "has been credited to",
    "payment of.*has been received towards",
    "credited to your.*card",
    "Payment of.*has been received on your.*Credit Card",
];

pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILE)
}

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

// Databases created before split support lack this column.
fn add_missing_columns(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('transactions')")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if !columns.iter().any(|c| c == "is_split") {
        conn.execute_batch("ALTER TABLE transactions ADD COLUMN is_split INTEGER NOT NULL DEFAULT 0")?;
    }
    Ok(())
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    add_missing_columns(conn)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |row| row.get(0))?;
    if count == 0 {
        for (name, icon, color) in DEFAULT_CATEGORIES {
            conn.execute(
                "INSERT INTO categories (name, icon_key, color_key) VALUES (?1, ?2, ?3)",
                rusqlite::params![name, icon, color],
            )?;
        }
    }

    for phrase in DEFAULT_IGNORE_PHRASES {
        conn.execute(
            "INSERT OR IGNORE INTO ignore_rules (rule_type, pattern, is_enabled, is_default) \
             VALUES ('body_phrase', ?1, 1, 1)",
            [phrase],
        )?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = get_connection(&dir.path().join("test.db")).unwrap();
    init_db(&conn).unwrap();
    (dir, conn)
}
