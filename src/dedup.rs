use std::collections::HashSet;

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::models::PotentialTransaction;

/// Stable identity of an SMS: the last ten sender digits followed by the
/// body with whitespace runs collapsed.
pub fn sms_hash(sender: &str, body: &str) -> String {
    let digits: Vec<char> = sender.chars().filter(|c| c.is_ascii_digit()).collect();
    let tail: String = digits[digits.len().saturating_sub(10)..].iter().collect();
    let normalized_body = body.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut hasher = Sha256::new();
    hasher.update(tail.as_bytes());
    hasher.update(normalized_body.as_bytes());
    hex::encode(hasher.finalize())
}

/// Identifiers of every SMS that already produced a stored transaction.
#[derive(Debug, Default)]
pub struct ImportedIndex {
    hashes: HashSet<String>,
    sms_ids: HashSet<i64>,
}

impl ImportedIndex {
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut index = Self::default();

        let mut stmt = conn.prepare(
            "SELECT source_sms_hash FROM transactions WHERE source_sms_hash IS NOT NULL",
        )?;
        for hash in stmt.query_map([], |row| row.get::<_, String>(0))? {
            index.hashes.insert(hash?);
        }

        let mut stmt =
            conn.prepare("SELECT source_sms_id FROM transactions WHERE source_sms_id IS NOT NULL")?;
        for id in stmt.query_map([], |row| row.get::<_, i64>(0))? {
            index.sms_ids.insert(id?);
        }

        Ok(index)
    }

    pub fn contains(&self, candidate: &PotentialTransaction) -> bool {
        self.hashes.contains(&candidate.source_sms_hash) || self.sms_ids.contains(&candidate.source_sms_id)
    }

    pub fn record(&mut self, candidate: &PotentialTransaction) {
        self.hashes.insert(candidate.source_sms_hash.clone());
        self.sms_ids.insert(candidate.source_sms_id);
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::models::TransactionType;

    fn candidate(id: i64, sender: &str, body: &str) -> PotentialTransaction {
        PotentialTransaction {
            source_sms_id: id,
            sms_sender: sender.to_string(),
            sms_date: 0,
            amount: 10.0,
            transaction_type: TransactionType::Expense,
            merchant_name: None,
            original_message: body.to_string(),
            potential_account: None,
            source_sms_hash: sms_hash(sender, body),
            detected_currency_code: None,
        }
    }

    #[test]
    fn test_hash_ignores_whitespace_differences() {
        assert_eq!(
            sms_hash("AM-HDFCBK", "  Spent Rs 10   at  Cafe "),
            sms_hash("AM-HDFCBK", "Spent Rs 10 at Cafe")
        );
    }

    #[test]
    fn test_hash_uses_last_ten_sender_digits() {
        assert_eq!(sms_hash("+91 98765 43210", "hi"), sms_hash("9876543210", "hi"));
        assert_ne!(sms_hash("9876543210", "hi"), sms_hash("9876543211", "hi"));
    }

    #[test]
    fn test_hash_differs_by_body() {
        assert_ne!(sms_hash("VM-ICIBNK", "Rs 10 spent"), sms_hash("VM-ICIBNK", "Rs 11 spent"));
    }

    #[test]
    fn test_load_picks_up_stored_identifiers() {
        let (_dir, conn) = test_db();
        conn.execute("INSERT INTO accounts (name, account_type) VALUES ('Cash', 'Wallet')", []).unwrap();
        let c = candidate(42, "VM-ICIBNK", "Rs 10 spent at Cafe");
        conn.execute(
            "INSERT INTO transactions (description, amount, date, account_id, source_sms_id, source_sms_hash) \
             VALUES ('Cafe', 10.0, '2025-01-01 00:00:00', 1, ?1, ?2)",
            rusqlite::params![c.source_sms_id, c.source_sms_hash],
        )
        .unwrap();

        let index = ImportedIndex::load(&conn).unwrap();
        assert!(index.contains(&c));
        assert!(index.contains(&candidate(42, "other", "other body")));
        assert!(!index.contains(&candidate(7, "other", "other body")));
    }

    #[test]
    fn test_record_marks_batch_duplicates() {
        let mut index = ImportedIndex::default();
        let c = candidate(1, "VM-ICIBNK", "Rs 10 spent at Cafe");
        assert!(!index.contains(&c));
        index.record(&c);
        assert!(index.contains(&candidate(2, "VM-ICIBNK", "Rs 10  spent at Cafe")));
        assert_eq!(index.len(), 1);
    }
}
