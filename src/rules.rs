use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension};

use crate::error::{FinlightError, Result};
use crate::models::{CustomSmsRule, IgnoreRule, IgnoreRuleType, MerchantMapping};
use crate::sms_parser::ParseRules;

/// Everything the parser needs from storage, custom rules by priority.
pub fn load_parse_rules(conn: &Connection) -> Result<ParseRules> {
    Ok(ParseRules {
        custom: list_custom(conn)?,
        ignore: list_ignore(conn)?.into_iter().filter(|r| r.is_enabled).collect(),
        renames: rename_map(conn)?,
    })
}

// ---------------------------------------------------------------------------
// Ignore rules
// ---------------------------------------------------------------------------

pub fn list_ignore(conn: &Connection) -> Result<Vec<IgnoreRule>> {
    let mut stmt = conn.prepare(
        "SELECT id, rule_type, pattern, is_enabled, is_default FROM ignore_rules ORDER BY is_default DESC, id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(IgnoreRule {
                id: row.get(0)?,
                rule_type: row.get(1)?,
                pattern: row.get(2)?,
                is_enabled: row.get(3)?,
                is_default: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn add_ignore(conn: &Connection, rule_type: IgnoreRuleType, pattern: &str) -> Result<i64> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(FinlightError::Validation("Ignore pattern cannot be empty.".into()));
    }
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO ignore_rules (rule_type, pattern, is_enabled, is_default) VALUES (?1, ?2, 1, 0)",
        rusqlite::params![rule_type, pattern],
    )?;
    if inserted == 0 {
        return Err(FinlightError::Duplicate(format!("ignore rule '{pattern}'")));
    }
    Ok(conn.last_insert_rowid())
}

pub fn set_ignore_enabled(conn: &Connection, id: i64, enabled: bool) -> Result<()> {
    if conn.execute(
        "UPDATE ignore_rules SET is_enabled = ?1 WHERE id = ?2",
        rusqlite::params![enabled, id],
    )? == 0
    {
        return Err(FinlightError::Other(format!("no ignore rule with id {id}")));
    }
    Ok(())
}

/// Default rules can only be disabled, not deleted.
pub fn delete_ignore(conn: &Connection, id: i64) -> Result<()> {
    let is_default: Option<bool> = conn
        .query_row("SELECT is_default FROM ignore_rules WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    match is_default {
        None => Err(FinlightError::Other(format!("no ignore rule with id {id}"))),
        Some(true) => Err(FinlightError::Validation(
            "Default ignore rules cannot be deleted; disable them instead.".into(),
        )),
        Some(false) => {
            conn.execute("DELETE FROM ignore_rules WHERE id = ?1", [id])?;
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Custom extraction rules
// ---------------------------------------------------------------------------

pub fn list_custom(conn: &Connection) -> Result<Vec<CustomSmsRule>> {
    let mut stmt = conn.prepare(
        "SELECT id, trigger_phrase, merchant_regex, amount_regex, account_regex, priority \
         FROM custom_sms_rules ORDER BY priority DESC, id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CustomSmsRule {
                id: row.get(0)?,
                trigger_phrase: row.get(1)?,
                merchant_regex: row.get(2)?,
                amount_regex: row.get(3)?,
                account_regex: row.get(4)?,
                priority: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Stores a rule after checking every supplied regex compiles and has a capture group.
pub fn add_custom(
    conn: &Connection,
    trigger_phrase: &str,
    merchant_regex: Option<&str>,
    amount_regex: Option<&str>,
    account_regex: Option<&str>,
    priority: i64,
) -> Result<i64> {
    let trigger_phrase = trigger_phrase.trim();
    if trigger_phrase.is_empty() {
        return Err(FinlightError::Validation("Trigger phrase cannot be empty.".into()));
    }
    for pattern in [merchant_regex, amount_regex, account_regex].into_iter().flatten() {
        let re = regex::Regex::new(pattern)
            .map_err(|e| FinlightError::Validation(format!("invalid regex '{pattern}': {e}")))?;
        if re.captures_len() < 2 {
            return Err(FinlightError::Validation(format!(
                "regex '{pattern}' needs a capture group"
            )));
        }
    }
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO custom_sms_rules (trigger_phrase, merchant_regex, amount_regex, account_regex, priority) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![trigger_phrase, merchant_regex, amount_regex, account_regex, priority],
    )?;
    if inserted == 0 {
        return Err(FinlightError::Duplicate(format!("custom rule '{trigger_phrase}'")));
    }
    Ok(conn.last_insert_rowid())
}

pub fn delete_custom(conn: &Connection, id: i64) -> Result<()> {
    if conn.execute("DELETE FROM custom_sms_rules WHERE id = ?1", [id])? == 0 {
        return Err(FinlightError::Other(format!("no custom rule with id {id}")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Merchant renames
// ---------------------------------------------------------------------------

pub fn rename_map(conn: &Connection) -> Result<HashMap<String, String>> {
    let mut stmt = conn.prepare("SELECT original_name, new_name FROM merchant_rename_rules")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;
    Ok(rows)
}

pub fn set_rename(conn: &Connection, original_name: &str, new_name: &str) -> Result<()> {
    if original_name.trim().is_empty() || new_name.trim().is_empty() {
        return Err(FinlightError::Validation("Merchant names cannot be empty.".into()));
    }
    conn.execute(
        "INSERT INTO merchant_rename_rules (original_name, new_name) VALUES (?1, ?2) \
         ON CONFLICT (original_name) DO UPDATE SET new_name = excluded.new_name",
        rusqlite::params![original_name.trim(), new_name.trim()],
    )?;
    Ok(())
}

pub fn delete_rename(conn: &Connection, original_name: &str) -> Result<()> {
    if conn.execute("DELETE FROM merchant_rename_rules WHERE original_name = ?1", [original_name])? == 0 {
        return Err(FinlightError::Other(format!("no rename rule for '{original_name}'")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Sender -> merchant mappings
// ---------------------------------------------------------------------------

pub fn merchant_mappings(conn: &Connection) -> Result<HashMap<String, String>> {
    Ok(list_merchant_mappings(conn)?
        .into_iter()
        .map(|m| (m.sms_sender, m.merchant_name))
        .collect())
}

pub fn list_merchant_mappings(conn: &Connection) -> Result<Vec<MerchantMapping>> {
    let mut stmt = conn.prepare("SELECT sms_sender, merchant_name FROM merchant_mappings ORDER BY sms_sender")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MerchantMapping {
                sms_sender: row.get(0)?,
                merchant_name: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// One mapping per sender; a later call replaces the merchant name.
pub fn set_merchant_mapping(conn: &Connection, sms_sender: &str, merchant_name: &str) -> Result<()> {
    if sms_sender.is_empty() || merchant_name.trim().is_empty() {
        return Err(FinlightError::Validation("Sender and merchant cannot be empty.".into()));
    }
    conn.execute(
        "INSERT INTO merchant_mappings (sms_sender, merchant_name) VALUES (?1, ?2) \
         ON CONFLICT (sms_sender) DO UPDATE SET merchant_name = excluded.merchant_name",
        rusqlite::params![sms_sender, merchant_name.trim()],
    )?;
    Ok(())
}

pub fn delete_merchant_mapping(conn: &Connection, sms_sender: &str) -> Result<()> {
    if conn.execute("DELETE FROM merchant_mappings WHERE sms_sender = ?1", [sms_sender])? == 0 {
        return Err(FinlightError::Other(format!("no mapping for sender '{sms_sender}'")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Merchant -> category mappings
// ---------------------------------------------------------------------------

pub fn category_for_merchant(conn: &Connection, parsed_name: &str) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT category_id FROM merchant_category_mappings WHERE parsed_name = ?1 COLLATE NOCASE",
            [parsed_name.trim()],
            |row| row.get(0),
        )
        .optional()?)
}

pub fn set_category_mapping(conn: &Connection, parsed_name: &str, category_id: i64) -> Result<()> {
    let parsed_name = parsed_name.trim();
    if parsed_name.is_empty() {
        return Err(FinlightError::Validation("Merchant name cannot be empty.".into()));
    }
    conn.execute(
        "INSERT INTO merchant_category_mappings (parsed_name, category_id) VALUES (?1, ?2) \
         ON CONFLICT (parsed_name) DO UPDATE SET category_id = excluded.category_id",
        rusqlite::params![parsed_name, category_id],
    )?;
    Ok(())
}

pub fn list_category_mappings(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT m.parsed_name, c.name FROM merchant_category_mappings m \
         JOIN categories c ON c.id = m.category_id ORDER BY m.parsed_name",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete_category_mapping(conn: &Connection, parsed_name: &str) -> Result<()> {
    if conn.execute(
        "DELETE FROM merchant_category_mappings WHERE parsed_name = ?1 COLLATE NOCASE",
        [parsed_name],
    )? == 0
    {
        return Err(FinlightError::Other(format!("no category mapping for '{parsed_name}'")));
    }
    Ok(())
}
