use std::collections::HashMap;

use rusqlite::Connection;

use crate::accounts::{UNKNOWN_ACCOUNT, UNKNOWN_ACCOUNT_TYPE};
use crate::dedup::ImportedIndex;
use crate::error::{FinlightError, Result};
use crate::fmt::timestamp_from_millis;
use crate::models::{PotentialAccount, PotentialTransaction, SmsMessage, TransactionSource, TransactionType};
use crate::sms_parser::{self, ParseRules};
use crate::transactions::{self, NewTransaction};

pub const UNKNOWN_MERCHANT: &str = "Unknown Merchant";

/// Rules, mappings and the imported index, loaded once per batch.
pub struct IngestContext {
    pub rules: ParseRules,
    pub mappings: HashMap<String, String>,
    pub index: ImportedIndex,
}

impl IngestContext {
    pub fn load(conn: &Connection) -> Result<Self> {
        let index = ImportedIndex::load(conn)?;
        tracing::debug!(imported = index.len(), "loaded imported index");
        Ok(Self {
            rules: crate::rules::load_parse_rules(conn)?,
            mappings: crate::rules::merchant_mappings(conn)?,
            index,
        })
    }

    pub fn parse(&self, sms: &SmsMessage) -> Option<PotentialTransaction> {
        sms_parser::parse(sms, &self.mappings, &self.rules)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Unparsed,
    Duplicate,
    Saved { id: i64, needs_review: bool },
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct IngestSummary {
    pub saved: usize,
    pub needs_review: usize,
    pub duplicates: usize,
    pub unparsed: usize,
    /// Ids of saved transactions waiting in the review queue.
    pub review_ids: Vec<i64>,
}

fn resolve_account(conn: &Connection, hint: Option<&PotentialAccount>) -> Result<i64> {
    match hint {
        Some(account) => crate::accounts::find_or_create(conn, &account.formatted_name, &account.account_type),
        None => crate::accounts::find_or_create(conn, UNKNOWN_ACCOUNT, UNKNOWN_ACCOUNT_TYPE),
    }
}

/// Parses one SMS and stores it unless it was already imported.
pub fn ingest_message(conn: &Connection, ctx: &mut IngestContext, sms: &SmsMessage) -> Result<IngestOutcome> {
    let Some(candidate) = ctx.parse(sms) else {
        return Ok(IngestOutcome::Unparsed);
    };
    if ctx.index.contains(&candidate) {
        tracing::debug!(sms_id = sms.id, "already imported");
        return Ok(IngestOutcome::Duplicate);
    }

    let category_id = match candidate.merchant_name.as_deref() {
        Some(merchant) => crate::rules::category_for_merchant(conn, merchant)?,
        None => None,
    };
    if let (Some(merchant), Some(category_id)) = (candidate.merchant_name.as_deref(), category_id) {
        tracing::debug!(merchant, category_id, "using learned category");
    }

    let tx = conn.unchecked_transaction()?;
    let account_id = resolve_account(&tx, candidate.potential_account.as_ref())?;
    let needs_review = category_id.is_none();
    let id = transactions::add(
        &tx,
        &NewTransaction {
            description: candidate
                .merchant_name
                .clone()
                .unwrap_or_else(|| UNKNOWN_MERCHANT.to_string()),
            category_id,
            amount: candidate.amount,
            date: timestamp_from_millis(candidate.sms_date),
            account_id,
            notes: None,
            transaction_type: candidate.transaction_type,
            source_sms_id: Some(candidate.source_sms_id),
            source_sms_hash: Some(candidate.source_sms_hash.clone()),
            source: if needs_review {
                TransactionSource::NeedsReview
            } else {
                TransactionSource::AutoImported
            },
            original_description: candidate.merchant_name.clone(),
            currency_code: candidate.detected_currency_code.clone(),
        },
    )?;
    tx.commit()?;

    ctx.index.record(&candidate);
    tracing::info!(id, sms_id = sms.id, needs_review, "saved sms transaction");
    Ok(IngestOutcome::Saved { id, needs_review })
}

pub fn ingest_batch(conn: &Connection, messages: &[SmsMessage]) -> Result<IngestSummary> {
    let mut ctx = IngestContext::load(conn)?;
    let mut summary = IngestSummary::default();
    for sms in messages {
        let outcome = match ingest_message(conn, &mut ctx, sms) {
            Err(FinlightError::Validation(reason)) => {
                // the message's own transaction rolled back; keep going
                tracing::warn!(sms_id = sms.id, %reason, "skipping sms");
                IngestOutcome::Unparsed
            }
            other => other?,
        };
        match outcome {
            IngestOutcome::Unparsed => summary.unparsed += 1,
            IngestOutcome::Duplicate => summary.duplicates += 1,
            IngestOutcome::Saved { id, needs_review } => {
                summary.saved += 1;
                if needs_review {
                    summary.needs_review += 1;
                    summary.review_ids.push(id);
                }
            }
        }
    }
    Ok(summary)
}

/// Candidates from `messages` not yet imported, in input order. Nothing is
/// stored; repeats inside the batch are reported once.
pub fn scan_messages(
    conn: &Connection,
    messages: &[SmsMessage],
    since: Option<i64>,
) -> Result<Vec<PotentialTransaction>> {
    let mut ctx = IngestContext::load(conn)?;
    let mut found = Vec::new();
    for sms in messages.iter().filter(|m| since.map_or(true, |s| m.date >= s)) {
        if let Some(candidate) = ctx.parse(sms) {
            if !ctx.index.contains(&candidate) {
                ctx.index.record(&candidate);
                found.push(candidate);
            }
        }
    }
    tracing::info!(scanned = messages.len(), found = found.len(), "sms scan complete");
    Ok(found)
}

/// What a reviewer decided about a scanned candidate.
#[derive(Debug, Clone, Default)]
pub struct Approval {
    pub description: String,
    pub category_id: Option<i64>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    /// Overrides the parsed account hint.
    pub account: Option<PotentialAccount>,
    pub transaction_type: Option<TransactionType>,
    /// Remember sender -> description for future messages.
    pub learn_merchant: bool,
    /// Remember parsed merchant -> category.
    pub learn_category: bool,
}

/// Stores a reviewed candidate as a `Reviewed Import`.
pub fn approve(conn: &Connection, candidate: &PotentialTransaction, approval: &Approval) -> Result<i64> {
    let index = ImportedIndex::load(conn)?;
    if index.contains(candidate) {
        return Err(FinlightError::Duplicate(format!(
            "sms {} was already imported",
            candidate.source_sms_id
        )));
    }

    let tx = conn.unchecked_transaction()?;
    let hint = approval.account.as_ref().or(candidate.potential_account.as_ref());
    let account_id = resolve_account(&tx, hint)?;
    let notes = approval.notes.clone().filter(|n| !n.trim().is_empty());
    let id = transactions::add(
        &tx,
        &NewTransaction {
            description: approval.description.clone(),
            category_id: approval.category_id,
            amount: candidate.amount,
            date: timestamp_from_millis(candidate.sms_date),
            account_id,
            notes,
            transaction_type: approval.transaction_type.unwrap_or(candidate.transaction_type),
            source_sms_id: Some(candidate.source_sms_id),
            source_sms_hash: Some(candidate.source_sms_hash.clone()),
            source: TransactionSource::ReviewedImport,
            original_description: candidate.merchant_name.clone(),
            currency_code: candidate.detected_currency_code.clone(),
        },
    )?;

    for tag in approval.tags.iter().filter(|t| !t.trim().is_empty()) {
        crate::tags::attach(&tx, id, tag)?;
    }
    if approval.learn_merchant {
        crate::rules::set_merchant_mapping(&tx, &candidate.sms_sender, &approval.description)?;
    }
    if approval.learn_category {
        if let (Some(merchant), Some(category_id)) = (candidate.merchant_name.as_deref(), approval.category_id) {
            crate::rules::set_category_mapping(&tx, merchant, category_id)?;
        }
    }
    tx.commit()?;
    tracing::info!(id, sms_id = candidate.source_sms_id, "approved sms transaction");
    Ok(id)
}
