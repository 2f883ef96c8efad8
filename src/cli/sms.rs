use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use super::{home_currency, open_db};
use crate::error::{FinlightError, Result};
use crate::fmt::{money, timestamp_from_millis};
use crate::inbox::read_messages;
use crate::ingest::{self, Approval, IngestContext, UNKNOWN_MERCHANT};
use crate::models::{PotentialAccount, PotentialTransaction, SmsMessage};
use crate::settings::load_settings;

fn since_millis(raw: &str) -> Result<i64> {
    use chrono::{Local, NaiveDate};
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|dt| dt.and_local_timezone(Local).earliest())
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| FinlightError::Validation(format!("'{raw}' is not a YYYY-MM-DD date")))
}

fn amount_cell(candidate: &PotentialTransaction, fallback: &str) -> String {
    let currency = candidate.detected_currency_code.as_deref().unwrap_or(fallback);
    money(candidate.amount, currency)
}

pub fn ingest(
    file: Option<&str>,
    format: Option<&str>,
    sender: Option<&str>,
    body: Option<&str>,
) -> Result<()> {
    let messages = match (file, sender, body) {
        (Some(path), _, _) => read_messages(Path::new(path), format)?,
        (None, Some(sender), Some(body)) => {
            let now = chrono::Local::now().timestamp_millis();
            vec![SmsMessage {
                id: now,
                sender: sender.to_string(),
                body: body.to_string(),
                date: now,
            }]
        }
        _ => {
            return Err(FinlightError::Validation(
                "give a message file, or --sender and --body".to_string(),
            ))
        }
    };

    let conn = open_db()?;
    let summary = ingest::ingest_batch(&conn, &messages)?;
    if load_settings().notify_unknown {
        for id in &summary.review_ids {
            println!("{}", format!("New transaction #{id} needs a category").yellow());
        }
    }

    println!(
        "{}",
        format!(
            "Saved {} transactions ({} need review), {} duplicates, {} not recognised",
            summary.saved, summary.needs_review, summary.duplicates, summary.unparsed
        )
        .green()
    );
    if summary.needs_review > 0 {
        println!("Run `finlight review` to categorize them.");
    }
    Ok(())
}

pub fn scan(file: &str, format: Option<&str>, since: Option<&str>) -> Result<()> {
    let since = since.map(since_millis).transpose()?;
    let messages = read_messages(Path::new(file), format)?;
    let conn = open_db()?;
    let currency = home_currency();
    let found = ingest::scan_messages(&conn, &messages, since)?;

    if found.is_empty() {
        println!("{}", "No new transactions found.".green());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["SMS ID", "Date", "Sender", "Merchant", "Amount", "Type", "Account"]);
    for candidate in &found {
        table.add_row(vec![
            Cell::new(candidate.source_sms_id),
            Cell::new(timestamp_from_millis(candidate.sms_date)),
            Cell::new(&candidate.sms_sender),
            Cell::new(candidate.merchant_name.as_deref().unwrap_or(UNKNOWN_MERCHANT)),
            Cell::new(amount_cell(candidate, &currency)),
            Cell::new(candidate.transaction_type.as_str()),
            Cell::new(
                candidate
                    .potential_account
                    .as_ref()
                    .map(|a| a.formatted_name.as_str())
                    .unwrap_or(""),
            ),
        ]);
    }
    println!("{} new transactions\n{table}", found.len());
    println!("Approve one with `finlight sms approve {file} --id <SMS ID>`.");
    Ok(())
}

pub struct ApproveArgs<'a> {
    pub file: &'a str,
    pub id: i64,
    pub format: Option<&'a str>,
    pub description: Option<&'a str>,
    pub category: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub tags: &'a [String],
    pub account: Option<&'a str>,
    pub learn: bool,
}

pub fn approve(args: ApproveArgs<'_>) -> Result<()> {
    let messages = read_messages(Path::new(args.file), args.format)?;
    let sms = messages
        .iter()
        .find(|m| m.id == args.id)
        .ok_or_else(|| FinlightError::Other(format!("no message with id {} in {}", args.id, args.file)))?;

    let conn = open_db()?;
    let ctx = IngestContext::load(&conn)?;
    let candidate = ctx
        .parse(sms)
        .ok_or_else(|| FinlightError::Other(format!("message {} is not a transaction", args.id)))?;

    let category_id = match args.category {
        Some(name) => Some(crate::categories::require(&conn, name)?.id),
        None => None,
    };
    let account = match args.account {
        Some(name) => Some(match crate::accounts::find_by_name(&conn, name)? {
            Some(existing) => PotentialAccount {
                formatted_name: existing.name,
                account_type: existing.account_type,
            },
            None => PotentialAccount {
                formatted_name: name.trim().to_string(),
                account_type: crate::accounts::UNKNOWN_ACCOUNT_TYPE.to_string(),
            },
        }),
        None => None,
    };
    let description = args
        .description
        .map(str::to_string)
        .or_else(|| candidate.merchant_name.clone())
        .unwrap_or_else(|| UNKNOWN_MERCHANT.to_string());

    let id = ingest::approve(
        &conn,
        &candidate,
        &Approval {
            description,
            category_id,
            notes: args.notes.map(str::to_string),
            tags: args.tags.to_vec(),
            account,
            transaction_type: None,
            learn_merchant: args.learn,
            learn_category: args.learn,
        },
    )?;
    println!("{}", format!("Saved transaction #{id}").green());
    Ok(())
}

pub fn parse(sender: &str, body: &str) -> Result<()> {
    let conn = open_db()?;
    let ctx = IngestContext::load(&conn)?;
    let now = chrono::Local::now().timestamp_millis();
    let sms = SmsMessage {
        id: 0,
        sender: sender.to_string(),
        body: body.to_string(),
        date: now,
    };
    let Some(candidate) = ctx.parse(&sms) else {
        println!("{}", "Not a transaction message.".yellow());
        return Ok(());
    };

    println!("  Type:      {}", candidate.transaction_type.as_str());
    println!("  Amount:    {}", amount_cell(&candidate, &home_currency()));
    println!("  Currency:  {}", candidate.detected_currency_code.as_deref().unwrap_or("(none)"));
    println!("  Merchant:  {}", candidate.merchant_name.as_deref().unwrap_or("(none)"));
    match &candidate.potential_account {
        Some(account) => println!("  Account:   {} ({})", account.formatted_name, account.account_type),
        None => println!("  Account:   (none)"),
    }
    if ctx.index.contains(&candidate) {
        println!("  {}", "Already imported".yellow());
    }
    Ok(())
}
