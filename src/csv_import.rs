use std::collections::{HashMap, HashSet};
use std::path::Path;

use rusqlite::Connection;

use crate::error::{FinlightError, Result};
use crate::fmt::normalize_date;
use crate::models::{TransactionSource, TransactionType};
use crate::splits::{NewSplit, SPLIT_CATEGORY};
use crate::transactions::{self, NewTransaction};
use crate::{accounts, categories, splits, tags};

/// Account type given to accounts created by an import.
pub const IMPORTED_ACCOUNT_TYPE: &str = "Imported";

const REQUIRED_COLUMNS: [&str; 6] = ["Date", "Description", "Amount", "Type", "Category", "Account"];

// ---------------------------------------------------------------------------
// Row status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvRowStatus {
    Valid,
    NeedsAccountCreation(String),
    NeedsCategoryCreation(String),
    NeedsBothCreation,
    InvalidColumnCount,
    InvalidDate,
    InvalidAmount,
    InvalidType,
    MissingDescription,
    /// A split part whose parent row is absent or unusable.
    OrphanSplit,
}

impl CsvRowStatus {
    pub fn is_importable(&self) -> bool {
        matches!(
            self,
            Self::Valid | Self::NeedsAccountCreation(_) | Self::NeedsCategoryCreation(_) | Self::NeedsBothCreation
        )
    }

    pub fn message(&self) -> String {
        match self {
            Self::Valid => "Ready to import.".to_string(),
            Self::NeedsBothCreation => "New Account & Category will be created.".to_string(),
            Self::NeedsAccountCreation(name) => format!("New Account '{name}' will be created."),
            Self::NeedsCategoryCreation(name) => format!("New Category '{name}' will be created."),
            Self::InvalidColumnCount => "Invalid column count. This row has errors and will be skipped.".to_string(),
            Self::InvalidDate => "Invalid date. This row has errors and will be skipped.".to_string(),
            Self::InvalidAmount => "Invalid amount. This row has errors and will be skipped.".to_string(),
            Self::InvalidType => "Type must be income or expense. This row has errors and will be skipped.".to_string(),
            Self::MissingDescription => "Missing description. This row has errors and will be skipped.".to_string(),
            Self::OrphanSplit => "Split part without a usable parent row. It will be skipped.".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A data row after field parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub csv_id: Option<String>,
    pub parent_id: Option<String>,
    pub date: String,
    pub description: String,
    pub amount: f64,
    pub transaction_type: TransactionType,
    /// Empty means uncategorized.
    pub category: String,
    pub account: String,
    pub notes: Option<String>,
    pub is_excluded: bool,
    pub tags: Vec<String>,
}

impl ImportRow {
    pub fn is_split_parent(&self) -> bool {
        self.parent_id.is_none() && self.category.eq_ignore_ascii_case(SPLIT_CATEGORY)
    }
}

#[derive(Debug, Clone)]
pub struct CsvReviewRow {
    /// 1-based line in the file, header included.
    pub line: usize,
    pub status: CsvRowStatus,
    pub raw: Vec<String>,
    pub row: Option<ImportRow>,
}

#[derive(Debug, Clone)]
pub struct CsvValidationReport {
    pub header: Vec<String>,
    pub rows: Vec<CsvReviewRow>,
    /// Set when the file carries `Id` and `ParentId`, so split parts are linked.
    pub is_finlight_export: bool,
}

impl CsvValidationReport {
    pub fn importable(&self) -> usize {
        self.rows.iter().filter(|r| r.status.is_importable()).count()
    }

    pub fn skipped(&self) -> usize {
        self.rows.len() - self.importable()
    }
}

struct Columns(HashMap<String, usize>);

impl Columns {
    fn from_header(header: &[String]) -> Result<Self> {
        let map: HashMap<String, usize> = header.iter().enumerate().map(|(i, h)| (h.clone(), i)).collect();
        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !map.contains_key(**c)) {
            return Err(FinlightError::Validation(format!("CSV header is missing the '{missing}' column.")));
        }
        Ok(Self(map))
    }

    fn get<'a>(&self, record: &'a csv::StringRecord, name: &str) -> Option<&'a str> {
        self.0.get(name).and_then(|&i| record.get(i)).map(str::trim)
    }

    fn required_len(&self) -> usize {
        REQUIRED_COLUMNS.iter().filter_map(|c| self.0.get(*c)).max().map_or(0, |i| i + 1)
    }
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.filter(|v| !v.is_empty()).map(str::to_string)
}

fn parse_record(columns: &Columns, record: &csv::StringRecord, linked: bool) -> std::result::Result<ImportRow, CsvRowStatus> {
    if record.len() < columns.required_len() {
        return Err(CsvRowStatus::InvalidColumnCount);
    }
    let field = |name: &str| columns.get(record, name).unwrap_or("");
    let date = normalize_date(field("Date")).ok_or(CsvRowStatus::InvalidDate)?;
    let amount = field("Amount")
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite() && *a > 0.0)
        .ok_or(CsvRowStatus::InvalidAmount)?;
    let transaction_type = TransactionType::parse(field("Type")).ok_or(CsvRowStatus::InvalidType)?;
    let parent_id = if linked { non_empty(columns.get(record, "ParentId")) } else { None };
    let description = field("Description").to_string();
    if parent_id.is_none() && description.is_empty() {
        return Err(CsvRowStatus::MissingDescription);
    }
    let account = match field("Account") {
        "" => accounts::UNKNOWN_ACCOUNT.to_string(),
        name => name.to_string(),
    };

    Ok(ImportRow {
        csv_id: if linked { non_empty(columns.get(record, "Id")) } else { None },
        parent_id,
        date,
        description,
        amount,
        transaction_type,
        category: field("Category").to_string(),
        account,
        notes: non_empty(columns.get(record, "Notes")),
        is_excluded: columns.get(record, "IsExcluded").is_some_and(|v| v.eq_ignore_ascii_case("true")),
        tags: field("Tags")
            .split('|')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

fn creation_status(conn: &Connection, row: &ImportRow) -> Result<CsvRowStatus> {
    let new_account = accounts::find_by_name(conn, &row.account)?.is_none();
    let needs_category = !row.category.is_empty() && !row.is_split_parent();
    let new_category = needs_category && categories::find_by_name(conn, &row.category)?.is_none();
    Ok(match (new_account, new_category) {
        (true, true) => CsvRowStatus::NeedsBothCreation,
        (true, false) => CsvRowStatus::NeedsAccountCreation(row.account.clone()),
        (false, true) => CsvRowStatus::NeedsCategoryCreation(row.category.clone()),
        (false, false) => CsvRowStatus::Valid,
    })
}

/// Reads a transaction CSV and reports, row by row, what an import would do.
/// Nothing is written.
pub fn validate_csv(conn: &Connection, file_path: &Path) -> Result<CsvValidationReport> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut records = rdr.records();

    let header: Vec<String> = match records.next() {
        Some(result) => result?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect(),
        None => return Err(FinlightError::Validation("CSV file is empty.".into())),
    };
    let columns = Columns::from_header(&header)?;
    let is_finlight_export = header.iter().any(|h| h == "Id") && header.iter().any(|h| h == "ParentId");

    let mut rows = Vec::new();
    for (i, result) in records.enumerate() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let raw = record.iter().map(str::to_string).collect();
        let (status, row) = match parse_record(&columns, &record, is_finlight_export) {
            Ok(row) => (creation_status(conn, &row)?, Some(row)),
            Err(status) => (status, None),
        };
        rows.push(CsvReviewRow {
            line: i + 2,
            status,
            raw,
            row,
        });
    }

    // split parts need an importable split parent
    let parents: HashSet<String> = rows
        .iter()
        .filter(|r| r.status.is_importable())
        .filter_map(|r| r.row.as_ref())
        .filter(|row| row.is_split_parent())
        .filter_map(|row| row.csv_id.clone())
        .collect();
    for review in rows.iter_mut().filter(|r| r.status.is_importable()) {
        let orphan = review
            .row
            .as_ref()
            .and_then(|row| row.parent_id.as_ref())
            .is_some_and(|parent| !parents.contains(parent));
        if orphan {
            review.status = CsvRowStatus::OrphanSplit;
        }
    }

    Ok(CsvValidationReport {
        header,
        rows,
        is_finlight_export,
    })
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvImportResult {
    pub transactions: usize,
    pub splits: usize,
    pub skipped: usize,
    pub accounts_created: usize,
    pub categories_created: usize,
}

fn category_id(conn: &Connection, name: &str, created: &mut usize) -> Result<Option<i64>> {
    if name.is_empty() {
        return Ok(None);
    }
    if let Some(existing) = categories::find_by_name(conn, name)? {
        return Ok(Some(existing.id));
    }
    *created += 1;
    tracing::info!(name, "creating category");
    Ok(Some(categories::create(
        conn,
        name,
        &crate::models::default_icon_key(),
        &crate::models::default_color_key(),
    )?))
}

fn account_id(conn: &Connection, name: &str, created: &mut usize) -> Result<i64> {
    if let Some(existing) = accounts::find_by_name(conn, name)? {
        return Ok(existing.id);
    }
    *created += 1;
    accounts::find_or_create(conn, name, IMPORTED_ACCOUNT_TYPE)
}

/// Appends the importable rows of a validated file in one database
/// transaction, creating missing accounts, categories and tags on the way.
pub fn commit(conn: &Connection, report: &CsvValidationReport) -> Result<CsvImportResult> {
    let mut result = CsvImportResult {
        skipped: report.skipped(),
        ..Default::default()
    };
    let usable = || {
        report
            .rows
            .iter()
            .filter(|r| r.status.is_importable())
            .filter_map(|r| r.row.as_ref())
    };

    let tx = conn.unchecked_transaction()?;
    let mut new_ids: HashMap<&str, i64> = HashMap::new();

    for row in usable().filter(|row| row.parent_id.is_none()) {
        let is_split = row.is_split_parent();
        let account = account_id(&tx, &row.account, &mut result.accounts_created)?;
        let mut txn = NewTransaction::manual(&row.description, row.amount, row.transaction_type, account, &row.date);
        txn.source = TransactionSource::Imported;
        txn.notes = row.notes.clone();
        if !is_split {
            txn.category_id = category_id(&tx, &row.category, &mut result.categories_created)?;
        }
        let id = transactions::add(&tx, &txn)?;
        tx.execute(
            "UPDATE transactions SET is_excluded = ?1, is_split = ?2 WHERE id = ?3",
            rusqlite::params![row.is_excluded, is_split, id],
        )?;
        for tag in &row.tags {
            tags::attach(&tx, id, tag)?;
        }
        if let Some(csv_id) = row.csv_id.as_deref() {
            new_ids.insert(csv_id, id);
        }
        result.transactions += 1;
    }

    let parts = usable().filter(|_| report.is_finlight_export);
    for row in parts {
        let Some(parent) = row.parent_id.as_deref() else { continue };
        let Some(&parent_id) = new_ids.get(parent) else {
            tracing::warn!(parent, "split part has no imported parent");
            result.skipped += 1;
            continue;
        };
        let split = NewSplit {
            amount: row.amount,
            category_id: category_id(&tx, &row.category, &mut result.categories_created)?,
            notes: row.notes.clone(),
        };
        splits::insert(&tx, parent_id, &split)?;
        result.splits += 1;
    }

    tx.commit()?;
    tracing::info!(
        transactions = result.transactions,
        splits = result.splits,
        skipped = result.skipped,
        "imported csv"
    );
    Ok(result)
}
