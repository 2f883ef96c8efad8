use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

/// Where a stored transaction came from. Stored as its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionSource {
    #[serde(rename = "Manual Entry")]
    Manual,
    #[serde(rename = "Auto-Imported")]
    AutoImported,
    #[serde(rename = "Needs Review")]
    NeedsReview,
    #[serde(rename = "Reviewed Import")]
    ReviewedImport,
    #[serde(rename = "Imported")]
    Imported,
}

impl TransactionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "Manual Entry",
            Self::AutoImported => "Auto-Imported",
            Self::NeedsReview => "Needs Review",
            Self::ReviewedImport => "Reviewed Import",
            Self::Imported => "Imported",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        [
            Self::Manual,
            Self::AutoImported,
            Self::NeedsReview,
            Self::ReviewedImport,
            Self::Imported,
        ]
        .into_iter()
        .find(|s| s.as_str() == raw)
    }
}

macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let raw = value.as_str()?;
                <$ty>::parse(raw).ok_or_else(|| FromSqlError::Other(format!("unexpected value '{raw}'").into()))
            }
        }
    };
}

sql_text_enum!(TransactionType);
sql_text_enum!(TransactionSource);
sql_text_enum!(IgnoreRuleType);
sql_text_enum!(RecurrenceInterval);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub account_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default = "default_icon_key")]
    pub icon_key: String,
    #[serde(default = "default_color_key")]
    pub color_key: String,
}

pub fn default_icon_key() -> String {
    "category".to_string()
}

pub fn default_color_key() -> String {
    "gray".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub description: String,
    pub category_id: Option<i64>,
    pub amount: f64,
    pub date: String,
    pub account_id: i64,
    #[serde(default)]
    pub notes: Option<String>,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub source_sms_id: Option<i64>,
    #[serde(default)]
    pub source_sms_hash: Option<String>,
    #[serde(default = "default_source")]
    pub source: TransactionSource,
    #[serde(default)]
    pub original_description: Option<String>,
    #[serde(default)]
    pub is_excluded: bool,
    #[serde(default)]
    pub currency_code: Option<String>,
    /// Set when the amount is divided across [`SplitTransaction`] rows.
    #[serde(default)]
    pub is_split: bool,
}

fn default_source() -> TransactionSource {
    TransactionSource::Manual
}

pub const TRANSACTION_COLUMNS: &str = "id, description, category_id, amount, date, account_id, notes, \
     transaction_type, source_sms_id, source_sms_hash, source, original_description, is_excluded, currency_code, is_split";

impl Transaction {
    /// Maps a row selected with [`TRANSACTION_COLUMNS`].
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            description: row.get(1)?,
            category_id: row.get(2)?,
            amount: row.get(3)?,
            date: row.get(4)?,
            account_id: row.get(5)?,
            notes: row.get(6)?,
            transaction_type: row.get(7)?,
            source_sms_id: row.get(8)?,
            source_sms_hash: row.get(9)?,
            source: row.get(10)?,
            original_description: row.get(11)?,
            is_excluded: row.get(12)?,
            currency_code: row.get(13)?,
            is_split: row.get(14)?,
        })
    }

    /// Signed contribution to an account balance.
    pub fn signed_amount(&self) -> f64 {
        match self.transaction_type {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

/// One share of a split parent transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitTransaction {
    pub id: i64,
    pub parent_transaction_id: i64,
    pub amount: f64,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub name: String,
    pub target_amount: f64,
    pub saved_amount: f64,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub target_date: Option<String>,
    pub account_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurrenceInterval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Yearly => "Yearly",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }
}

/// A repeating income or expense the user confirms each time it falls due.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub id: i64,
    pub description: String,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub recurrence_interval: RecurrenceInterval,
    /// `YYYY-MM-DD`
    pub start_date: String,
    pub account_id: i64,
    #[serde(default)]
    pub category_id: Option<i64>,
    /// `YYYY-MM-DD` of the last confirmed run.
    #[serde(default)]
    pub last_run_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub category_name: String,
    pub amount: f64,
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantMapping {
    pub sms_sender: String,
    pub merchant_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionTag {
    pub transaction_id: i64,
    pub tag_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreRuleType {
    Sender,
    BodyPhrase,
}

impl IgnoreRuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sender => "sender",
            Self::BodyPhrase => "body_phrase",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "sender" => Some(Self::Sender),
            "body_phrase" | "body" => Some(Self::BodyPhrase),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IgnoreRule {
    pub id: i64,
    pub rule_type: IgnoreRuleType,
    pub pattern: String,
    pub is_enabled: bool,
    pub is_default: bool,
}

/// User-defined extraction rule, applied when its trigger phrase occurs in a body.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomSmsRule {
    pub id: i64,
    pub trigger_phrase: String,
    pub merchant_regex: Option<String>,
    pub amount_regex: Option<String>,
    pub account_regex: Option<String>,
    pub priority: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SmsMessage {
    pub id: i64,
    pub sender: String,
    pub body: String,
    /// Epoch milliseconds.
    pub date: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotentialAccount {
    pub formatted_name: String,
    pub account_type: String,
}

/// Parser-derived candidate, not yet stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialTransaction {
    pub source_sms_id: i64,
    pub sms_sender: String,
    pub sms_date: i64,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub merchant_name: Option<String>,
    pub original_message: String,
    pub potential_account: Option<PotentialAccount>,
    pub source_sms_hash: String,
    pub detected_currency_code: Option<String>,
}
