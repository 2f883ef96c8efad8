pub mod accounts;
pub mod backup;
pub mod budgets;
pub mod categories;
pub mod config;
pub mod export;
pub mod goals;
pub mod import;
pub mod init;
pub mod mappings;
pub mod recurring;
pub mod report;
pub mod review;
pub mod rules;
pub mod sms;
pub mod status;
pub mod tags;
pub mod transactions;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::{db_path, get_connection};
use crate::error::{FinlightError, Result};
use crate::settings::{get_data_dir, load_settings};

/// Opens the configured database, refusing to create one outside `init`.
pub(crate) fn open_db() -> Result<Connection> {
    let path = db_path(&get_data_dir());
    if !path.exists() {
        return Err(FinlightError::Other(format!(
            "no database at {}. Run `finlight init` first.",
            path.display()
        )));
    }
    get_connection(&path)
}

pub(crate) fn home_currency() -> String {
    load_settings().home_currency
}

pub(crate) fn month_or_current(month: Option<&str>) -> Result<(i32, u32)> {
    use chrono::Datelike;
    match month {
        Some(raw) => crate::fmt::parse_month(raw)
            .ok_or_else(|| FinlightError::Validation(format!("'{raw}' is not a YYYY-MM month"))),
        None => {
            let today = chrono::Local::now();
            Ok((today.year(), today.month()))
        }
    }
}

#[derive(Parser)]
#[command(name = "finlight", version, about = "Personal finance tracker that turns bank SMS into transactions.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory and database.
    Init {
        /// Path for finlight data (default: ~/.local/share/finlight)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Show or change settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Manage accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Manage categories.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Add, edit and list transactions.
    #[command(alias = "tx")]
    Transactions {
        #[command(subcommand)]
        command: TransactionsCommands,
    },
    /// Manage tags.
    Tags {
        #[command(subcommand)]
        command: TagsCommands,
    },
    /// Monthly category budgets.
    Budgets {
        #[command(subcommand)]
        command: BudgetsCommands,
    },
    /// Parse bank SMS into transactions.
    Sms {
        #[command(subcommand)]
        command: SmsCommands,
    },
    /// Categorize auto-imported transactions that need review.
    Review {
        #[command(subcommand)]
        command: Option<ReviewCommands>,
    },
    /// Ignore, extraction and rename rules for the SMS parser.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Learned sender and merchant mappings.
    Mappings {
        #[command(subcommand)]
        command: MappingsCommands,
    },
    /// Generate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Export data as JSON or CSV.
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
    /// Savings goals.
    Goals {
        #[command(subcommand)]
        command: GoalsCommands,
    },
    /// Repeating transactions confirmed when due.
    Recurring {
        #[command(subcommand)]
        command: RecurringCommands,
    },
    /// Import a JSON backup or a transaction CSV.
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
    /// Back up the database file.
    Backup {
        /// Output path (default: <data_dir>/backups/finlight-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show current database and summary statistics.
    Status,
    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the current settings.
    Show,
    /// Set one setting: data_dir, home_currency, log_level, notify_unknown.
    Set { key: String, value: String },
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add a new account.
    Add {
        /// Account name, e.g. 'HDFC Bank - xx9922'
        name: String,
        /// Account type, e.g. 'Savings Account', 'Credit Card'
        #[arg(long = "type", default_value = "General")]
        account_type: String,
    },
    /// List accounts with balances.
    List,
    /// Show one account's balance.
    Balance { name: String },
    /// Rename an account or change its type.
    Rename {
        name: String,
        new_name: String,
        #[arg(long = "type")]
        account_type: Option<String>,
    },
    /// Delete an account and all of its transactions.
    Delete {
        name: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// Add a category.
    Add {
        name: String,
        #[arg(long, default_value = "category")]
        icon: String,
        #[arg(long, default_value = "gray")]
        color: String,
    },
    /// List categories.
    List,
    /// Rename or restyle a category.
    Update {
        name: String,
        #[arg(long)]
        rename: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a category; its transactions become uncategorized.
    Delete { name: String },
}

#[derive(Subcommand)]
pub enum TransactionsCommands {
    /// Record a transaction by hand.
    Add {
        description: String,
        amount: f64,
        #[arg(long)]
        account: String,
        /// income or expense
        #[arg(long = "type", default_value = "expense")]
        transaction_type: String,
        #[arg(long)]
        category: Option<String>,
        /// YYYY-MM-DD or YYYY-MM-DD HH:MM:SS (default: now)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Tag to attach; repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List transactions, newest first.
    List {
        /// Month filter: YYYY-MM
        #[arg(long)]
        month: Option<String>,
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Show one transaction with its tags.
    Show { id: i64 },
    /// Edit fields of a transaction.
    Edit {
        id: i64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
        /// New notes; an empty string clears them
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long = "type")]
        transaction_type: Option<String>,
    },
    /// Leave a transaction out of balances and reports.
    Exclude { id: i64 },
    /// Count a previously excluded transaction again.
    Include { id: i64 },
    /// Delete a transaction.
    Delete { id: i64 },
    /// Divide a transaction across categories.
    Split {
        id: i64,
        /// AMOUNT:CATEGORY or AMOUNT:CATEGORY:NOTES; repeat for each part
        #[arg(long = "part", required = true)]
        parts: Vec<String>,
    },
    /// Remove the parts of a split transaction.
    Unsplit { id: i64 },
    /// Attach a tag.
    Tag { id: i64, tag: String },
    /// Detach a tag.
    Untag { id: i64, tag: String },
}

#[derive(Subcommand)]
pub enum TagsCommands {
    Add { name: String },
    List,
    Delete { name: String },
}

#[derive(Subcommand)]
pub enum BudgetsCommands {
    /// Set the budget for a category in a month.
    Set {
        category: String,
        amount: f64,
        /// YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
    },
    /// Budgets and spending for a month.
    List {
        #[arg(long)]
        month: Option<String>,
    },
    Delete {
        category: String,
        #[arg(long)]
        month: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SmsCommands {
    /// Parse and save messages; unknown merchants land in the review queue.
    Ingest {
        /// JSON or CSV file of messages
        file: Option<String>,
        /// Input format: json or csv (default: detect)
        #[arg(long)]
        format: Option<String>,
        /// Sender of a single message given on the command line
        #[arg(long, requires = "body", conflicts_with = "file")]
        sender: Option<String>,
        /// Body of a single message given on the command line
        #[arg(long, requires = "sender")]
        body: Option<String>,
    },
    /// Show parseable messages that are not imported yet, without saving.
    Scan {
        file: String,
        #[arg(long)]
        format: Option<String>,
        /// Only messages on or after this date: YYYY-MM-DD
        #[arg(long)]
        since: Option<String>,
    },
    /// Save one scanned message after review.
    Approve {
        file: String,
        /// SMS id from `finlight sms scan`
        #[arg(long)]
        id: i64,
        #[arg(long)]
        format: Option<String>,
        /// Description to store (default: parsed merchant)
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Store into this account instead of the parsed one
        #[arg(long)]
        account: Option<String>,
        /// Remember sender -> description and merchant -> category
        #[arg(long)]
        learn: bool,
    },
    /// Parse one message and print what would be extracted.
    Parse {
        #[arg(long)]
        sender: String,
        #[arg(long)]
        body: String,
    },
}

#[derive(Subcommand)]
pub enum ReviewCommands {
    /// List transactions that need review.
    List,
    /// Categorize one transaction.
    Apply {
        id: i64,
        #[arg(long)]
        category: String,
        #[arg(long)]
        description: Option<String>,
        /// Remember merchant -> category for future messages
        #[arg(long)]
        learn: bool,
    },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Ignore rules: matching messages are skipped.
    Ignore {
        #[command(subcommand)]
        command: IgnoreCommands,
    },
    /// Custom extraction rules keyed by a trigger phrase.
    Custom {
        #[command(subcommand)]
        command: CustomCommands,
    },
    /// Merchant rename rules.
    Rename {
        #[command(subcommand)]
        command: RenameCommands,
    },
}

#[derive(Subcommand)]
pub enum IgnoreCommands {
    List,
    Add {
        pattern: String,
        /// Match the sender instead of the body
        #[arg(long)]
        sender: bool,
    },
    Enable { id: i64 },
    Disable { id: i64 },
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum CustomCommands {
    List,
    Add {
        /// Phrase that must occur in the body (case-insensitive)
        trigger: String,
        /// Regex whose first group is the merchant
        #[arg(long)]
        merchant: Option<String>,
        /// Regex whose first group is the amount
        #[arg(long)]
        amount: Option<String>,
        /// Regex whose first group is the account name
        #[arg(long)]
        account: Option<String>,
        /// Higher priority rules are tried first
        #[arg(long, default_value = "0")]
        priority: i64,
    },
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum RenameCommands {
    List,
    Set { from: String, to: String },
    Delete { from: String },
}

#[derive(Subcommand)]
pub enum MappingsCommands {
    /// Sender -> merchant name mappings.
    Merchants,
    /// Map an SMS sender to a merchant name.
    SetMerchant { sender: String, merchant: String },
    DeleteMerchant { sender: String },
    /// Merchant -> category mappings.
    Categories,
    /// Map a parsed merchant name to a category.
    SetCategory { merchant: String, category: String },
    DeleteCategory { merchant: String },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Income, expenses and net for a period.
    Summary {
        /// Month filter: YYYY-MM
        #[arg(long)]
        month: Option<String>,
        /// Year filter: YYYY
        #[arg(long)]
        year: Option<i32>,
        /// Start date: YYYY-MM-DD
        #[arg(long = "from")]
        from_date: Option<String>,
        /// End date: YYYY-MM-DD
        #[arg(long = "to")]
        to_date: Option<String>,
    },
    /// Spending by category for a month.
    Categories {
        #[arg(long)]
        month: Option<String>,
    },
    /// Spending by merchant for a month.
    Merchants {
        #[arg(long)]
        month: Option<String>,
    },
    /// Income and expenses per month.
    Trend {
        /// Start date: YYYY-MM-DD (default: twelve months ago)
        #[arg(long)]
        since: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ExportCommands {
    /// Full JSON snapshot.
    Json {
        #[arg(long)]
        output: Option<String>,
    },
    /// Transactions as CSV.
    Csv {
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ImportCommands {
    /// Replace all data with a JSON export.
    Json {
        /// Path to a JSON export
        file: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Append transactions from a CSV, creating missing accounts and categories.
    Csv {
        /// Columns: Id,ParentId,Date,Description,Amount,Type,Category,Account,Notes,IsExcluded,Tags
        file: String,
        /// Only show the per-row validation
        #[arg(long)]
        dry_run: bool,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum GoalsCommands {
    /// Add a savings goal.
    Add {
        name: String,
        target: f64,
        /// Account the savings sit in
        #[arg(long)]
        account: String,
        /// Target date: YYYY-MM-DD
        #[arg(long)]
        by: Option<String>,
    },
    /// Goals with progress.
    List,
    /// Add to a goal's savings; a negative amount withdraws.
    #[command(allow_negative_numbers = true)]
    Contribute { id: i64, amount: f64 },
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum RecurringCommands {
    /// Add a recurring transaction.
    Add {
        description: String,
        amount: f64,
        #[arg(long)]
        account: String,
        /// daily, weekly, monthly or yearly
        #[arg(long, default_value = "monthly")]
        every: String,
        /// income or expense
        #[arg(long = "type", default_value = "expense")]
        transaction_type: String,
        #[arg(long)]
        category: Option<String>,
        /// First due date: YYYY-MM-DD (default: today)
        #[arg(long)]
        start: Option<String>,
    },
    /// All recurring transactions with their next due date.
    List,
    /// Recurring transactions due today.
    Due,
    /// Record a due recurring transaction.
    Confirm { id: i64 },
    Delete { id: i64 },
}
