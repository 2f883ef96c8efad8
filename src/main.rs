mod accounts;
mod backup;
mod budgets;
mod categories;
mod cli;
mod csv_import;
mod db;
mod dedup;
mod error;
mod fmt;
mod goals;
mod inbox;
mod ingest;
mod models;
mod recurring;
mod reports;
mod reviewer;
mod rules;
mod settings;
mod sms_parser;
mod splits;
mod tags;
mod transactions;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{
    AccountsCommands, BudgetsCommands, CategoriesCommands, Cli, Commands, ConfigCommands, CustomCommands,
    ExportCommands, GoalsCommands, IgnoreCommands, ImportCommands, MappingsCommands, RecurringCommands,
    RenameCommands, ReportCommands, ReviewCommands, RulesCommands, SmsCommands, TagsCommands, TransactionsCommands,
};

fn init_tracing() {
    let level = settings::load_settings().log_level;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("finlight={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cli::config::show(),
            ConfigCommands::Set { key, value } => cli::config::set(&key, &value),
        },
        Commands::Accounts { command } => match command {
            AccountsCommands::Add { name, account_type } => cli::accounts::add(&name, &account_type),
            AccountsCommands::List => cli::accounts::list(),
            AccountsCommands::Balance { name } => cli::accounts::balance(&name),
            AccountsCommands::Rename {
                name,
                new_name,
                account_type,
            } => cli::accounts::rename(&name, &new_name, account_type.as_deref()),
            AccountsCommands::Delete { name, yes } => cli::accounts::delete(&name, yes),
        },
        Commands::Categories { command } => match command {
            CategoriesCommands::Add { name, icon, color } => cli::categories::add(&name, &icon, &color),
            CategoriesCommands::List => cli::categories::list(),
            CategoriesCommands::Update {
                name,
                rename,
                icon,
                color,
            } => cli::categories::update(&name, rename.as_deref(), icon.as_deref(), color.as_deref()),
            CategoriesCommands::Delete { name } => cli::categories::delete(&name),
        },
        Commands::Transactions { command } => match command {
            TransactionsCommands::Add {
                description,
                amount,
                account,
                transaction_type,
                category,
                date,
                notes,
                tags,
            } => cli::transactions::add(
                &description,
                amount,
                &account,
                &transaction_type,
                category.as_deref(),
                date.as_deref(),
                notes.as_deref(),
                &tags,
            ),
            TransactionsCommands::List {
                month,
                account,
                category,
                limit,
            } => cli::transactions::list(month.as_deref(), account.as_deref(), category.as_deref(), limit),
            TransactionsCommands::Show { id } => cli::transactions::show(id),
            TransactionsCommands::Edit {
                id,
                description,
                amount,
                notes,
                category,
                account,
                date,
                transaction_type,
            } => cli::transactions::edit(
                id,
                description,
                amount,
                notes,
                category.as_deref(),
                account.as_deref(),
                date.as_deref(),
                transaction_type.as_deref(),
            ),
            TransactionsCommands::Exclude { id } => cli::transactions::set_excluded(id, true),
            TransactionsCommands::Include { id } => cli::transactions::set_excluded(id, false),
            TransactionsCommands::Delete { id } => cli::transactions::delete(id),
            TransactionsCommands::Split { id, parts } => cli::transactions::split(id, &parts),
            TransactionsCommands::Unsplit { id } => cli::transactions::unsplit(id),
            TransactionsCommands::Tag { id, tag } => cli::transactions::tag(id, &tag),
            TransactionsCommands::Untag { id, tag } => cli::transactions::untag(id, &tag),
        },
        Commands::Tags { command } => match command {
            TagsCommands::Add { name } => cli::tags::add(&name),
            TagsCommands::List => cli::tags::list(),
            TagsCommands::Delete { name } => cli::tags::delete(&name),
        },
        Commands::Budgets { command } => match command {
            BudgetsCommands::Set {
                category,
                amount,
                month,
            } => cli::budgets::set(&category, amount, month.as_deref()),
            BudgetsCommands::List { month } => cli::budgets::list(month.as_deref()),
            BudgetsCommands::Delete { category, month } => cli::budgets::delete(&category, month.as_deref()),
        },
        Commands::Sms { command } => match command {
            SmsCommands::Ingest {
                file,
                format,
                sender,
                body,
            } => cli::sms::ingest(file.as_deref(), format.as_deref(), sender.as_deref(), body.as_deref()),
            SmsCommands::Scan { file, format, since } => {
                cli::sms::scan(&file, format.as_deref(), since.as_deref())
            }
            SmsCommands::Approve {
                file,
                id,
                format,
                description,
                category,
                notes,
                tags,
                account,
                learn,
            } => cli::sms::approve(cli::sms::ApproveArgs {
                file: &file,
                id,
                format: format.as_deref(),
                description: description.as_deref(),
                category: category.as_deref(),
                notes: notes.as_deref(),
                tags: &tags,
                account: account.as_deref(),
                learn,
            }),
            SmsCommands::Parse { sender, body } => cli::sms::parse(&sender, &body),
        },
        Commands::Review { command } => match command {
            None => cli::review::run(),
            Some(ReviewCommands::List) => cli::review::list(),
            Some(ReviewCommands::Apply {
                id,
                category,
                description,
                learn,
            }) => cli::review::apply(id, &category, description.as_deref(), learn),
        },
        Commands::Rules { command } => match command {
            RulesCommands::Ignore { command } => match command {
                IgnoreCommands::List => cli::rules::ignore_list(),
                IgnoreCommands::Add { pattern, sender } => cli::rules::ignore_add(&pattern, sender),
                IgnoreCommands::Enable { id } => cli::rules::ignore_enable(id, true),
                IgnoreCommands::Disable { id } => cli::rules::ignore_enable(id, false),
                IgnoreCommands::Delete { id } => cli::rules::ignore_delete(id),
            },
            RulesCommands::Custom { command } => match command {
                CustomCommands::List => cli::rules::custom_list(),
                CustomCommands::Add {
                    trigger,
                    merchant,
                    amount,
                    account,
                    priority,
                } => cli::rules::custom_add(
                    &trigger,
                    merchant.as_deref(),
                    amount.as_deref(),
                    account.as_deref(),
                    priority,
                ),
                CustomCommands::Delete { id } => cli::rules::custom_delete(id),
            },
            RulesCommands::Rename { command } => match command {
                RenameCommands::List => cli::rules::rename_list(),
                RenameCommands::Set { from, to } => cli::rules::rename_set(&from, &to),
                RenameCommands::Delete { from } => cli::rules::rename_delete(&from),
            },
        },
        Commands::Mappings { command } => match command {
            MappingsCommands::Merchants => cli::mappings::merchants(),
            MappingsCommands::SetMerchant { sender, merchant } => cli::mappings::set_merchant(&sender, &merchant),
            MappingsCommands::DeleteMerchant { sender } => cli::mappings::delete_merchant(&sender),
            MappingsCommands::Categories => cli::mappings::categories(),
            MappingsCommands::SetCategory { merchant, category } => {
                cli::mappings::set_category(&merchant, &category)
            }
            MappingsCommands::DeleteCategory { merchant } => cli::mappings::delete_category(&merchant),
        },
        Commands::Report { command } => match command {
            ReportCommands::Summary {
                month,
                year,
                from_date,
                to_date,
            } => cli::report::summary(month.as_deref(), year, from_date.as_deref(), to_date.as_deref()),
            ReportCommands::Categories { month } => cli::report::categories(month.as_deref()),
            ReportCommands::Merchants { month } => cli::report::merchants(month.as_deref()),
            ReportCommands::Trend { since } => cli::report::trend(since.as_deref()),
        },
        Commands::Export { command } => match command {
            ExportCommands::Json { output } => cli::export::json(output),
            ExportCommands::Csv { output } => cli::export::csv(output),
        },
        Commands::Goals { command } => match command {
            GoalsCommands::Add {
                name,
                target,
                account,
                by,
            } => cli::goals::add(&name, target, &account, by.as_deref()),
            GoalsCommands::List => cli::goals::list(),
            GoalsCommands::Contribute { id, amount } => cli::goals::contribute(id, amount),
            GoalsCommands::Delete { id } => cli::goals::delete(id),
        },
        Commands::Recurring { command } => match command {
            RecurringCommands::Add {
                description,
                amount,
                account,
                every,
                transaction_type,
                category,
                start,
            } => cli::recurring::add(cli::recurring::AddArgs {
                description: &description,
                amount,
                account: &account,
                every: &every,
                transaction_type: &transaction_type,
                category: category.as_deref(),
                start: start.as_deref(),
            }),
            RecurringCommands::List => cli::recurring::list(),
            RecurringCommands::Due => cli::recurring::due(),
            RecurringCommands::Confirm { id } => cli::recurring::confirm(id),
            RecurringCommands::Delete { id } => cli::recurring::delete(id),
        },
        Commands::Import { command } => match command {
            ImportCommands::Json { file, yes } => cli::import::json(&file, yes),
            ImportCommands::Csv { file, dry_run, yes } => cli::import::csv(&file, dry_run, yes),
        },
        Commands::Backup { output } => cli::backup::run(output),
        Commands::Status => cli::status::run(),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "finlight", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
