use crate::db::{db_path, get_connection};
use crate::error::Result;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let path = db_path(&data_dir);

    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", path.display());
    println!("Currency:   {}", settings.home_currency);

    if !path.exists() {
        println!();
        println!("Database not found. Run `finlight init` to set up.");
        return Ok(());
    }

    println!("DB size:    {} bytes", std::fs::metadata(&path)?.len());
    let conn = get_connection(&path)?;
    let count = |sql: &str| -> Result<i64> { Ok(conn.query_row(sql, [], |r| r.get(0))?) };

    println!();
    println!("Accounts:      {}", count("SELECT count(*) FROM accounts")?);
    println!("Transactions:  {}", count("SELECT count(*) FROM transactions")?);
    println!("From SMS:      {}", count("SELECT count(*) FROM transactions WHERE source_sms_hash IS NOT NULL")?);
    println!("Needs review:  {}", crate::reviewer::pending_count(&conn)?);
    println!("Categories:    {}", count("SELECT count(*) FROM categories")?);
    println!("Mappings:      {}", count("SELECT count(*) FROM merchant_mappings")?);
    Ok(())
}
