use std::path::PathBuf;

use super::open_db;
use crate::backup::backup_database;
use crate::error::Result;
use crate::settings::get_data_dir;

pub fn run(output: Option<String>) -> Result<()> {
    let conn = open_db()?;
    let dest = match output {
        Some(p) => PathBuf::from(p),
        None => {
            let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
            get_data_dir().join("backups").join(format!("finlight-{stamp}.db"))
        }
    };
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let size = backup_database(&conn, &dest)?;
    println!("Backup saved to {} ({size} bytes)", dest.display());
    Ok(())
}
