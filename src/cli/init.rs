use colored::Colorize;

use crate::db::{db_path, get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        let expanded = shellexpand_path(&dir);
        std::fs::create_dir_all(&expanded)?;
        // canonicalize once the directory exists
        settings.data_dir = shellexpand_path(&expanded);
    }
    let data_path = std::path::PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(data_path.join("backups"))?;
    save_settings(&settings)?;

    let path = db_path(&data_path);
    let conn = get_connection(&path)?;
    init_db(&conn)?;
    tracing::info!(path = %path.display(), "database ready");

    println!("{}", format!("Initialized finlight at {}", data_path.display()).green());
    Ok(())
}
