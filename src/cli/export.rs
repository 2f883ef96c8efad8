use std::path::{Path, PathBuf};

use colored::Colorize;

use super::open_db;
use crate::backup;
use crate::error::Result;
use crate::settings::get_data_dir;

fn default_path(ext: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    get_data_dir().join("exports").join(format!("finlight-{stamp}.{ext}"))
}

fn target(output: Option<String>, ext: &str) -> Result<PathBuf> {
    let path = output.map(PathBuf::from).unwrap_or_else(|| default_path(ext));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(path)
}

fn report(count: usize, path: &Path) {
    println!("{}", format!("Exported {count} transactions to {}", path.display()).green());
}

pub fn json(output: Option<String>) -> Result<()> {
    let conn = open_db()?;
    let path = target(output, "json")?;
    let count = backup::export_json(&conn, &path)?;
    report(count, &path);
    Ok(())
}

pub fn csv(output: Option<String>) -> Result<()> {
    let conn = open_db()?;
    let path = target(output, "csv")?;
    let count = backup::export_csv(&conn, &path)?;
    report(count, &path);
    Ok(())
}
