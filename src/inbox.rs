use std::path::Path;

use serde::Deserialize;

use crate::error::{FinlightError, Result};
use crate::models::SmsMessage;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InboxFormat {
    Json,
    Csv,
}

impl InboxFormat {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Guess from the file extension, then from the first non-blank byte.
    pub fn detect(file_path: &Path) -> Option<Self> {
        if let Some(ext) = file_path.extension().and_then(|e| e.to_str()) {
            if let Some(format) = Self::from_key(ext) {
                return Some(format);
            }
        }
        let content = std::fs::read_to_string(file_path).ok()?;
        match content.trim_start().chars().next()? {
            '[' => Some(Self::Json),
            _ if content.lines().next()?.to_lowercase().starts_with("id,") => Some(Self::Csv),
            _ => None,
        }
    }
}

// CSV rows may carry the date as epoch millis or as a local timestamp.
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: i64,
    sender: String,
    body: String,
    date: String,
}

fn date_to_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(millis) = raw.parse::<i64>() {
        return Some(millis);
    }
    let normalized = crate::fmt::normalize_date(raw)?;
    let naive = chrono::NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S").ok()?;
    naive
        .and_local_timezone(chrono::Local)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

pub fn read_json(file_path: &Path) -> Result<Vec<SmsMessage>> {
    let content = std::fs::read_to_string(file_path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn read_csv(file_path: &Path) -> Result<Vec<SmsMessage>> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(std::io::BufReader::new(file));
    let mut messages = Vec::new();
    for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        let date = date_to_millis(&row.date).ok_or_else(|| {
            FinlightError::Validation(format!("row {}: unrecognized date '{}'", line + 2, row.date))
        })?;
        messages.push(SmsMessage {
            id: row.id,
            sender: row.sender,
            body: row.body,
            date,
        });
    }
    Ok(messages)
}

pub fn read_messages(file_path: &Path, format_key: Option<&str>) -> Result<Vec<SmsMessage>> {
    let format = match format_key {
        Some(key) => InboxFormat::from_key(key).ok_or_else(|| FinlightError::UnknownFormat(key.to_string()))?,
        None => InboxFormat::detect(file_path)
            .ok_or_else(|| FinlightError::UnknownFormat(file_path.display().to_string()))?,
    };
    tracing::debug!(path = %file_path.display(), format = format.key(), "reading sms file");
    match format {
        InboxFormat::Json => read_json(file_path),
        InboxFormat::Csv => read_csv(file_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "inbox.json",
            r#"[{"id": 1, "sender": "AM-HDFCBK", "body": "Spent Rs 10 at Cafe.", "date": 1750000000000}]"#,
        );
        let messages = read_messages(&path, None).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, "AM-HDFCBK");
        assert_eq!(messages[0].date, 1_750_000_000_000);
    }

    #[test]
    fn test_read_csv_with_both_date_forms() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "inbox.csv",
            "id,sender,body,date\n\
             1,AM-HDFCBK,\"Spent Rs 10 at Cafe, Indiranagar.\",1750000000000\n\
             2,VM-ICIBNK,Rs 5 debited,2025-06-15 10:30:00\n",
        );
        let messages = read_messages(&path, None).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].body, "Spent Rs 10 at Cafe, Indiranagar.");
        assert_eq!(messages[0].date, 1_750_000_000_000);
        assert!(messages[1].date > 0);
    }

    #[test]
    fn test_bad_csv_date_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "inbox.csv", "id,sender,body,date\n1,X,Rs 5 debited,yesterday\n");
        assert!(matches!(read_messages(&path, None), Err(FinlightError::Validation(_))));
    }

    #[test]
    fn test_detect_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = write(&dir, "dump", "  [ ]");
        assert_eq!(InboxFormat::detect(&json), Some(InboxFormat::Json));
        let csv = write(&dir, "export", "id,sender,body,date\n");
        assert_eq!(InboxFormat::detect(&csv), Some(InboxFormat::Csv));
        let other = write(&dir, "notes", "hello");
        assert_eq!(InboxFormat::detect(&other), None);
    }

    #[test]
    fn test_unknown_format_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "inbox.json", "[]");
        assert!(matches!(read_messages(&path, Some("xml")), Err(FinlightError::UnknownFormat(_))));
    }
}
