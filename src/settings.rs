use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{FinlightError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_home_currency")]
    pub home_currency: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Print a notice for each ingested SMS that still needs review.
    #[serde(default = "default_notify_unknown")]
    pub notify_unknown: bool,
}

fn default_home_currency() -> String {
    "INR".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_notify_unknown() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            home_currency: default_home_currency(),
            log_level: default_log_level(),
            notify_unknown: default_notify_unknown(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("finlight")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local")
        .join("share")
        .join("finlight")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    std::fs::create_dir_all(config_dir())?;
    let json = serde_json::to_string_pretty(settings).map_err(|e| FinlightError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(&load_settings().data_dir)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

/// Updates one field by its JSON key. Unknown keys are rejected.
pub fn set_value(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => settings.data_dir = shellexpand_path(value),
        "home_currency" => {
            let code = value.trim().to_uppercase();
            if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(FinlightError::Settings(format!("'{value}' is not a three-letter currency code")));
            }
            settings.home_currency = code;
        }
        "log_level" => settings.log_level = value.trim().to_lowercase(),
        "notify_unknown" => {
            settings.notify_unknown = value
                .parse()
                .map_err(|_| FinlightError::Settings(format!("'{value}' is not true or false")))?
        }
        other => return Err(FinlightError::Settings(format!("unknown setting '{other}'"))),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.home_currency, "INR");
        assert_eq!(s.log_level, "warn");
        assert!(s.notify_unknown);
        assert!(!s.data_dir.is_empty());
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test", "home_currency": "USD"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.home_currency, "USD");
        assert_eq!(s.log_level, "warn");
        assert!(s.notify_unknown);
    }

    #[test]
    fn test_set_value() {
        let mut s = Settings::default();
        set_value(&mut s, "home_currency", "myr").unwrap();
        assert_eq!(s.home_currency, "MYR");
        set_value(&mut s, "notify_unknown", "false").unwrap();
        assert!(!s.notify_unknown);
        assert!(set_value(&mut s, "home_currency", "ringgit").is_err());
        assert!(set_value(&mut s, "notify_unknown", "maybe").is_err());
        assert!(set_value(&mut s, "colour", "blue").is_err());
    }
}
