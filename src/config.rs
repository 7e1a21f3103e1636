//! # Configuration
//!
//! The desk reads a small TOML file at startup (by default `secrets/config.toml`):
//!
//! ```toml
//! spreadsheet_id = "1AbC..."
//! sheet = "HojaA"
//! debounce_ms = 5000
//! poll_interval_secs = 60
//! ```
//!
//! Only `spreadsheet_id` is required (the older `SPREADSHEET_ID` key is accepted
//! too). A missing file is fatal unless the desk runs offline.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sync_framework::SyncTiming;
use tracing::info;

use crate::error::DeskError;
use crate::schema::{SheetLayout, SCHEMA_LEN};

pub const DEFAULT_CONFIG_PATH: &str = "secrets/config.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeskConfig {
    #[serde(alias = "SPREADSHEET_ID")]
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet")]
    pub sheet: String,
    #[serde(default = "default_first_data_row")]
    pub first_data_row: u32,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_min_populated_fields")]
    pub min_populated_fields: usize,
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_sheet() -> String {
    "HojaA".to_string()
}

fn default_first_data_row() -> u32 {
    2
}

fn default_debounce_ms() -> u64 {
    5000
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_min_populated_fields() -> usize {
    18
}

fn default_token_path() -> PathBuf {
    PathBuf::from("secrets/token.json")
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl DeskConfig {
    /// Loads and validates the configuration file.
    pub fn load(path: &Path) -> Result<Self, DeskError> {
        if !path.is_file() {
            return Err(DeskError::ConfigMissing(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| DeskError::ConfigInvalid(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), sheet = %config.sheet, "Configuration loaded");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, DeskError> {
        let config: Self =
            toml::from_str(text).map_err(|e| DeskError::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults for running against the built-in example orders.
    pub fn offline() -> Self {
        Self {
            spreadsheet_id: "offline".to_string(),
            sheet: default_sheet(),
            first_data_row: default_first_data_row(),
            debounce_ms: default_debounce_ms(),
            poll_interval_secs: default_poll_interval_secs(),
            min_populated_fields: default_min_populated_fields(),
            token_path: default_token_path(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    fn validate(&self) -> Result<(), DeskError> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(DeskError::ConfigInvalid(
                "spreadsheet_id must not be empty".to_string(),
            ));
        }
        if self.sheet.trim().is_empty() {
            return Err(DeskError::ConfigInvalid("sheet must not be empty".to_string()));
        }
        if self.first_data_row == 0 {
            return Err(DeskError::ConfigInvalid(
                "first_data_row starts at 1".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(DeskError::ConfigInvalid(
                "poll_interval_secs must be positive".to_string(),
            ));
        }
        if self.min_populated_fields > SCHEMA_LEN {
            return Err(DeskError::ConfigInvalid(format!(
                "min_populated_fields cannot exceed {}",
                SCHEMA_LEN
            )));
        }
        Ok(())
    }

    pub fn layout(&self) -> SheetLayout {
        SheetLayout {
            sheet: self.sheet.clone(),
            first_data_row: self.first_data_row,
            min_populated_fields: self.min_populated_fields,
        }
    }

    pub fn timing(&self) -> SyncTiming {
        SyncTiming {
            debounce: Duration::from_millis(self.debounce_ms),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
