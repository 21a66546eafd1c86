use review_core::domain::ExportRecord;
use review_core::ports::ExportSource;
use review_core::{Result, ReviewError};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

pub const FOLLOWING_KEY: &str = "relationships_following";

/// JSON implementation of the ExportSource trait
pub struct JsonExportSource {
    path: PathBuf,
    key: String,
}

impl JsonExportSource {
    /// Creates a source reading the `relationships_following` list from `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            key: FOLLOWING_KEY.to_string(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    fn parse(&self, raw: &str) -> Result<Vec<ExportRecord>> {
        let mut document: Value = serde_json::from_str(raw)?;
        let list = document
            .get_mut(&self.key)
            .map(Value::take)
            .ok_or_else(|| ReviewError::MissingKey(self.key.clone()))?;

        let records: Vec<ExportRecord> = serde_json::from_value(list)?;
        Ok(records)
    }
}

impl ExportSource for JsonExportSource {
    fn load_records(&self) -> Result<Vec<ExportRecord>> {
        let raw = fs::read_to_string(&self.path).map_err(|e| {
            ReviewError::NotFound(format!("{}: {e}", self.path.display()))
        })?;
        let records = self.parse(&raw)?;
        log::debug!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }
}
