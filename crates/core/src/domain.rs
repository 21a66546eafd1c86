use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

/// One followed account as it appears in the raw export.
///
/// Every field degrades to its empty value instead of failing, so a single
/// odd entry never aborts the whole export.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExportRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_references")]
    pub string_list_data: Vec<ExportReference>,
}

/// Nested reference entry: profile link plus the follow instant.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExportReference {
    #[serde(default, deserialize_with = "lenient_string")]
    pub href: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<i64>,
}

impl ExportRecord {
    /// First nested reference, or an empty placeholder.
    pub fn primary_reference(&self) -> ExportReference {
        self.string_list_data.first().cloned().unwrap_or_default()
    }

    /// Display name, falling back to the reference value used by older exports.
    pub fn username(&self) -> String {
        if !self.title.is_empty() {
            return self.title.clone();
        }
        self.primary_reference().value
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        v.as_i64().or_else(|| {
            v.as_f64()
                .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        })
    }))
}

fn lenient_references<'de, D>(deserializer: D) -> Result<Vec<ExportReference>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let items = match value {
        Some(Value::Array(items)) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}

/// Tabular, id-assigned view of an export record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub id: u64,
    pub username: String,
    pub url: String,
    pub timestamp: String, // already formatted, or empty
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewStatus {
    #[default]
    Keep,
    Delete,
}

impl ReviewStatus {
    pub fn toggled(self) -> Self {
        match self {
            ReviewStatus::Keep => ReviewStatus::Delete,
            ReviewStatus::Delete => ReviewStatus::Keep,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Keep => "keep",
            ReviewStatus::Delete => "delete",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flat row with the operator's final decision attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewedRow {
    pub row: FlatRow,
    pub status: ReviewStatus,
}
