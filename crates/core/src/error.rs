use thiserror::Error;

/// Fatal setup errors. Per-row problems never surface here.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed export: {0}")]
    Json(String),
    #[error("Missing top-level key '{0}' in export")]
    MissingKey(String),
    #[error("Table error: {0}")]
    Table(String),
    #[error("Archive error: {0}")]
    Archive(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for ReviewError {
    fn from(error: serde_json::Error) -> Self {
        ReviewError::Json(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_message_names_key() {
        let err = ReviewError::MissingKey("relationships_following".to_string());
        assert_eq!(
            err.to_string(),
            "Missing top-level key 'relationships_following' in export"
        );
    }

    #[test]
    fn test_json_error_converts() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ReviewError = parse_err.into();
        assert!(matches!(err, ReviewError::Json(_)));
    }
}
