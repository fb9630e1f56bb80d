//! Error types for Collexions
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Collexions
#[derive(Debug, Error)]
pub enum CollexionsError {
    /// Configuration could not be used
    #[error("Config error: {0}")]
    Config(String),

    /// Pin history could not be read or written
    #[error("History error: {0}")]
    History(String),

    /// Catalog collaborator failed to supply collections
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Pinning collaborator failed to promote a collection
    #[error("Pin error: {0}")]
    Pin(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for Collexions operations
pub type Result<T> = std::result::Result<T, CollexionsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CollexionsError::Config("bad start_date".to_string());
        assert_eq!(err.to_string(), "Config error: bad start_date");
    }

    #[test]
    fn test_history_error() {
        let err = CollexionsError::History("not a mapping".to_string());
        assert_eq!(err.to_string(), "History error: not a mapping");
    }

    #[test]
    fn test_catalog_error() {
        let err = CollexionsError::Catalog("library not found: Anime".to_string());
        assert_eq!(err.to_string(), "Catalog error: library not found: Anime");
    }

    #[test]
    fn test_pin_error() {
        let err = CollexionsError::Pin("hub unavailable".to_string());
        assert_eq!(err.to_string(), "Pin error: hub unavailable");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CollexionsError = io_err.into();
        assert!(matches!(err, CollexionsError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: CollexionsError = json_err.into();
        assert!(matches!(err, CollexionsError::Json(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(CollexionsError::Pin("test".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
