//! Domain error types
//!
//! This module defines the error hierarchy for the ingest pipeline.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main ingest error type
///
/// This is the primary error type used throughout the application. Each
/// variant names the pipeline stage or collaborator that failed so the CLI
/// and the run journal can report it without inspecting library types.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// HTTP transport errors (feed, archives, map server)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Feed document errors
    #[error("Feed error: {0}")]
    Feed(String),

    /// Archive extraction errors
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Bulk loader failures
    #[error("Bulk load error: {0}")]
    Loader(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(String),

    /// Network/connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// Map publication errors
    #[error("Publication error: {0}")]
    Publication(String),

    /// Run journal bookkeeping errors
    #[error("Journal error: {0}")]
    Journal(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// The run was stopped by a shutdown signal
    #[error("Interrupted: {0}")]
    Interrupted(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl IngestError {
    /// Whether the error came from the network or a remote service
    ///
    /// Used by the CLI to choose between the connection and fatal exit codes.
    pub fn is_connection(&self) -> bool {
        matches!(self, IngestError::Connection(_) | IngestError::Http(_))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for IngestError {
    fn from(err: toml::de::Error) -> Self {
        IngestError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from zip archive errors
impl From<zip::result::ZipError> for IngestError {
    fn from(err: zip::result::ZipError) -> Self {
        IngestError::Extraction(err.to_string())
    }
}

// Conversion from reqwest errors
impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            IngestError::Connection(err.to_string())
        } else {
            IngestError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_error_display() {
        let err = IngestError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_loader_error_display() {
        let err = IngestError::Loader("ogr2ogr exited with status 1".to_string());
        assert_eq!(err.to_string(), "Bulk load error: ogr2ogr exited with status 1");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: IngestError = io_err.into();
        assert!(matches!(err, IngestError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: IngestError = json_err.into();
        assert!(matches!(err, IngestError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: IngestError = toml_err.into();
        assert!(matches!(err, IngestError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_zip_error_conversion() {
        let err: IngestError = zip::result::ZipError::FileNotFound.into();
        assert!(matches!(err, IngestError::Extraction(_)));
    }

    #[test]
    fn test_is_connection() {
        assert!(IngestError::Connection("refused".to_string()).is_connection());
        assert!(IngestError::Http("502".to_string()).is_connection());
        assert!(!IngestError::Database("syntax".to_string()).is_connection());
    }

    #[test]
    fn test_ingest_error_implements_std_error() {
        let err = IngestError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
