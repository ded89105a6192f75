//! Error types for SchemaShift

use std::path::PathBuf;

use thiserror::Error;

use crate::models::validator::ValidationReport;

/// Result type for SchemaShift operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for SchemaShift
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schema validation failed:\n{0}")]
    Validation(ValidationReport),

    #[error(
        "Enum '{name}' is declared with conflicting values: [{}] vs [{}]",
        .existing.join(", "),
        .conflicting.join(", ")
    )]
    EnumConflict {
        name: String,
        existing: Vec<String>,
        conflicting: Vec<String>,
    },

    #[error("Internal invariant violated: {0}")]
    Invariant(String),

    #[error("Snapshot error at '{path}': {message}")]
    Snapshot { path: PathBuf, message: String },

    #[error("Model registration error: {0}")]
    ModelRegistration(String),

    #[error("Type mapping error: {0}")]
    TypeMapping(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether this error carries a batched list of schema-authoring problems
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Create a snapshot error for the given path
    pub fn snapshot(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Snapshot {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Convert Serde JSON errors to SchemaShift errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Serialization(error.to_string())
    }
}

/// Convert YAML errors to SchemaShift errors
impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Error::Serialization(error.to_string())
    }
}

/// Convert TOML deserialization errors to SchemaShift errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::Config(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_conflict_message() {
        let err = Error::EnumConflict {
            name: "status".to_string(),
            existing: vec!["active".to_string(), "inactive".to_string()],
            conflicting: vec!["on".to_string(), "off".to_string()],
        };

        assert!(!err.is_validation());
        assert_eq!(
            err.to_string(),
            "Enum 'status' is declared with conflicting values: [active, inactive] vs [on, off]"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
