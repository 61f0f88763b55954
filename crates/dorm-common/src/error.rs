//! Error types for the dorm ETL pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, EtlError>;

/// Main error type for the ETL pipeline
///
/// Every failure in the pipeline surfaces as one of these variants so the
/// orchestrator can report the kind of failure instead of a flat message.
/// There are no automatic retries: each variant is fatal to the step that
/// produced it.
#[derive(Error, Debug)]
pub enum EtlError {
    /// Database session could not be established
    #[error("Connection error: {0}. Check the database host and credentials.")]
    Connection(String),

    /// An input file is malformed or a field value is unparseable
    #[error("Data format error in '{path}': {message}")]
    DataFormat { path: String, message: String },

    /// A record is missing a required field
    #[error("Missing required field '{field}' in {record}")]
    FieldAccess { record: String, field: String },

    /// A statement failed at the database
    #[error("Query error: {0}")]
    Query(String),

    /// A foreign-key or uniqueness constraint was violated
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EtlError {
    /// Short machine-friendly name of the error kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EtlError::Connection(_) => "connection",
            EtlError::DataFormat { .. } => "data_format",
            EtlError::FieldAccess { .. } => "field_access",
            EtlError::Query(_) => "query",
            EtlError::Constraint(_) => "constraint",
            EtlError::Config(_) => "config",
            EtlError::Io(_) => "io",
        }
    }

    /// Convenience constructor for data format errors
    pub fn data_format(path: impl Into<String>, message: impl Into<String>) -> Self {
        EtlError::DataFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for missing-field errors
    pub fn field_access(record: impl Into<String>, field: impl Into<String>) -> Self {
        EtlError::FieldAccess {
            record: record.into(),
            field: field.into(),
        }
    }
}
