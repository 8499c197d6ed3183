//! Error types for growthwatch.
//!
//! This module defines all error types used throughout the growthwatch crate.
//! An age outside the reference table is not an error: it is reported as an
//! [`OutOfRange`](crate::classify::GrowthStatus::OutOfRange) verdict.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for growthwatch operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Reference Data Errors ===
    /// The reference table contents are inconsistent or unusable.
    #[error("reference data integrity error: {0}")]
    DataIntegrity(String),

    /// A reference table file could not be parsed.
    #[error("failed to parse reference table at line {line}: {message}")]
    ReferenceParse {
        /// 1-based line number in the source text.
        line: usize,
        /// Description of what went wrong.
        message: String,
    },

    // === Input Errors ===
    /// A measurement supplied by the caller is outside its accepted domain.
    #[error("invalid {field}: {message}")]
    InvalidMeasurement {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// The height estimator failed to produce a prediction.
    #[error("estimator error: {0}")]
    Estimator(String),

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for growthwatch operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new data integrity error.
    #[must_use]
    pub fn data_integrity(message: impl Into<String>) -> Self {
        Self::DataIntegrity(message.into())
    }

    /// Create a new reference parse error for the given line.
    #[must_use]
    pub fn reference_parse(line: usize, message: impl Into<String>) -> Self {
        Self::ReferenceParse {
            line,
            message: message.into(),
        }
    }

    /// Create a new invalid measurement error.
    #[must_use]
    pub fn invalid_measurement(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidMeasurement {
            field,
            message: message.into(),
        }
    }

    /// Create a new estimator error.
    #[must_use]
    pub fn estimator(message: impl Into<String>) -> Self {
        Self::Estimator(message.into())
    }

    /// Check if this error indicates defective reference data.
    #[must_use]
    pub fn is_data_integrity(&self) -> bool {
        matches!(self, Self::DataIntegrity(_))
    }

    /// Check if this error was caused by caller input.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidMeasurement { .. })
    }
}
