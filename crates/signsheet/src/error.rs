//! Error types for signsheet.
//!
//! This module defines all error types used throughout the signsheet crate.
//! The first group covers input the user can correct (shown as a message and
//! recovered from); the rest are infrastructure failures.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for signsheet operations.
#[derive(Error, Debug)]
pub enum Error {
    // === User Errors ===
    /// A required field was empty or malformed.
    #[error("{message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// User-facing description of the problem.
        message: String,
    },

    /// A driver with this name already exists (case-insensitive).
    #[error("that name already exists in the list: {name}")]
    DuplicateName {
        /// The rejected name.
        name: String,
    },

    /// No record with the given id exists.
    #[error("record not found: {id}")]
    RecordNotFound {
        /// The id that did not resolve.
        id: String,
    },

    /// The staff number does not belong to a baseline driver.
    #[error("driver not found in base list: {staff_number}")]
    DriverNotFound {
        /// The staff number that did not resolve.
        staff_number: String,
    },

    /// An operation needed an active record but none is selected.
    #[error("no active record; load or create a record first")]
    NoActiveRecord,

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

    /// A roster line has no staff number.
    #[error("roster line {line} has no staff number: {text:?}")]
    RosterLine {
        /// One-based line number.
        line: usize,
        /// The offending line, trimmed.
        text: String,
    },

    /// A baseline roster file could not be read or parsed.
    #[error("failed to load baseline roster from {path}: {message}")]
    BaselineLoad {
        /// Path to the roster file.
        path: PathBuf,
        /// Description of what went wrong.
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
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for signsheet operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a validation error for the named field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a duplicate-name error.
    #[must_use]
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName { name: name.into() }
    }

    /// Create a record-not-found error.
    #[must_use]
    pub fn record_not_found(id: impl Into<String>) -> Self {
        Self::RecordNotFound { id: id.into() }
    }

    /// Create a driver-not-found error.
    #[must_use]
    pub fn driver_not_found(staff_number: impl Into<String>) -> Self {
        Self::DriverNotFound {
            staff_number: staff_number.into(),
        }
    }

    /// Check if this error comes from user input rather than infrastructure.
    ///
    /// User errors are recovered at the UI boundary and shown as a message.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::DuplicateName { .. }
                | Self::RecordNotFound { .. }
                | Self::DriverNotFound { .. }
                | Self::NoActiveRecord
        )
    }
}
