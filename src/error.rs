//! Error types for redirection layer generation.

use thiserror::Error;

/// The main error type for redirection operations.
#[derive(Debug, Error)]
pub enum RedirectError {
    /// The table has no primary key, so shadow rows cannot be matched to base rows.
    #[error("no primary key defined on table {table}")]
    MissingPrimaryKey { table: String },

    /// A table name did not resolve against the schema.
    #[error("Unknown table: '{0}'")]
    UnknownTable(String),

    /// A key refers to a column the table does not have.
    #[error("Unknown column '{column}' on table {table}")]
    UnknownColumn { table: String, column: String },

    /// Primary key is empty or uses a type that cannot identify a row.
    #[error("Invalid primary key on table {table}: {message}")]
    InvalidPrimaryKey { table: String, message: String },

    /// Foreign key is malformed or points at a missing table.
    #[error("Invalid foreign key on table {table}: {message}")]
    InvalidForeignKey { table: String, message: String },

    /// Failed to parse a schema file.
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RedirectError {
    /// Create a parse error at the given 1-based line.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create a missing primary key error.
    pub fn missing_primary_key(table: impl Into<String>) -> Self {
        Self::MissingPrimaryKey {
            table: table.into(),
        }
    }

    /// Create an unknown column error.
    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// Result type alias for redirection operations.
pub type RedirectResult<T> = Result<T, RedirectError>;
