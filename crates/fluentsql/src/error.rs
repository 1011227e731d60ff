//! Error types for fluentsql

use thiserror::Error;

/// Result type alias for fluentsql operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Boxed error produced by a [`Driver`](crate::Driver) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification of a [`QueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Registry or statement configuration is incomplete or invalid.
    Configuration,
    /// The caller used the builder incorrectly.
    Usage,
    /// The dialect explicitly declines the operation.
    Unsupported,
    /// The driver reported a failure.
    Driver,
    /// A row or value could not be decoded.
    Decode,
}

/// Error types for statement building and execution
#[derive(Debug, Error)]
pub enum QueryError {
    /// Table name was never registered
    #[error("`{0}` is an invalid table name")]
    UnknownTable(String),

    /// Invalid statement configuration (upsert target, JSON pairs, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Comparison operator outside the whitelist
    #[error("Invalid operator {0}")]
    InvalidOperator(String),

    /// A statement was embedded into itself
    #[error("A new statement instance must be passed as a subquery, not the receiver itself")]
    SelfReference,

    /// Placeholder count does not match bound parameters
    #[error("Statement has {placeholders} placeholder(s) but {params} bound parameter(s)")]
    ParamMismatch { placeholders: usize, params: usize },

    /// Other misuse of the builder API
    #[error("Usage error: {0}")]
    Usage(String),

    /// Operation not available in the active dialect
    #[error("{operation} is not implemented for the {dialect} dialect; {hint}")]
    Unsupported {
        dialect: &'static str,
        operation: &'static str,
        hint: &'static str,
    },

    /// Failure surfaced by the driver
    #[error("Driver error: {0}")]
    Driver(#[source] BoxError),

    /// Failure surfaced by tokio-postgres
    #[cfg(feature = "postgres")]
    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// The rollback issued after a failure failed as well
    #[error("{error} (rollback failed: {rollback})")]
    RollbackFailed {
        error: Box<QueryError>,
        rollback: Box<QueryError>,
    },
}

impl QueryError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Wrap any driver-side error
    pub fn driver(err: impl Into<BoxError>) -> Self {
        Self::Driver(err.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownTable(_) | Self::Configuration(_) => ErrorKind::Configuration,
            Self::InvalidOperator(_)
            | Self::SelfReference
            | Self::ParamMismatch { .. }
            | Self::Usage(_) => ErrorKind::Usage,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::Driver(_) => ErrorKind::Driver,
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => ErrorKind::Driver,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::RollbackFailed { error, .. } => error.kind(),
        }
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    /// Check if this is a usage error
    pub fn is_usage(&self) -> bool {
        self.kind() == ErrorKind::Usage
    }

    /// Check if the dialect declined the operation
    pub fn is_unsupported(&self) -> bool {
        self.kind() == ErrorKind::Unsupported
    }

    /// Check if the error came from the driver
    pub fn is_driver(&self) -> bool {
        self.kind() == ErrorKind::Driver
    }
}
