//! Error types for polyorm

use thiserror::Error;

/// Result type alias for polyorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for SQL generation
#[derive(Debug, Error)]
pub enum OrmError {
    /// Invalid model shape (duplicate columns, unknown index fields, ...)
    #[error("Definition error: {0}")]
    Definition(String),

    /// Expression node or dialect feature that cannot be translated
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Value that cannot be rendered as a SQL literal
    #[error("Literal error: {0}")]
    Literal(String),

    /// Client-side evaluation of a constant subexpression failed
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Failure reported by the external command executor
    #[error("Command error: {0}")]
    Command(String),

    /// Settings or schema file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl OrmError {
    /// Create a definition error
    pub fn definition(message: impl Into<String>) -> Self {
        Self::Definition(message.into())
    }

    /// Create a not supported error
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::NotSupported(message.into())
    }

    /// Create a literal error
    pub fn literal(message: impl Into<String>) -> Self {
        Self::Literal(message.into())
    }

    /// Create an evaluation error
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation(message.into())
    }

    /// Create a command error
    pub fn command(message: impl Into<String>) -> Self {
        Self::Command(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a not supported error
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported(_))
    }

    /// Check if this is a definition error
    pub fn is_definition(&self) -> bool {
        matches!(self, Self::Definition(_))
    }

    /// Check if a command error reports an object (generator, sequence) that already exists.
    ///
    /// Matches the messages Firebird and PostgreSQL return for a repeated
    /// `CREATE GENERATOR` / `CREATE SEQUENCE`.
    pub fn is_duplicate_object(&self) -> bool {
        match self {
            Self::Command(msg) => {
                let msg = msg.to_ascii_lowercase();
                msg.contains("already exists") || msg.contains("attempt to store duplicate value")
            }
            _ => false,
        }
    }
}

impl From<toml::de::Error> for OrmError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
