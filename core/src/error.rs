use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Malformed table {table} at line {line}: {reason}")]
    Table {
        table: String,
        line: usize,
        reason: String,
    },

    #[error("Run {0} already exists in the store")]
    DuplicateRun(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GenError {
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type GenResult<T> = Result<T, GenError>;
