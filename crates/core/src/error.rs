use thiserror::Error;

pub type SalesResult<T> = Result<T, SalesError>;

#[derive(Error, Debug)]
pub enum SalesError {
    #[error("Load error: {0}")]
    Load(String),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Profit margin undefined for `{0}`: denominator is zero")]
    UndefinedMetric(String),

    #[error("Totals for `{0}` exceed the representable money range")]
    Overflow(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl SalesError {
    /// Errors that keep the dashboard in its pre-upload state.
    pub fn is_load_error(&self) -> bool {
        matches!(self, SalesError::Load(_) | SalesError::MissingColumns(_))
    }

    pub fn is_invalid_range(&self) -> bool {
        matches!(self, SalesError::InvalidRange(_))
    }
}
