use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Page not found: {0}")]
    NotFound(String),

    #[error("Storage quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Storage corrupted: {0}")]
    Corruption(String),

    /// Corruption was detected and no usable snapshot could restore the data.
    /// The corrupted collection is left in place for inspection.
    #[error("Unrecoverable corruption ({reason}); stored data left untouched: {}", .issues.join("; "))]
    UnrecoverableCorruption { reason: String, issues: Vec<String> },

    #[error("Recovery failed: {0}")]
    Recovery(String),

    #[error("Backup failed: {0}")]
    Backup(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(vec![message.into()])
    }

    pub fn is_corruption(&self) -> bool {
        matches!(self, StoreError::Corruption(_))
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StoreError::QuotaExceeded(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
