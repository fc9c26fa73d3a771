use thiserror::Error;

/// Errors surfaced by ledger mutations and persistence.
///
/// Validation problems are deliberately *not* represented here: the
/// validators return structured reports so callers can enumerate every
/// issue in one pass instead of stopping at the first failure.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Mining budget exhausted after {attempts} attempts")]
    MiningExhausted { attempts: u64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Snapshot(format!("JSON serialization error: {}", err))
    }
}

impl LedgerError {
    pub fn department_not_found(id: &str) -> Self {
        Self::NotFound(format!("department {} not in ledger", id))
    }

    pub fn class_not_found(id: &str) -> Self {
        Self::NotFound(format!("class {} not in ledger", id))
    }

    pub fn student_not_found(id: &str) -> Self {
        Self::NotFound(format!("student {} not in ledger", id))
    }

    /// True when retrying the same mutation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::MiningExhausted { .. })
    }
}
