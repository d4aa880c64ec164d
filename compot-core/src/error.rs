use crate::types::Money;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Insufficient funds: need {need}, have {available}")]
    InsufficientFunds { need: Money, available: Money },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Corrupt persisted state: {0}")]
    CorruptPersistedState(String),

    #[error("No ticket numbers left after #{next}")]
    TicketNumbersExhausted { next: u64 },

    #[error("Competition not found: {id}")]
    UnknownCompetition { id: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptPersistedState(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
