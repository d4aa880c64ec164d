use thiserror::Error;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    #[error(transparent)]
    Core(#[from] compot_core::CoreError),

    #[error("A play is already in progress")]
    ConcurrentPlayRejected,

    #[error("Invalid game state: {0}")]
    InvalidState(String),

    #[error("No box at position {index} (have {count})")]
    InvalidBox { index: usize, count: usize },

    #[error("Invalid game configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GameError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Errors that the UI drops instead of showing to the player.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::ConcurrentPlayRejected)
    }

    pub fn is_insufficient_funds(&self) -> bool {
        matches!(
            self,
            Self::Core(compot_core::CoreError::InsufficientFunds { .. })
        )
    }
}
