use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed genesis document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("difficulty {0} out of range (1..=63)")]
    InvalidDifficulty(u16),
    #[error("invalid balance-sheet address: {0}")]
    InvalidAddress(String),
}
