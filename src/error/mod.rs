//! Error handling for the ledger
//!
//! One enum covers every structural failure the core can surface. Admission
//! skips (a sender that cannot cover a transfer) are deliberately not errors.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Error types for ledger, mining and persistence operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockchainError {
    /// Malformed transaction, rejected before it reaches the pending pool
    InvalidTransaction(String),
    /// A submitted block failed re-validation against the ledger tail
    InvalidBlock(String),
    /// No nonce below the ceiling satisfied the difficulty
    MiningExhausted { max_nonce: u64, difficulty: u32 },
    /// Hash linkage, proof-of-work or balance replay mismatch
    ChainCorrupted(String),
    /// Configuration errors
    Config(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// File I/O errors
    Io(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {msg}"),
            BlockchainError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            BlockchainError::MiningExhausted {
                max_nonce,
                difficulty,
            } => {
                write!(
                    f,
                    "Mining exhausted: no nonce below {max_nonce} satisfies difficulty {difficulty}"
                )
            }
            BlockchainError::ChainCorrupted(msg) => write!(f, "Chain corrupted: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BlockchainError {
    fn from(err: toml::de::Error) -> Self {
        BlockchainError::Config(err.to_string())
    }
}
