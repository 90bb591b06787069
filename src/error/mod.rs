//! Error handling for the ledger
//!
//! Only genuine failures live here. A block or transaction that simply does
//! not pass validation is not an error: those come back as `bool` or as one of
//! the rejection enums in `core::validator`.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Error types for ledger, storage and simulation operations
#[derive(Debug, Clone)]
pub enum BlockchainError {
    /// Database-related errors
    Database(String),
    /// Cryptographic operation errors (bad key material, signing failures)
    Crypto(String),
    /// Wallet operation errors
    Wallet(String),
    /// Configuration errors
    Config(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// File I/O errors
    Io(String),
    /// Invalid address format
    InvalidAddress(String),
    /// Block construction or import errors
    InvalidBlock(String),
    /// A derived balance went below zero; the ledger can no longer be trusted
    NegativeBalance { address: String, balance: i64 },
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::Database(msg) => write!(f, "Database error: {msg}"),
            BlockchainError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            BlockchainError::Wallet(msg) => write!(f, "Wallet error: {msg}"),
            BlockchainError::Config(msg) => write!(f, "Configuration error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
            BlockchainError::InvalidAddress(addr) => write!(f, "Invalid address: {addr}"),
            BlockchainError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            BlockchainError::NegativeBalance { address, balance } => write!(
                f,
                "Negative balance occurred for {address}: {balance}, shutting down simulation"
            ),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<sled::Error> for BlockchainError {
    fn from(err: sled::Error) -> Self {
        BlockchainError::Database(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for BlockchainError {
    fn from(err: bincode::error::EncodeError) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for BlockchainError {
    fn from(err: bincode::error::DecodeError) -> Self {
        BlockchainError::Serialization(err.to_string())
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

impl From<hex::FromHexError> for BlockchainError {
    fn from(err: hex::FromHexError) -> Self {
        BlockchainError::Serialization(format!("Invalid hex string: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_balance_message() {
        let err = BlockchainError::NegativeBalance {
            address: "FC".to_string(),
            balance: -5,
        };
        assert_eq!(
            err.to_string(),
            "Negative balance occurred for FC: -5, shutting down simulation"
        );
    }

    #[test]
    fn test_from_hex_error() {
        let err: BlockchainError = hex::decode("zz").unwrap_err().into();
        assert!(matches!(err, BlockchainError::Serialization(_)));
    }
}
