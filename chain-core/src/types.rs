use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of a hash string: `0x` followed by 64 hex digits.
pub const HASH_STR_LEN: usize = 66;

/// The all-zero hash, used as the genesis sentinel and the empty merkle root.
pub const ZERO_HASH: &str = "0x0000000000000000000000000000000000000000000000000000000000000000";

/// Hex digits in an account address (20 bytes).
const ADDRESS_HEX_LEN: usize = 40;

/// Formats a 32-byte digest as a `0x`-prefixed lowercase hex string.
pub fn hash_hex(digest: [u8; 32]) -> String {
    format!("0x{}", hex::encode(digest))
}

/// A 20-byte account address in checksum-cased hex, `0x`-prefixed.
///
/// Ordering is lexicographic over the string form, which gives the
/// sorted-by-id account sequence the state root commits to.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// The all-zero address, used by the pre-genesis sentinel block.
    pub fn zero() -> Self {
        AccountId(format!("0x{}", "0".repeat(ADDRESS_HEX_LEN)))
    }

    pub(crate) fn new_unchecked(addr: String) -> Self {
        AccountId(addr)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s
            .strip_prefix("0x")
            .ok_or_else(|| CoreError::InvalidAccount(s.to_string()))?;
        if hex_part.len() != ADDRESS_HEX_LEN || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidAccount(s.to_string()));
        }
        Ok(AccountId(s.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("chain id mismatch: expected {expected}, got {got}")]
    InvalidChain { expected: u16, got: u16 },
    #[error("invalid nonce")]
    InvalidNonce,
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("invalid block structure: {0}")]
    InvalidBlockStructure(String),
    #[error("chain forked")]
    ChainForked,
    #[error("stale tip")]
    StaleTip,
    #[error("mining already in progress")]
    Busy,
    #[error("operation cancelled")]
    Cancelled,
    #[error("storage failure: {0}")]
    StorageFailure(String),
    #[error("invalid account id: {0}")]
    InvalidAccount(String),
    #[error("genesis error: {0}")]
    Genesis(#[from] genesis::GenesisError),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}
