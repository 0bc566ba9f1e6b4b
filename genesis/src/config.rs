use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::GenesisError;

/// Lowest difficulty a chain may run at.
pub const MIN_DIFFICULTY: u16 = 1;
/// Highest difficulty representable in a 64-hex-digit hash.
pub const MAX_DIFFICULTY: u16 = 63;

/// The genesis document: chain identity, mining parameters, and the initial
/// balance sheet. Serialized as JSON on disk.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genesis {
    pub chain_id: u16,
    pub difficulty: u16,
    pub mining_reward: u64,
    pub gas_price: u64,
    pub balances: BTreeMap<String, u64>,
}

impl Genesis {
    /// Reads and validates a genesis document from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GenesisError> {
        let raw = fs::read(path)?;
        let genesis: Genesis = serde_json::from_slice(&raw)?;
        genesis.validate()?;
        Ok(genesis)
    }

    /// Writes the document to disk as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), GenesisError> {
        let raw = serde_json::to_vec_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }

    /// Checks the document invariants: difficulty range and the shape of
    /// every balance-sheet address.
    pub fn validate(&self) -> Result<(), GenesisError> {
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&self.difficulty) {
            return Err(GenesisError::InvalidDifficulty(self.difficulty));
        }
        for addr in self.balances.keys() {
            validate_address(addr)?;
        }
        Ok(())
    }
}

fn validate_address(addr: &str) -> Result<(), GenesisError> {
    let hex_part = addr
        .strip_prefix("0x")
        .ok_or_else(|| GenesisError::InvalidAddress(addr.to_string()))?;
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GenesisError::InvalidAddress(addr.to_string()));
    }
    Ok(())
}
