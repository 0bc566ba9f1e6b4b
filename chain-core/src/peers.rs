//! Gossip boundary to other nodes. Delivery is best-effort: the coordinator
//! logs failures and moves on.

use serde::{Deserialize, Serialize};

use crate::block::BlockData;
use crate::transaction::BlockTx;
use crate::types::CoreError;

pub trait PeerNet: Send + Sync {
    fn broadcast_block(&self, block: &BlockData) -> Result<(), CoreError>;
    fn broadcast_tx(&self, tx: &BlockTx) -> Result<(), CoreError>;
    fn known_peers(&self) -> Vec<String>;
}

/// Stand-in for a node with no peers.
#[derive(Debug, Default)]
pub struct NullPeers;

impl PeerNet for NullPeers {
    fn broadcast_block(&self, _block: &BlockData) -> Result<(), CoreError> {
        Ok(())
    }

    fn broadcast_tx(&self, _tx: &BlockTx) -> Result<(), CoreError> {
        Ok(())
    }

    fn known_peers(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Answer to a node-status query.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeStatus {
    pub latest_block_hash: String,
    pub latest_block_number: u64,
    pub known_peers: Vec<String>,
}
