//! Core of a minimal proof-of-work ledger node: the in-memory state machine
//! that ingests signed transactions, assembles and mines candidate blocks,
//! validates blocks from peers, and applies their effects to account
//! balances. Transport, persistence backends, and peer discovery live behind
//! the [`storage::Storage`] and [`peers::PeerNet`] ports.

pub mod block;
pub mod chain;
pub mod crypto;
pub mod events;
pub mod ledger;
pub mod mempool;
pub mod merkle;
pub mod peers;
pub mod storage;
pub mod transaction;
pub mod types;

pub use crate::block::{is_solved, pow, Block, BlockData, BlockHeader, PowArgs};
pub use crate::chain::{Chain, ChainConfig, QUERY_LATEST};
pub use crate::crypto::{
    derive_address, generate_keypair, keccak256, recover_signer, secret_key_from_hex,
    sign_digest, signable_digest, PublicKey, Scalar256, SecretKey,
};
pub use crate::events::{ChainEvent, EventBus};
pub use crate::ledger::{Account, Ledger};
pub use crate::mempool::{Mempool, SelectStrategy};
pub use crate::merkle::{leaf_hash, MerkleSibling, MerkleTree};
pub use crate::peers::{NodeStatus, NullPeers, PeerNet};
pub use crate::storage::{MemoryStorage, Storage};
pub use crate::transaction::{BlockTx, SignedTx, Tx};
pub use crate::types::{AccountId, CoreError, ZERO_HASH};
