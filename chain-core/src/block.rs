//! Block structures and the proof-of-work search.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::crypto::keccak256;
use crate::events::{ChainEvent, EventBus};
use crate::merkle::MerkleTree;
use crate::transaction::BlockTx;
use crate::types::{hash_hex, AccountId, CoreError, HASH_STR_LEN, ZERO_HASH};

/// How often the search loop reports progress.
const ATTEMPT_MILESTONE: u64 = 1_000_000;

/// Block metadata. Field declaration order is the hashing contract: the block
/// hash is keccak-256 over this struct's canonical JSON, so only headers are
/// needed to audit the chain.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockHeader {
    pub number: u64,
    pub prev_block_hash: String,
    pub timestamp: u64,
    pub beneficiary: AccountId,
    pub difficulty: u16,
    pub mining_reward: u64,
    pub state_root: String,
    pub trans_root: String,
    pub nonce: u64,
}

impl BlockHeader {
    pub fn hash(&self) -> Result<String, CoreError> {
        let json = serde_json::to_vec(self)?;
        Ok(hash_hex(keccak256(&json)))
    }
}

/// A block as held in memory: its header and the merkle tree committing to
/// the ordered transactions.
#[derive(Clone, Debug)]
pub struct Block {
    pub header: BlockHeader,
    pub tree: MerkleTree<BlockTx>,
}

impl Block {
    /// The pre-chain sentinel: number 0, all-zero commitments. Its hash is
    /// the zero-hash, never a digest.
    pub fn genesis() -> Self {
        Block {
            header: BlockHeader {
                number: 0,
                prev_block_hash: ZERO_HASH.to_string(),
                timestamp: 0,
                beneficiary: AccountId::zero(),
                difficulty: 0,
                mining_reward: 0,
                state_root: ZERO_HASH.to_string(),
                trans_root: ZERO_HASH.to_string(),
                nonce: 0,
            },
            tree: MerkleTree::empty(),
        }
    }

    pub fn hash(&self) -> Result<String, CoreError> {
        if self.header.number == 0 {
            return Ok(ZERO_HASH.to_string());
        }
        self.header.hash()
    }

    /// The block's transactions in committed order.
    pub fn transactions(&self) -> &[BlockTx] {
        self.tree.values()
    }
}

/// The serializable form of a block, for the wire and for storage. `hash`
/// caches the header hash.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockData {
    pub hash: String,
    pub block: BlockHeader,
    pub trans: Vec<BlockTx>,
}

impl BlockData {
    pub fn from_block(block: &Block) -> Result<Self, CoreError> {
        Ok(BlockData {
            hash: block.hash()?,
            block: block.header.clone(),
            trans: block.transactions().to_vec(),
        })
    }

    /// Rebuilds the in-memory block, reconstructing the merkle tree.
    pub fn to_block(self) -> Result<Block, CoreError> {
        Ok(Block {
            header: self.block,
            tree: MerkleTree::new(self.trans)?,
        })
    }
}

/// Everything the proof-of-work search needs, captured from a snapshot of the
/// coordinator state.
pub struct PowArgs {
    pub beneficiary: AccountId,
    pub difficulty: u16,
    pub mining_reward: u64,
    pub prev_block: Block,
    pub state_root: String,
    pub trans: Vec<BlockTx>,
    pub events: EventBus,
}

/// Constructs the next block and searches for a nonce that solves the hash
/// puzzle. The nonce starts at a random 64-bit value so two miners building
/// identical headers do not collide. Cancellation is polled every iteration
/// and produces no partial state.
pub fn pow(args: PowArgs, cancel: &CancellationToken) -> Result<Block, CoreError> {
    let prev_block_hash = args.prev_block.hash()?;
    let tree = MerkleTree::new(args.trans)?;

    let mut block = Block {
        header: BlockHeader {
            number: args.prev_block.header.number + 1,
            prev_block_hash,
            timestamp: chrono::Utc::now().timestamp_millis() as u64,
            beneficiary: args.beneficiary,
            difficulty: args.difficulty,
            mining_reward: args.mining_reward,
            state_root: args.state_root,
            trans_root: tree.root_hex(),
            nonce: OsRng.next_u64(),
        },
        tree,
    };

    args.events.publish(ChainEvent::MiningStarted);

    let mut attempts: u64 = 0;
    loop {
        attempts += 1;
        if attempts % ATTEMPT_MILESTONE == 0 {
            args.events.publish(ChainEvent::MiningAttempts(attempts));
        }

        if cancel.is_cancelled() {
            args.events.publish(ChainEvent::MiningCancelled);
            return Err(CoreError::Cancelled);
        }

        let hash = block.header.hash()?;
        if is_solved(block.header.difficulty, &hash) {
            args.events.publish(ChainEvent::MiningSolved);
            return Ok(block);
        }
        block.header.nonce = block.header.nonce.wrapping_add(1);
    }
}

/// A hash solves the puzzle when it carries at least `difficulty` leading
/// zero hex digits after the `0x` prefix. Strings that are not 66 characters
/// never solve.
pub fn is_solved(difficulty: u16, hash: &str) -> bool {
    if hash.len() != HASH_STR_LEN || !hash.starts_with("0x") {
        return false;
    }
    let zeros = hash[2..].bytes().take_while(|b| *b == b'0').count();
    zeros >= difficulty as usize
}
