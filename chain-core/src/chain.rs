//! The chain coordinator: one shared object guarding the latest block, the
//! ledger, and the mempool, orchestrating submission, mining, validation,
//! and application.
//!
//! All mutable state sits behind a single readers/writer lock. Reads take
//! the shared mode; every mutation takes the exclusive mode. The PoW search
//! runs outside the lock on a snapshot and only the commit re-acquires it,
//! failing with `StaleTip` when the tip moved mid-search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use genesis::Genesis;

use crate::block::{is_solved, pow, Block, BlockData, PowArgs};
use crate::events::{ChainEvent, EventBus};
use crate::ledger::{Account, Ledger};
use crate::mempool::{Mempool, SelectStrategy};
use crate::peers::{NodeStatus, PeerNet};
use crate::storage::Storage;
use crate::transaction::{BlockTx, SignedTx};
use crate::types::{AccountId, CoreError};

/// Sentinel for "the current tip" in block-range queries.
pub const QUERY_LATEST: u64 = u64::MAX;

/// Gas units charged per transaction, fixed at mempool admission.
const GAS_UNITS_PER_TX: u64 = 1;

pub struct ChainConfig {
    /// Account credited with fees, tips, and mining rewards.
    pub beneficiary: AccountId,
    pub genesis: Genesis,
    pub strategy: SelectStrategy,
    /// Upper bound on transactions selected into one block.
    pub trans_per_block: usize,
    pub storage: Arc<dyn Storage>,
    pub peers: Arc<dyn PeerNet>,
}

struct Inner {
    latest_block: Block,
    ledger: Ledger,
    mempool: Mempool,
}

pub struct Chain {
    beneficiary: AccountId,
    genesis: Genesis,
    strategy: SelectStrategy,
    trans_per_block: usize,
    storage: Arc<dyn Storage>,
    peers: Arc<dyn PeerNet>,
    events: EventBus,
    mining: AtomicBool,
    inner: RwLock<Inner>,
}

impl Chain {
    /// Builds the coordinator: validates the genesis document, seeds the
    /// ledger from its balance sheet, then replays every stored block in
    /// chain order, validating each against the advancing tip. A stored
    /// block that fails validation halts construction.
    pub fn new(cfg: ChainConfig) -> Result<Self, CoreError> {
        cfg.genesis.validate()?;
        let ledger = Ledger::from_genesis(&cfg.genesis)?;

        let chain = Chain {
            beneficiary: cfg.beneficiary,
            genesis: cfg.genesis,
            strategy: cfg.strategy,
            trans_per_block: cfg.trans_per_block,
            storage: cfg.storage,
            peers: cfg.peers,
            events: EventBus::default(),
            mining: AtomicBool::new(false),
            inner: RwLock::new(Inner {
                latest_block: Block::genesis(),
                ledger,
                mempool: Mempool::new(),
            }),
        };
        chain.replay_storage()?;
        Ok(chain)
    }

    fn replay_storage(&self) -> Result<(), CoreError> {
        let stored: Vec<BlockData> = self.storage.iter().collect::<Result<_, _>>()?;
        if stored.is_empty() {
            return Ok(());
        }

        let mut inner = self.inner.write();
        for data in stored {
            let block = data.to_block()?;
            let staged = validate_block(
                &block,
                &inner.latest_block,
                &inner.ledger,
                self.genesis.chain_id,
            )?;
            inner.ledger = staged;
            inner.latest_block = block;
        }
        info!(
            number = inner.latest_block.header.number,
            "ledger rehydrated from storage"
        );
        Ok(())
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn genesis(&self) -> &Genesis {
        &self.genesis
    }

    /// Validates a wallet submission, fixes its gas terms, and admits it to
    /// the mempool, then shares it with known peers.
    pub fn upsert_wallet_tx(&self, signed: SignedTx) -> Result<usize, CoreError> {
        if let Err(err) = signed.validate(self.genesis.chain_id) {
            self.events.publish(ChainEvent::TxRejected(err.to_string()));
            return Err(err);
        }
        let tx = BlockTx::new(signed, GAS_UNITS_PER_TX, self.genesis.gas_price);
        let admitted = self.admit(tx.clone())?;

        if let Err(err) = self.peers.broadcast_tx(&tx) {
            warn!(error = %err, "transaction broadcast failed");
        }
        Ok(admitted)
    }

    /// Admits a transaction forwarded by a peer. Peer submissions are not
    /// re-broadcast.
    pub fn upsert_node_tx(&self, tx: BlockTx) -> Result<usize, CoreError> {
        if let Err(err) = tx.validate(self.genesis.chain_id) {
            self.events.publish(ChainEvent::TxRejected(err.to_string()));
            return Err(err);
        }
        self.admit(tx)
    }

    fn admit(&self, tx: BlockTx) -> Result<usize, CoreError> {
        let result = self.inner.write().mempool.upsert(tx.clone());
        match result {
            Ok(count) => {
                debug!(from = %tx.tx.from, nonce = tx.tx.nonce, "transaction admitted");
                self.events.publish(ChainEvent::TxAccepted {
                    from: tx.tx.from.clone(),
                    nonce: tx.tx.nonce,
                });
                Ok(count)
            }
            Err(err) => {
                self.events.publish(ChainEvent::TxRejected(err.to_string()));
                Err(err)
            }
        }
    }

    /// Mines, commits, persists, and broadcasts the next block.
    ///
    /// Only one mining task may be active; a second call fails with `Busy`.
    /// The search runs on a blocking thread against a snapshot of the tip;
    /// the commit fails with `StaleTip` if the tip advanced meanwhile, in
    /// which case the mempool and ledger are untouched and the caller may
    /// retry.
    pub async fn mine_next_block(&self, cancel: CancellationToken) -> Result<Block, CoreError> {
        let _guard = MiningGuard::acquire(&self.mining)?;

        let (prev_block, snapshot_tip_hash, state_root, trans) = {
            let inner = self.inner.read();
            let selected = inner.mempool.select(self.strategy, self.trans_per_block);
            let trans = inner.ledger.filter_applicable(&self.beneficiary, selected);
            let snapshot_tip_hash = inner.latest_block.hash()?;
            let state_root = inner.ledger.state_root()?;
            (inner.latest_block.clone(), snapshot_tip_hash, state_root, trans)
        };

        let args = PowArgs {
            beneficiary: self.beneficiary.clone(),
            difficulty: self.genesis.difficulty,
            mining_reward: self.genesis.mining_reward,
            prev_block,
            state_root,
            trans,
            events: self.events.clone(),
        };
        let token = cancel.clone();
        let block = tokio::task::spawn_blocking(move || pow(args, &token))
            .await
            .map_err(|_| CoreError::Cancelled)??;

        self.commit_mined_block(block, &snapshot_tip_hash)
    }

    /// Commits a block mined against `snapshot_tip_hash`. Ordering inside
    /// the exclusive section: validate (dry-run), persist, mutate ledger,
    /// purge mempool; the peer broadcast happens after the lock drops.
    fn commit_mined_block(
        &self,
        block: Block,
        snapshot_tip_hash: &str,
    ) -> Result<Block, CoreError> {
        let mut inner = self.inner.write();
        if inner.latest_block.hash()? != snapshot_tip_hash {
            return Err(CoreError::StaleTip);
        }

        let staged = inner.ledger.dry_run(
            &block.header.beneficiary,
            block.header.mining_reward,
            block.transactions(),
        )?;
        let data = BlockData::from_block(&block)?;
        self.storage.write(&data)?;
        inner.ledger = staged;
        for tx in block.transactions() {
            inner.mempool.remove(tx);
        }
        inner.latest_block = block.clone();
        drop(inner);

        info!(number = block.header.number, hash = %data.hash, "mined block committed");
        self.events.publish(ChainEvent::BlockApplied {
            number: block.header.number,
            hash: data.hash.clone(),
        });
        if let Err(err) = self.peers.broadcast_block(&data) {
            warn!(error = %err, "block broadcast failed");
        }
        Ok(block)
    }

    /// Validates a block received from a peer against the local tip and, on
    /// success, persists and applies it. Validation and application run
    /// under the exclusive lock with no suspension point between them. A
    /// competing block at an already-occupied height surfaces `ChainForked`
    /// without mutating state.
    pub fn process_proposed_block(&self, block: Block) -> Result<(), CoreError> {
        let mut inner = self.inner.write();
        let staged = validate_block(
            &block,
            &inner.latest_block,
            &inner.ledger,
            self.genesis.chain_id,
        )?;

        let data = BlockData::from_block(&block)?;
        self.storage.write(&data)?;
        inner.ledger = staged;
        for tx in block.transactions() {
            inner.mempool.remove(tx);
        }
        let number = block.header.number;
        inner.latest_block = block;
        drop(inner);

        info!(number, hash = %data.hash, "proposed block applied");
        self.events.publish(ChainEvent::BlockApplied {
            number,
            hash: data.hash,
        });
        Ok(())
    }

    pub fn latest_block(&self) -> Block {
        self.inner.read().latest_block.clone()
    }

    /// Blocks in the inclusive `[from, to]` range, where `QUERY_LATEST`
    /// stands for the current tip.
    pub fn query_blocks(&self, from: u64, to: u64) -> Result<Vec<BlockData>, CoreError> {
        let latest = self.inner.read().latest_block.header.number;
        let from = if from == QUERY_LATEST { latest } else { from };
        let to = if to == QUERY_LATEST { latest } else { to };

        let mut blocks = Vec::new();
        if from > to {
            return Ok(blocks);
        }
        for number in from..=to {
            match self.storage.get_block(number)? {
                Some(data) => blocks.push(data),
                None => break,
            }
        }
        Ok(blocks)
    }

    /// Mempool contents in arrival order, optionally restricted to
    /// transactions touching `account`.
    pub fn mempool_snapshot(&self, account: Option<&AccountId>) -> Vec<BlockTx> {
        let snapshot = self.inner.read().mempool.snapshot();
        match account {
            Some(id) => snapshot
                .into_iter()
                .filter(|tx| tx.tx.from == *id || tx.tx.to == *id)
                .collect(),
            None => snapshot,
        }
    }

    pub fn state_root(&self) -> Result<String, CoreError> {
        self.inner.read().ledger.state_root()
    }

    pub fn account(&self, id: &AccountId) -> Account {
        self.inner.read().ledger.account(id)
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.inner.read().ledger.accounts()
    }

    pub fn status(&self) -> Result<NodeStatus, CoreError> {
        let inner = self.inner.read();
        Ok(NodeStatus {
            latest_block_hash: inner.latest_block.hash()?,
            latest_block_number: inner.latest_block.header.number,
            known_peers: self.peers.known_peers(),
        })
    }
}

/// Full validation of a block against the local tip and ledger. Returns the
/// post-application ledger so a successful validation doubles as the apply
/// step.
fn validate_block(
    block: &Block,
    tip: &Block,
    ledger: &Ledger,
    chain_id: u16,
) -> Result<Ledger, CoreError> {
    if block.header.number <= tip.header.number {
        return Err(CoreError::ChainForked);
    }
    if block.header.number != tip.header.number + 1 {
        return Err(CoreError::InvalidBlockStructure(format!(
            "block number {} leaves a gap after tip {}",
            block.header.number, tip.header.number
        )));
    }
    if block.header.prev_block_hash != tip.hash()? {
        return Err(CoreError::ChainForked);
    }
    let hash = block.hash()?;
    if !is_solved(block.header.difficulty, &hash) {
        return Err(CoreError::InvalidBlockStructure(
            "hash does not meet difficulty".to_string(),
        ));
    }
    if block.header.trans_root != block.tree.root_hex() {
        return Err(CoreError::InvalidBlockStructure(
            "transaction root mismatch".to_string(),
        ));
    }
    for tx in block.transactions() {
        tx.validate(chain_id)?;
    }
    if block.header.state_root != ledger.state_root()? {
        return Err(CoreError::InvalidBlockStructure(
            "state root mismatch".to_string(),
        ));
    }
    ledger.dry_run(
        &block.header.beneficiary,
        block.header.mining_reward,
        block.transactions(),
    )
}

/// Holds the single-miner slot; releases it on drop, including on
/// cancellation and on error paths.
struct MiningGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> MiningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, CoreError> {
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CoreError::Busy);
        }
        Ok(MiningGuard { flag })
    }
}

impl Drop for MiningGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
