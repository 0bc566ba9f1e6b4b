//! Unconfirmed-transaction buffer with pluggable selection.
//!
//! Entries are keyed by `(from, nonce)`. A resubmission under an occupied key
//! replaces the existing entry only when it pays a strictly greater tip.

use std::cmp::Reverse;
use std::collections::{HashMap, VecDeque};

use crate::transaction::BlockTx;
use crate::types::{AccountId, CoreError};

/// The fixed registry of selection strategies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectStrategy {
    /// Highest miner reward (tip plus gas fee) first.
    #[default]
    Tip,
    /// Arrival order.
    Fifo,
}

impl SelectStrategy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "tip" => Some(SelectStrategy::Tip),
            "fifo" => Some(SelectStrategy::Fifo),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
struct Entry {
    seq: u64,
    tx: BlockTx,
}

#[derive(Clone, Debug, Default)]
pub struct Mempool {
    entries: HashMap<(AccountId, u64), Entry>,
    next_seq: u64,
}

impl Mempool {
    pub fn new() -> Self {
        Mempool::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Admits a transaction. A duplicate `(from, nonce)` key replaces the
    /// held entry only on a strictly greater tip; otherwise the newcomer is
    /// rejected. Returns the resulting pool size.
    pub fn upsert(&mut self, tx: BlockTx) -> Result<usize, CoreError> {
        let key = (tx.tx.from.clone(), tx.tx.nonce);
        match self.entries.get_mut(&key) {
            Some(existing) => {
                if tx.tx.tip <= existing.tx.tx.tip {
                    return Err(CoreError::InvalidNonce);
                }
                // keep the original arrival position
                existing.tx = tx;
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.entries.insert(key, Entry { seq, tx });
            }
        }
        Ok(self.entries.len())
    }

    /// Drops the entry matching the transaction's `(from, nonce)` key.
    pub fn remove(&mut self, tx: &BlockTx) {
        self.entries.remove(&(tx.tx.from.clone(), tx.tx.nonce));
    }

    /// Drops everything.
    pub fn truncate(&mut self) {
        self.entries.clear();
    }

    /// All entries in arrival order.
    pub fn snapshot(&self) -> Vec<BlockTx> {
        let mut entries: Vec<&Entry> = self.entries.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries.into_iter().map(|entry| entry.tx.clone()).collect()
    }

    /// Picks up to `max_count` transactions per the strategy. Within one
    /// sender the result is always in ascending nonce order, whatever the
    /// strategy, so the selection stays applicable as a block.
    pub fn select(&self, strategy: SelectStrategy, max_count: usize) -> Vec<BlockTx> {
        let mut by_sender: HashMap<&AccountId, Vec<&Entry>> = HashMap::new();
        for entry in self.entries.values() {
            by_sender.entry(&entry.tx.tx.from).or_default().push(entry);
        }
        let mut queues: Vec<VecDeque<&Entry>> = by_sender
            .into_values()
            .map(|mut entries| {
                entries.sort_by_key(|entry| entry.tx.tx.nonce);
                VecDeque::from(entries)
            })
            .collect();

        let mut picked = Vec::new();
        while picked.len() < max_count {
            let next = match strategy {
                SelectStrategy::Tip => queues
                    .iter_mut()
                    .filter(|queue| !queue.is_empty())
                    .max_by_key(|queue| (queue[0].tx.reward(), Reverse(queue[0].seq))),
                SelectStrategy::Fifo => queues
                    .iter_mut()
                    .filter(|queue| !queue.is_empty())
                    .min_by_key(|queue| queue[0].seq),
            };
            match next.and_then(|queue| queue.pop_front()) {
                Some(entry) => picked.push(entry.tx.clone()),
                None => break,
            }
        }
        picked
    }
}
