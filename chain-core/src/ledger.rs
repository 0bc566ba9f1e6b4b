//! The account ledger: balances and nonces, with atomic block application
//! and the state-root commitment.

use std::collections::BTreeMap;

use serde::Serialize;

use genesis::Genesis;

use crate::block::Block;
use crate::crypto::keccak256;
use crate::transaction::BlockTx;
use crate::types::{hash_hex, AccountId, CoreError};

/// One account record. Field order feeds the state-root hash.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Account {
    pub account_id: AccountId,
    pub balance: u64,
    pub nonce: u64,
}

/// Mapping of account id to account. Accounts are created on first credit
/// and persist. The map is ordered so the state root always commits to the
/// sorted-by-id sequence.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    accounts: BTreeMap<AccountId, Account>,
}

impl Ledger {
    /// Seeds the ledger from the genesis balance sheet.
    pub fn from_genesis(genesis: &Genesis) -> Result<Self, CoreError> {
        let mut ledger = Ledger::default();
        for (addr, balance) in &genesis.balances {
            let id: AccountId = addr.parse()?;
            ledger.accounts.insert(
                id.clone(),
                Account {
                    account_id: id,
                    balance: *balance,
                    nonce: 0,
                },
            );
        }
        Ok(ledger)
    }

    /// The account record, or a zero-valued one for unknown ids.
    pub fn account(&self, id: &AccountId) -> Account {
        self.accounts.get(id).cloned().unwrap_or_else(|| Account {
            account_id: id.clone(),
            balance: 0,
            nonce: 0,
        })
    }

    pub fn balance(&self, id: &AccountId) -> u64 {
        self.account(id).balance
    }

    /// The nonce the sender's next transaction must carry.
    pub fn next_nonce(&self, id: &AccountId) -> u64 {
        self.account(id).nonce
    }

    /// All accounts, sorted by id.
    pub fn accounts(&self) -> Vec<Account> {
        self.accounts.values().cloned().collect()
    }

    /// keccak-256 over the canonical JSON of the sorted account sequence.
    pub fn state_root(&self) -> Result<String, CoreError> {
        let accounts: Vec<&Account> = self.accounts.values().collect();
        let json = serde_json::to_vec(&accounts)?;
        Ok(hash_hex(keccak256(&json)))
    }

    /// Applies every effect of the block, or none of them: each transaction
    /// in block order, then the mining reward to the beneficiary.
    pub fn apply_block(&mut self, block: &Block) -> Result<(), CoreError> {
        let staged = self.dry_run(
            &block.header.beneficiary,
            block.header.mining_reward,
            block.transactions(),
        )?;
        *self = staged;
        Ok(())
    }

    /// Runs a full block application on a copy and returns the resulting
    /// ledger without committing it.
    pub fn dry_run(
        &self,
        beneficiary: &AccountId,
        mining_reward: u64,
        txs: &[BlockTx],
    ) -> Result<Ledger, CoreError> {
        let mut staged = self.clone();
        for tx in txs {
            staged.apply_tx(beneficiary, tx)?;
        }
        staged.credit(beneficiary, mining_reward);
        Ok(staged)
    }

    /// Keeps the prefix-consistent subset of `txs` that applies cleanly under
    /// the current state, dropping entries the ledger rejects. Used to vet a
    /// mempool selection before mining starts.
    pub fn filter_applicable(&self, beneficiary: &AccountId, txs: Vec<BlockTx>) -> Vec<BlockTx> {
        let mut staged = self.clone();
        let mut kept = Vec::with_capacity(txs.len());
        for tx in txs {
            if staged.apply_tx(beneficiary, &tx).is_ok() {
                kept.push(tx);
            }
        }
        kept
    }

    fn apply_tx(&mut self, beneficiary: &AccountId, tx: &BlockTx) -> Result<(), CoreError> {
        let mut sender = self.account(&tx.tx.from);
        if tx.tx.nonce != sender.nonce {
            return Err(CoreError::InvalidNonce);
        }
        let cost = tx.cost();
        if sender.balance < cost {
            return Err(CoreError::InsufficientFunds);
        }
        sender.balance -= cost;
        sender.nonce += 1;
        self.accounts.insert(sender.account_id.clone(), sender);

        self.credit(&tx.tx.to, tx.tx.value);
        self.credit(beneficiary, tx.reward());
        Ok(())
    }

    fn credit(&mut self, id: &AccountId, amount: u64) {
        let entry = self.accounts.entry(id.clone()).or_insert(Account {
            account_id: id.clone(),
            balance: 0,
            nonce: 0,
        });
        entry.balance = entry.balance.saturating_add(amount);
    }
}
