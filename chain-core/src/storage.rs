//! Persistence boundary. The coordinator writes a block before mutating the
//! in-memory ledger, so the stored tip and the live tip agree at every
//! quiescent moment.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::block::BlockData;
use crate::types::CoreError;

/// Behavior required from any block store. Writes must be durable before
/// returning.
pub trait Storage: Send + Sync {
    fn write(&self, block: &BlockData) -> Result<(), CoreError>;
    fn get_block(&self, number: u64) -> Result<Option<BlockData>, CoreError>;
    /// Blocks in chain order; drives ledger rehydration at boot.
    fn iter(&self) -> Box<dyn Iterator<Item = Result<BlockData, CoreError>> + '_>;
    fn reset(&self) -> Result<(), CoreError>;
    fn close(&self) -> Result<(), CoreError>;
}

/// In-memory block store, the default collaborator for tests and ephemeral
/// nodes.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blocks: Mutex<BTreeMap<u64, BlockData>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }
}

impl Storage for MemoryStorage {
    fn write(&self, block: &BlockData) -> Result<(), CoreError> {
        self.blocks.lock().insert(block.block.number, block.clone());
        Ok(())
    }

    fn get_block(&self, number: u64) -> Result<Option<BlockData>, CoreError> {
        Ok(self.blocks.lock().get(&number).cloned())
    }

    fn iter(&self) -> Box<dyn Iterator<Item = Result<BlockData, CoreError>> + '_> {
        let blocks: Vec<BlockData> = self.blocks.lock().values().cloned().collect();
        Box::new(blocks.into_iter().map(Ok))
    }

    fn reset(&self) -> Result<(), CoreError> {
        self.blocks.lock().clear();
        Ok(())
    }

    fn close(&self) -> Result<(), CoreError> {
        Ok(())
    }
}
