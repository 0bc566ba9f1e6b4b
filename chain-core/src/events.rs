//! Coordinator event reporting over a bounded broadcast queue.

use tokio::sync::broadcast;

use crate::types::AccountId;

const DEFAULT_CAPACITY: usize = 256;

/// What the coordinator reports as it works.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainEvent {
    MiningStarted,
    MiningAttempts(u64),
    MiningSolved,
    MiningCancelled,
    BlockApplied { number: u64, hash: String },
    TxAccepted { from: AccountId, nonce: u64 },
    TxRejected(String),
}

/// Bounded multi-subscriber event queue. Slow subscribers lose the oldest
/// events rather than blocking the coordinator.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<ChainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        EventBus { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChainEvent> {
        self.sender.subscribe()
    }

    /// Best-effort publish: an event with no subscribers is dropped.
    pub fn publish(&self, event: ChainEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        EventBus::new(DEFAULT_CAPACITY)
    }
}
