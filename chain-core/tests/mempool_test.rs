use chain_core::{AccountId, BlockTx, CoreError, Mempool, Scalar256, SelectStrategy, Tx};

fn mk_addr(n: u8) -> AccountId {
    format!("0x{}", hex::encode([n; 20])).parse().unwrap()
}

fn mk_tx(from: u8, nonce: u64, tip: u64) -> BlockTx {
    BlockTx {
        tx: Tx {
            chain_id: 1,
            nonce,
            from: mk_addr(from),
            to: mk_addr(200),
            value: 10,
            tip,
            data: Vec::new(),
        },
        timestamp: 1,
        gas_price: 1,
        gas_units: 1,
        v: 0,
        r: Scalar256([0u8; 32]),
        s: Scalar256([0u8; 32]),
    }
}

#[test]
fn replacement_requires_strictly_greater_tip() {
    let mut pool = Mempool::new();
    pool.upsert(mk_tx(1, 0, 5)).unwrap();

    let err = pool.upsert(mk_tx(1, 0, 4)).unwrap_err();
    assert!(matches!(err, CoreError::InvalidNonce));

    let snapshot = pool.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].tx.tip, 5);
}

#[test]
fn equal_tip_does_not_replace() {
    let mut pool = Mempool::new();
    pool.upsert(mk_tx(1, 0, 5)).unwrap();
    assert!(pool.upsert(mk_tx(1, 0, 5)).is_err());
    assert_eq!(pool.len(), 1);
}

#[test]
fn greater_tip_replaces() {
    let mut pool = Mempool::new();
    pool.upsert(mk_tx(1, 0, 5)).unwrap();
    let count = pool.upsert(mk_tx(1, 0, 6)).unwrap();

    assert_eq!(count, 1);
    assert_eq!(pool.snapshot()[0].tx.tip, 6);
}

#[test]
fn distinct_nonces_coexist() {
    let mut pool = Mempool::new();
    pool.upsert(mk_tx(1, 0, 5)).unwrap();
    pool.upsert(mk_tx(1, 1, 5)).unwrap();
    assert_eq!(pool.len(), 2);
}

#[test]
fn tip_strategy_orders_by_miner_reward() {
    let mut pool = Mempool::new();
    pool.upsert(mk_tx(1, 0, 1)).unwrap();
    pool.upsert(mk_tx(2, 0, 9)).unwrap();
    pool.upsert(mk_tx(3, 0, 5)).unwrap();

    let picked = pool.select(SelectStrategy::Tip, 10);
    let tips: Vec<u64> = picked.iter().map(|tx| tx.tx.tip).collect();
    assert_eq!(tips, vec![9, 5, 1]);
}

#[test]
fn tip_strategy_keeps_sender_nonce_order() {
    let mut pool = Mempool::new();
    // sender 1: low-tip nonce 0 ahead of high-tip nonce 1
    pool.upsert(mk_tx(1, 0, 1)).unwrap();
    pool.upsert(mk_tx(1, 1, 50)).unwrap();
    pool.upsert(mk_tx(2, 0, 10)).unwrap();

    let picked = pool.select(SelectStrategy::Tip, 10);
    let sender1: Vec<u64> = picked
        .iter()
        .filter(|tx| tx.tx.from == mk_addr(1))
        .map(|tx| tx.tx.nonce)
        .collect();
    assert_eq!(sender1, vec![0, 1]);
    // the other sender's richer head goes first overall
    assert_eq!(picked[0].tx.from, mk_addr(2));
}

#[test]
fn fifo_strategy_uses_arrival_order() {
    let mut pool = Mempool::new();
    pool.upsert(mk_tx(2, 0, 1)).unwrap();
    pool.upsert(mk_tx(1, 0, 99)).unwrap();

    let picked = pool.select(SelectStrategy::Fifo, 10);
    assert_eq!(picked[0].tx.from, mk_addr(2));
    assert_eq!(picked[1].tx.from, mk_addr(1));
}

#[test]
fn fifo_strategy_keeps_sender_nonce_order() {
    let mut pool = Mempool::new();
    // nonce 1 arrives before nonce 0 for the same sender
    pool.upsert(mk_tx(1, 1, 5)).unwrap();
    pool.upsert(mk_tx(1, 0, 5)).unwrap();

    let picked = pool.select(SelectStrategy::Fifo, 10);
    let nonces: Vec<u64> = picked.iter().map(|tx| tx.tx.nonce).collect();
    assert_eq!(nonces, vec![0, 1]);
}

#[test]
fn select_respects_max_count() {
    let mut pool = Mempool::new();
    for sender in 1..=5 {
        pool.upsert(mk_tx(sender, 0, sender as u64)).unwrap();
    }
    assert_eq!(pool.select(SelectStrategy::Tip, 3).len(), 3);
    assert_eq!(pool.select(SelectStrategy::Tip, 0).len(), 0);
}

#[test]
fn remove_drops_by_key() {
    let mut pool = Mempool::new();
    let tx = mk_tx(1, 0, 5);
    pool.upsert(tx.clone()).unwrap();
    pool.upsert(mk_tx(1, 1, 5)).unwrap();

    pool.remove(&tx);
    assert_eq!(pool.len(), 1);
    assert_eq!(pool.snapshot()[0].tx.nonce, 1);
}

#[test]
fn truncate_empties_pool() {
    let mut pool = Mempool::new();
    pool.upsert(mk_tx(1, 0, 5)).unwrap();
    pool.truncate();
    assert!(pool.is_empty());
}

#[test]
fn strategy_registry_lookup() {
    assert_eq!(SelectStrategy::from_name("tip"), Some(SelectStrategy::Tip));
    assert_eq!(
        SelectStrategy::from_name("fifo"),
        Some(SelectStrategy::Fifo)
    );
    assert_eq!(SelectStrategy::from_name("lifo"), None);
}
