use chain_core::{
    derive_address, generate_keypair, AccountId, BlockTx, CoreError, Scalar256, SignedTx, Tx,
};

fn mk_addr(n: u8) -> AccountId {
    format!("0x{}", hex::encode([n; 20])).parse().unwrap()
}

fn mk_tx(nonce: u64) -> Tx {
    Tx {
        chain_id: 1,
        nonce,
        from: mk_addr(1),
        to: mk_addr(2),
        value: 100,
        tip: 5,
        data: Vec::new(),
    }
}

#[test]
fn sign_stamps_sender_from_key() {
    let (public, secret) = generate_keypair();
    let signed = mk_tx(0).sign(&secret).unwrap();
    assert_eq!(signed.tx.from, derive_address(&public));
    signed.validate(1).unwrap();
}

#[test]
fn chain_mismatch_is_rejected() {
    let (_, secret) = generate_keypair();
    let signed = mk_tx(0).sign(&secret).unwrap();
    assert!(matches!(
        signed.validate(2),
        Err(CoreError::InvalidChain {
            expected: 2,
            got: 1
        })
    ));
}

#[test]
fn signed_tx_json_roundtrip() {
    let (_, secret) = generate_keypair();
    let mut tx = mk_tx(3);
    tx.data = b"hello".to_vec();
    let signed = tx.sign(&secret).unwrap();

    let json = serde_json::to_string(&signed).unwrap();
    let back: SignedTx = serde_json::from_str(&json).unwrap();
    assert_eq!(back, signed);
    back.validate(1).unwrap();
}

#[test]
fn data_encodes_as_base64() {
    let (_, secret) = generate_keypair();
    let mut tx = mk_tx(0);
    tx.data = b"hello".to_vec();
    let signed = tx.sign(&secret).unwrap();

    let json = serde_json::to_string(&signed).unwrap();
    assert!(json.contains("\"data\":\"aGVsbG8=\""));
}

#[test]
fn block_tx_wire_field_order() {
    let (_, secret) = generate_keypair();
    let signed = mk_tx(0).sign(&secret).unwrap();
    let block_tx = BlockTx::new(signed, 1, 15);

    let json = serde_json::to_string(&block_tx).unwrap();
    let keys = [
        "\"chain_id\"",
        "\"nonce\"",
        "\"from\"",
        "\"to\"",
        "\"value\"",
        "\"tip\"",
        "\"data\"",
        "\"timestamp\"",
        "\"gas_price\"",
        "\"gas_units\"",
        "\"v\"",
        "\"r\"",
        "\"s\"",
    ];
    let positions: Vec<usize> = keys
        .iter()
        .map(|key| json.find(key).unwrap_or_else(|| panic!("missing {key}")))
        .collect();
    assert!(
        positions.windows(2).all(|w| w[0] < w[1]),
        "field order drifted: {json}"
    );
}

#[test]
fn signature_fields_are_decimal_strings() {
    let (_, secret) = generate_keypair();
    let signed = mk_tx(0).sign(&secret).unwrap();
    let json: serde_json::Value = serde_json::to_value(&signed).unwrap();

    for field in ["v", "r", "s"] {
        let value = json.get(field).unwrap();
        let text = value.as_str().unwrap();
        assert!(
            text.bytes().all(|b| b.is_ascii_digit()),
            "{field} should be a decimal string, got {text}"
        );
    }
}

#[test]
fn block_tx_fee_arithmetic() {
    let tx = BlockTx {
        tx: Tx {
            chain_id: 1,
            nonce: 0,
            from: mk_addr(1),
            to: mk_addr(2),
            value: 100,
            tip: 10,
            data: Vec::new(),
        },
        timestamp: 1,
        gas_price: 3,
        gas_units: 2,
        v: 0,
        r: Scalar256([0u8; 32]),
        s: Scalar256([0u8; 32]),
    };
    assert_eq!(tx.gas_fee(), 6);
    assert_eq!(tx.reward(), 16);
    assert_eq!(tx.cost(), 116);
}

#[test]
fn block_tx_preserves_signature() {
    let (_, secret) = generate_keypair();
    let signed = mk_tx(0).sign(&secret).unwrap();
    let block_tx = BlockTx::new(signed.clone(), 1, 15);

    assert_eq!(block_tx.signed(), signed);
    block_tx.validate(1).unwrap();
}

#[test]
fn block_tx_json_roundtrip() {
    let (_, secret) = generate_keypair();
    let signed = mk_tx(7).sign(&secret).unwrap();
    let block_tx = BlockTx::new(signed, 1, 15);

    let json = serde_json::to_string(&block_tx).unwrap();
    let back: BlockTx = serde_json::from_str(&json).unwrap();
    assert_eq!(back, block_tx);
}
