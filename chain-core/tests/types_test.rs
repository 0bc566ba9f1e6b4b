use chain_core::{AccountId, ZERO_HASH};

#[test]
fn zero_hash_shape() {
    assert_eq!(ZERO_HASH.len(), 66);
    assert!(ZERO_HASH.starts_with("0x"));
    assert!(ZERO_HASH[2..].bytes().all(|b| b == b'0'));
}

#[test]
fn account_id_parses_valid_addresses() {
    let addr = "0xdd6B972ffcc631a62CAE1BB9d80b7ff429c8ebA4";
    let id: AccountId = addr.parse().unwrap();
    assert_eq!(id.as_str(), addr);
    assert_eq!(id.to_string(), addr);
}

#[test]
fn account_id_rejects_bad_shapes() {
    assert!("dd6B972ffcc631a62CAE1BB9d80b7ff429c8ebA4"
        .parse::<AccountId>()
        .is_err());
    assert!("0x1234".parse::<AccountId>().is_err());
    assert!("0xzz6B972ffcc631a62CAE1BB9d80b7ff429c8ebA4"
        .parse::<AccountId>()
        .is_err());
    assert!("0xdd6B972ffcc631a62CAE1BB9d80b7ff429c8ebA4ff"
        .parse::<AccountId>()
        .is_err());
}

#[test]
fn account_id_zero_is_valid() {
    let zero = AccountId::zero();
    assert_eq!(zero.as_str().len(), 42);
    assert!(zero.as_str().parse::<AccountId>().is_ok());
}

#[test]
fn account_id_orders_lexicographically() {
    let a: AccountId = format!("0x{}", "1".repeat(40)).parse().unwrap();
    let b: AccountId = format!("0x{}", "2".repeat(40)).parse().unwrap();
    assert!(a < b);
}

#[test]
fn account_id_serde_is_transparent() {
    let addr = "0xdd6B972ffcc631a62CAE1BB9d80b7ff429c8ebA4";
    let id: AccountId = addr.parse().unwrap();
    assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{addr}\""));

    let back: AccountId = serde_json::from_str(&format!("\"{addr}\"")).unwrap();
    assert_eq!(back, id);
}
