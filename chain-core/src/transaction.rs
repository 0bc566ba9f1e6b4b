//! Transaction shapes: unsigned, signed, and block-embedded.
//!
//! Field declaration order is the wire contract. The signing digest covers
//! the unsigned fields only; gas terms and the admission timestamp are fixed
//! when a transaction enters the mempool.

use serde::{Deserialize, Serialize};

use crate::crypto::{self, Scalar256, SecretKey};
use crate::types::{AccountId, CoreError};

/// An unsigned transfer as a wallet constructs it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tx {
    pub chain_id: u16,
    pub nonce: u64,
    pub from: AccountId,
    pub to: AccountId,
    pub value: u64,
    pub tip: u64,
    #[serde(with = "base64_data")]
    pub data: Vec<u8>,
}

impl Tx {
    /// The digest a signature commits to.
    pub fn digest(&self) -> Result<[u8; 32], CoreError> {
        crypto::signable_digest(self)
    }

    /// Signs the transaction, stamping `from` with the address derived from
    /// the signing key before the digest is taken.
    pub fn sign(mut self, key: &SecretKey) -> Result<SignedTx, CoreError> {
        self.from = crypto::derive_address(&key.verifying_key());
        let digest = self.digest()?;
        let (v, r, s) = crypto::sign_digest(&digest, key)?;
        Ok(SignedTx { tx: self, v, r, s })
    }
}

/// A transaction plus its recoverable signature.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedTx {
    #[serde(flatten)]
    pub tx: Tx,
    #[serde(with = "decimal_u8")]
    pub v: u8,
    pub r: Scalar256,
    pub s: Scalar256,
}

impl SignedTx {
    /// Recomputes the digest, recovers the signer, and requires it to match
    /// the declared sender and the node's chain id.
    pub fn validate(&self, chain_id: u16) -> Result<(), CoreError> {
        if self.tx.chain_id != chain_id {
            return Err(CoreError::InvalidChain {
                expected: chain_id,
                got: self.tx.chain_id,
            });
        }
        let digest = self.tx.digest()?;
        let signer = crypto::recover_signer(&digest, self.v, &self.r, &self.s)?;
        if signer != self.tx.from {
            return Err(CoreError::InvalidSignature);
        }
        Ok(())
    }
}

/// The mempool and block form: the signed transfer with its gas terms.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockTx {
    #[serde(flatten)]
    pub tx: Tx,
    pub timestamp: u64,
    pub gas_price: u64,
    pub gas_units: u64,
    #[serde(with = "decimal_u8")]
    pub v: u8,
    pub r: Scalar256,
    pub s: Scalar256,
}

impl BlockTx {
    pub fn new(signed: SignedTx, gas_units: u64, gas_price: u64) -> Self {
        BlockTx {
            tx: signed.tx,
            timestamp: chrono::Utc::now().timestamp_millis() as u64,
            gas_price,
            gas_units,
            v: signed.v,
            r: signed.r,
            s: signed.s,
        }
    }

    pub fn signed(&self) -> SignedTx {
        SignedTx {
            tx: self.tx.clone(),
            v: self.v,
            r: self.r,
            s: self.s,
        }
    }

    pub fn validate(&self, chain_id: u16) -> Result<(), CoreError> {
        self.signed().validate(chain_id)
    }

    /// Gas portion of the fee.
    pub fn gas_fee(&self) -> u64 {
        self.gas_price.saturating_mul(self.gas_units)
    }

    /// What the block beneficiary earns from this transaction.
    pub fn reward(&self) -> u64 {
        self.tx.tip.saturating_add(self.gas_fee())
    }

    /// Total debit against the sender.
    pub fn cost(&self) -> u64 {
        self.tx.value.saturating_add(self.reward())
    }
}

mod base64_data {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

mod decimal_u8 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u8, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
