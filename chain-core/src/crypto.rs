//! Hashing, signing, and address derivation.
//!
//! Signatures are recoverable secp256k1 ECDSA: the signer's address is
//! reconstructed from the signature itself, which is what authenticates a
//! submitted transaction. Every digest is keccak-256 over the signed-message
//! stamp and the canonical JSON of the value being signed, so signatures
//! cannot be replayed as raw secp256k1 signatures of another protocol.

use std::fmt;

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use num_bigint::BigUint;
use rand::rngs::OsRng;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::types::{AccountId, CoreError};

pub type SecretKey = SigningKey;
pub type PublicKey = VerifyingKey;

/// Prefix mixed into every signing digest.
const SIGN_STAMP: &str = "\x19Signed Message:\n";

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// The digest a wallet signs: `keccak256(stamp || len(json) || json)` where
/// `json` is the canonical JSON of `value`.
pub fn signable_digest<T: Serialize>(value: &T) -> Result<[u8; 32], CoreError> {
    let json = serde_json::to_vec(value)?;
    let mut hasher = Keccak256::new();
    hasher.update(format!("{SIGN_STAMP}{}", json.len()).as_bytes());
    hasher.update(&json);
    Ok(hasher.finalize().into())
}

pub fn generate_keypair() -> (PublicKey, SecretKey) {
    let secret = SigningKey::random(&mut OsRng);
    let public = *secret.verifying_key();
    (public, secret)
}

/// Parses a 32-byte secret key from hex. `None` when the bytes do not form a
/// valid secp256k1 scalar.
pub fn secret_key_from_hex(hex_key: &str) -> Option<SecretKey> {
    let bytes = hex::decode(hex_key).ok()?;
    SigningKey::from_slice(&bytes).ok()
}

/// Signs a 32-byte digest, returning the recovery id and the `r`/`s` scalars.
pub fn sign_digest(digest: &[u8; 32], key: &SecretKey) -> Result<(u8, Scalar256, Scalar256), CoreError> {
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(digest)
        .map_err(|_| CoreError::InvalidSignature)?;
    let (r_bytes, s_bytes) = signature.split_bytes();
    Ok((
        recovery_id.to_byte(),
        Scalar256(r_bytes.into()),
        Scalar256(s_bytes.into()),
    ))
}

/// Recovers the signing address from a digest and an `(v, r, s)` signature.
///
/// Rejects malformed scalars and non-canonical (high) `s` values.
pub fn recover_signer(
    digest: &[u8; 32],
    v: u8,
    r: &Scalar256,
    s: &Scalar256,
) -> Result<AccountId, CoreError> {
    let recovery_id = RecoveryId::from_byte(v).ok_or(CoreError::InvalidSignature)?;
    let signature =
        Signature::from_scalars(r.0, s.0).map_err(|_| CoreError::InvalidSignature)?;
    if signature.normalize_s().is_some() {
        return Err(CoreError::InvalidSignature);
    }
    let key = VerifyingKey::recover_from_prehash(digest, &signature, recovery_id)
        .map_err(|_| CoreError::InvalidSignature)?;
    Ok(derive_address(&key))
}

/// Derives the account address from a public key: keccak-256 of the 64-byte
/// uncompressed point, last 20 bytes, checksum-cased.
pub fn derive_address(key: &PublicKey) -> AccountId {
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    let lower = hex::encode(&digest[12..]);
    let case_hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        let byte = case_hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if ch.is_ascii_alphabetic() && nibble >= 8 {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
    }
    AccountId::new_unchecked(out)
}

/// A 256-bit unsigned scalar, big-endian. On the wire it is a decimal
/// big-integer string, matching the signature fields of the block format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scalar256(pub [u8; 32]);

impl fmt::Display for Scalar256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&BigUint::from_bytes_be(&self.0).to_str_radix(10))
    }
}

impl Serialize for Scalar256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Scalar256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let value = BigUint::parse_bytes(text.as_bytes(), 10)
            .ok_or_else(|| D::Error::custom("expected a decimal integer string"))?;
        let bytes = value.to_bytes_be();
        if bytes.len() > 32 {
            return Err(D::Error::custom("scalar wider than 256 bits"));
        }
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(&bytes);
        Ok(Scalar256(out))
    }
}
