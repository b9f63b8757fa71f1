//! Cosign digest construction and signature recovery.
//!
//! The cosigner signs keccak256(PREFIX || digest) where the digest commits to
//! the engine, the minter, the quantity, the cosigner itself and a timestamp.
//! Signatures are 65-byte `r || s || v` with `v` in {27, 28}; high-`s`
//! signatures are rejected as non-canonical.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use thiserror::Error;

use mintgate_core::constants::{
    COSIGN_PREIMAGE_LEN, COSIGN_SIGNATURE_LEN, SIGNED_MESSAGE_PREFIX,
};
use mintgate_core::types::{Address, Bytes32, Timestamp};

use crate::hash::{address_from_pubkey, keccak256};

#[derive(Debug, Error)]
pub enum CosignError {
    #[error("malformed signature bytes")]
    Malformed,

    #[error("non-canonical high-s signature")]
    NonCanonical,

    #[error("signature recovery failed")]
    RecoveryFailed,

    #[error("invalid secret key bytes")]
    InvalidSecretKey,
}

/// Canonical cosign digest:
/// keccak256(engine || minter || quantity_be4 || cosigner || timestamp_be8).
pub fn cosign_digest(
    engine: &Address,
    minter: &Address,
    quantity: u32,
    cosigner: &Address,
    timestamp: Timestamp,
) -> Bytes32 {
    let mut buf = Vec::with_capacity(COSIGN_PREIMAGE_LEN);
    buf.extend_from_slice(engine.as_bytes());
    buf.extend_from_slice(minter.as_bytes());
    buf.extend_from_slice(&quantity.to_be_bytes());
    buf.extend_from_slice(cosigner.as_bytes());
    buf.extend_from_slice(&timestamp.to_be_bytes());
    debug_assert_eq!(buf.len(), COSIGN_PREIMAGE_LEN);
    Bytes32::from_bytes(keccak256(&buf))
}

/// The payload actually signed: keccak256(PREFIX || digest).
pub fn signed_message_hash(digest: &Bytes32) -> Bytes32 {
    let mut buf = Vec::with_capacity(SIGNED_MESSAGE_PREFIX.len() + 32);
    buf.extend_from_slice(SIGNED_MESSAGE_PREFIX);
    buf.extend_from_slice(digest.as_bytes());
    Bytes32::from_bytes(keccak256(&buf))
}

/// Recover the signer address of a 65-byte `r || s || v` signature over
/// the prefixed hash of `digest`.
pub fn recover_cosigner(digest: &Bytes32, signature: &[u8]) -> Result<Address, CosignError> {
    if signature.len() != COSIGN_SIGNATURE_LEN {
        return Err(CosignError::Malformed);
    }
    let sig = Signature::from_slice(&signature[..64]).map_err(|_| CosignError::Malformed)?;
    if sig.normalize_s().is_some() {
        return Err(CosignError::NonCanonical);
    }
    let recovery = match signature[64] {
        v @ (27 | 28) => RecoveryId::from_byte(v - 27).ok_or(CosignError::Malformed)?,
        _ => return Err(CosignError::Malformed),
    };
    let prehash = signed_message_hash(digest);
    let key = VerifyingKey::recover_from_prehash(prehash.as_bytes(), &sig, recovery)
        .map_err(|_| CosignError::RecoveryFailed)?;
    Ok(address_from_pubkey(&key))
}
