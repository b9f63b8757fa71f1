use k256::ecdsa::VerifyingKey;
use sha3::{Digest, Keccak256};

use mintgate_core::types::Address;

/// Compute keccak-256 of arbitrary bytes → 32-byte array.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Derive the 20-byte address of a secp256k1 public key: the trailing 20
/// bytes of keccak256 over the uncompressed point without its 0x04 tag.
pub fn address_from_pubkey(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&digest[12..]);
    Address::from_bytes(addr)
}
