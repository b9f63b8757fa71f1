use k256::ecdsa::SigningKey;
use rand::RngCore;
use zeroize::Zeroizing;

use mintgate_core::types::{Address, Bytes32};

use crate::cosign::{signed_message_hash, CosignError};
use crate::hash::address_from_pubkey;

/// A cosigner keypair: secp256k1 signing key with its derived 20-byte
/// address. Used by off-chain cosign services and tests; the engine itself
/// only ever sees the address.
pub struct CosignerKeyPair {
    pub address: Address,
    signing_key: SigningKey,
}

impl CosignerKeyPair {
    /// Generate a fresh keypair from OS randomness.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; 32]);
        loop {
            rand::thread_rng().fill_bytes(&mut *bytes);
            // Rejects the zero scalar and values ≥ the curve order.
            if let Ok(key) = SigningKey::from_slice(&*bytes) {
                return Self::from_signing_key(key);
            }
        }
    }

    /// Restore a keypair from raw 32-byte secret scalar bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CosignError> {
        let key = SigningKey::from_slice(bytes).map_err(|_| CosignError::InvalidSecretKey)?;
        Ok(Self::from_signing_key(key))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = address_from_pubkey(signing_key.verifying_key());
        Self {
            address,
            signing_key,
        }
    }

    /// Sign a cosign digest per the prefixed-message convention, returning
    /// the 65-byte `r || s || v` wire form with `v` in {27, 28}.
    pub fn sign_cosign(&self, digest: &Bytes32) -> Vec<u8> {
        let prehash = signed_message_hash(digest);
        let (sig, recovery) = self
            .signing_key
            .sign_prehash_recoverable(prehash.as_bytes())
            .expect("signing with a valid secret key is infallible");
        let mut out = Vec::with_capacity(65);
        out.extend_from_slice(&sig.to_bytes());
        out.push(27 + recovery.to_byte());
        out
    }
}

impl std::fmt::Debug for CosignerKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CosignerKeyPair {{ address: {:?} }}", self.address)
    }
}
