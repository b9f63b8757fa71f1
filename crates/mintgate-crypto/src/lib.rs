pub mod cosign;
pub mod hash;
pub mod keypair;
pub mod merkle;

pub use cosign::{cosign_digest, recover_cosigner, signed_message_hash, CosignError};
pub use hash::{address_from_pubkey, keccak256};
pub use keypair::CosignerKeyPair;
pub use merkle::{leaf_hash, verify_proof, MerkleTree};
