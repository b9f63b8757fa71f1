/// ─── Mintgate Protocol Constants ────────────────────────────────────────────
///
/// A gated, staged, capped minting engine for a deterministic transactional
/// ledger. Stage windows never touch: the schedule keeps a minimum gap so a
/// signed timestamp always selects at most one stage.

// ── Stage schedule ───────────────────────────────────────────────────────────

/// Minimum gap between the end of one stage and the start of the next
/// (seconds). Guarantees a timestamp selects a unique stage.
pub const MIN_STAGE_GAP_SECS: u64 = 60;

// ── Cosign ───────────────────────────────────────────────────────────────────

/// Maximum age of a cosigned timestamp, in either direction (seconds).
pub const COSIGN_FRESHNESS_SECS: u64 = 60;

/// Prefix of the signed-message convention: the cosigner signs
/// keccak256(PREFIX || digest), never the raw digest.
pub const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Cosign digest preimage layout:
///   engine (20) || minter (20) || quantity (4, BE) || cosigner (20) || timestamp (8, BE)
pub const COSIGN_PREIMAGE_LEN: usize = 72;

/// Cosign signatures are fixed-width `r || s || v`.
pub const COSIGN_SIGNATURE_LEN: usize = 65;
