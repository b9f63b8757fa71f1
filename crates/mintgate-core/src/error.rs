use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    // ── Authorization ────────────────────────────────────────────────────────
    #[error("Ownable: caller is not the owner")]
    Ownable,

    #[error("ReentrancyGuard: reentrant call")]
    Reentrancy,

    // ── Mint gating ──────────────────────────────────────────────────────────
    #[error("minting is disabled")]
    NotMintable,

    #[error("no stage active for this mint")]
    InvalidStage,

    #[error("insufficient value: need {need}, got {got}")]
    NotEnoughValue { need: u128, got: u128 },

    // ── Supply and wallet caps ───────────────────────────────────────────────
    #[error("no mintable supply left")]
    NoSupplyLeft,

    #[error("stage supply exceeded")]
    StageSupplyExceeded,

    #[error("per-wallet stage limit exceeded")]
    WalletStageLimitExceeded,

    #[error("global wallet limit exceeded")]
    WalletGlobalLimitExceeded,

    #[error("global wallet limit cannot exceed max mintable supply")]
    GlobalWalletLimitOverflow,

    #[error("max mintable supply cannot be increased")]
    CannotIncreaseMaxMintableSupply,

    #[error("max mintable supply cannot shrink below minted supply ({minted})")]
    BelowCurrentSupply { minted: u32 },

    // ── Stage schedule ───────────────────────────────────────────────────────
    #[error("stage start timestamp must precede end timestamp")]
    InvalidStartAndEndTimestamp,

    #[error("adjacent stages must be at least {min_gap_secs} seconds apart")]
    InsufficientStageTimeGap { min_gap_secs: u64 },

    // ── Allowlist ────────────────────────────────────────────────────────────
    #[error("invalid allowlist proof")]
    InvalidProof,

    // ── Cosign ───────────────────────────────────────────────────────────────
    #[error("cosigner not set")]
    CosignerNotSet,

    #[error("invalid cosign signature")]
    InvalidCosignSignature,

    #[error("cosign timestamp expired")]
    TimestampExpired,

    // ── Crossmint ────────────────────────────────────────────────────────────
    #[error("caller is not the crossmint address")]
    CrossmintOnly,

    #[error("crossmint address not set")]
    CrossmintAddressNotSet,

    // ── Metadata ─────────────────────────────────────────────────────────────
    #[error("URI query for nonexistent token {0}")]
    URIQueryForNonexistentToken(u64),

    #[error("base URI is permanent and cannot be updated")]
    CannotUpdatePermanentBaseURI,

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),

    // ── General ──────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}
