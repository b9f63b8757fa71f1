//! mintgate-engine
//!
//! The gated, staged, capped mint state machine: stage schedule enforcement,
//! per-wallet and per-stage accounting, allowlist and cosign verification,
//! owner-privileged mutations and the reentrancy-safe mint entry points.
//! Token ownership itself lives behind the [`ledger::TokenLedger`] seam;
//! outbound native value flows through [`outlet::ValueOutlet`].

pub mod db;
pub mod engine;
pub mod guard;
pub mod ledger;
pub mod metadata;
pub mod outlet;

pub use db::{EngineConfig, MintDb};
pub use engine::{EngineParams, MintEngine, MintReceipt, MintRequest, StageInfo};
pub use guard::ReentrancyGuard;
pub use ledger::{InMemoryLedger, TokenLedger};
pub use outlet::{InMemoryOutlet, ValueOutlet};
