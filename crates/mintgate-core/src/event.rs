use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// Events emitted by owner mutations. The engine buffers them in-process for
/// hosts that relay events outward; the underlying ledger emits its own
/// transfer event per minted token.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum EngineEvent {
    SetMintable { mintable: bool },
    UpdateStage { index: u32, stage: Stage },
    PermanentBaseUri,
}
