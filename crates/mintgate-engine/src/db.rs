use serde::{Deserialize, Serialize};
use std::path::Path;

use mintgate_core::error::EngineError;
use mintgate_core::stage::Stage;
use mintgate_core::types::{Address, Value};

// ── EngineConfig ─────────────────────────────────────────────────────────────

/// The engine's persisted scalar state. Counters that are keyed per stage or
/// per wallet live in their own trees; everything else is one record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The engine's own principal; committed into every cosign digest.
    pub engine_address: Address,
    /// Fixed at construction; gates every admin mutation.
    pub owner: Address,
    pub name: String,
    pub symbol: String,
    pub base_uri: String,
    pub token_uri_suffix: String,
    /// One-way latch; once set the base URI can never change again.
    pub base_uri_frozen: bool,
    pub mintable: bool,
    /// Stage pointer used when no cosigner is configured.
    pub active_stage: u32,
    pub cosigner: Option<Address>,
    /// Only principal allowed to use the third-party-payer entry.
    pub crossmint_address: Option<Address>,
    /// Monotone non-increasing across admin calls.
    pub max_mintable_supply: u32,
    /// 0 disables the global per-wallet cap. Never exceeds the supply cap.
    pub global_wallet_limit: u32,
    pub total_supply: u32,
    pub owner_minted: u32,
    /// Native value accepted and not yet withdrawn.
    pub held_balance: Value,
    /// Bumped on every schedule replacement; counter keys carry it so stale
    /// per-stage accounting can never alias a new schedule.
    pub schedule_generation: u64,
}

// ── MintDb ───────────────────────────────────────────────────────────────────

/// Persistent engine state backed by sled (pure-Rust, no C dependencies).
///
/// Named trees (analogous to column families):
///   meta             — "config"                         → bincode(EngineConfig)
///   stages           — index u32 BE                     → bincode(Stage)
///   stage_counters   — generation u64 BE ++ index u32 BE            → u32 BE
///   wallet_counters  — generation u64 BE ++ index u32 BE ++ address → u32 BE
pub struct MintDb {
    _db: sled::Db,
    meta: sled::Tree,
    stages: sled::Tree,
    stage_counters: sled::Tree,
    wallet_counters: sled::Tree,
}

const CONFIG_KEY: &str = "config";

fn stage_key(index: u32) -> [u8; 4] {
    index.to_be_bytes()
}

fn counter_key(generation: u64, index: u32) -> [u8; 12] {
    let mut key = [0u8; 12];
    key[..8].copy_from_slice(&generation.to_be_bytes());
    key[8..].copy_from_slice(&index.to_be_bytes());
    key
}

fn wallet_key(generation: u64, index: u32, wallet: &Address) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..8].copy_from_slice(&generation.to_be_bytes());
    key[8..12].copy_from_slice(&index.to_be_bytes());
    key[12..].copy_from_slice(wallet.as_bytes());
    key
}

fn decode_count(bytes: &[u8]) -> Result<u32, EngineError> {
    let arr: [u8; 4] = bytes
        .try_into()
        .map_err(|_| EngineError::Serialization("counter must be 4 bytes".into()))?;
    Ok(u32::from_be_bytes(arr))
}

impl MintDb {
    /// Open or create the engine database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let db = sled::open(path).map_err(|e| EngineError::Storage(e.to_string()))?;
        let meta = db.open_tree("meta").map_err(|e| EngineError::Storage(e.to_string()))?;
        let stages = db.open_tree("stages").map_err(|e| EngineError::Storage(e.to_string()))?;
        let stage_counters = db
            .open_tree("stage_counters")
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        let wallet_counters = db
            .open_tree("wallet_counters")
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(Self {
            _db: db,
            meta,
            stages,
            stage_counters,
            wallet_counters,
        })
    }

    // ── Config ───────────────────────────────────────────────────────────────

    pub fn config(&self) -> Result<Option<EngineConfig>, EngineError> {
        match self
            .meta
            .get(CONFIG_KEY)
            .map_err(|e| EngineError::Storage(e.to_string()))?
        {
            Some(bytes) => {
                let cfg = bincode::deserialize(&bytes)
                    .map_err(|e| EngineError::Serialization(e.to_string()))?;
                Ok(Some(cfg))
            }
            None => Ok(None),
        }
    }

    pub fn put_config(&self, cfg: &EngineConfig) -> Result<(), EngineError> {
        let bytes =
            bincode::serialize(cfg).map_err(|e| EngineError::Serialization(e.to_string()))?;
        self.meta
            .insert(CONFIG_KEY, bytes)
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(())
    }

    // ── Stages ───────────────────────────────────────────────────────────────

    /// All stages ordered by index.
    pub fn stages(&self) -> Result<Vec<Stage>, EngineError> {
        let mut out = Vec::new();
        for item in self.stages.iter() {
            let (_, bytes) = item.map_err(|e| EngineError::Storage(e.to_string()))?;
            let stage = bincode::deserialize(&bytes)
                .map_err(|e| EngineError::Serialization(e.to_string()))?;
            out.push(stage);
        }
        Ok(out)
    }

    pub fn put_stage(&self, index: u32, stage: &Stage) -> Result<(), EngineError> {
        let bytes =
            bincode::serialize(stage).map_err(|e| EngineError::Serialization(e.to_string()))?;
        self.stages
            .insert(stage_key(index), bytes)
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Atomically replace the whole schedule.
    pub fn replace_stages(&self, stages: &[Stage]) -> Result<(), EngineError> {
        self.stages
            .clear()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        for (index, stage) in stages.iter().enumerate() {
            self.put_stage(index as u32, stage)?;
        }
        Ok(())
    }

    pub fn stage_count(&self) -> u32 {
        self.stages.len() as u32
    }

    // ── Counters ─────────────────────────────────────────────────────────────

    pub fn stage_minted(&self, generation: u64, index: u32) -> Result<u32, EngineError> {
        match self
            .stage_counters
            .get(counter_key(generation, index))
            .map_err(|e| EngineError::Storage(e.to_string()))?
        {
            Some(bytes) => decode_count(&bytes),
            None => Ok(0),
        }
    }

    pub fn put_stage_minted(
        &self,
        generation: u64,
        index: u32,
        count: u32,
    ) -> Result<(), EngineError> {
        self.stage_counters
            .insert(counter_key(generation, index), count.to_be_bytes().to_vec())
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn wallet_minted(
        &self,
        generation: u64,
        index: u32,
        wallet: &Address,
    ) -> Result<u32, EngineError> {
        match self
            .wallet_counters
            .get(wallet_key(generation, index, wallet))
            .map_err(|e| EngineError::Storage(e.to_string()))?
        {
            Some(bytes) => decode_count(&bytes),
            None => Ok(0),
        }
    }

    pub fn put_wallet_minted(
        &self,
        generation: u64,
        index: u32,
        wallet: &Address,
        count: u32,
    ) -> Result<(), EngineError> {
        self.wallet_counters
            .insert(wallet_key(generation, index, wallet), count.to_be_bytes().to_vec())
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), EngineError> {
        self._db
            .flush()
            .map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(())
    }
}
