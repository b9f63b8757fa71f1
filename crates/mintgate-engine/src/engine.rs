use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use mintgate_core::constants::COSIGN_FRESHNESS_SECS;
use mintgate_core::error::EngineError;
use mintgate_core::event::EngineEvent;
use mintgate_core::stage::{stage_for_timestamp, validate_neighbours, validate_schedule, Stage};
use mintgate_core::types::{Address, Bytes32, Timestamp, TokenId, Value};
use mintgate_crypto::cosign::{cosign_digest, recover_cosigner};
use mintgate_crypto::merkle::verify_proof;

use crate::db::{EngineConfig, MintDb};
use crate::guard::ReentrancyGuard;
use crate::ledger::TokenLedger;
use crate::metadata::compose_token_uri;
use crate::outlet::ValueOutlet;

// ── Inputs and outputs ───────────────────────────────────────────────────────

/// Construction parameters, fixed by the deploying host.
#[derive(Clone, Debug)]
pub struct EngineParams {
    pub engine_address: Address,
    pub owner: Address,
    pub name: String,
    pub symbol: String,
    pub base_uri: String,
    pub max_mintable_supply: u32,
    pub global_wallet_limit: u32,
    pub cosigner: Option<Address>,
}

/// One user mint attempt as submitted by the host.
#[derive(Clone, Debug)]
pub struct MintRequest {
    pub caller: Address,
    /// Native value accompanying the call.
    pub value: Value,
    pub quantity: u32,
    /// Allowlist proof; ignored for public stages.
    pub proof: Vec<Bytes32>,
    /// Cosigned timestamp; ignored when no cosigner is configured.
    pub timestamp: Timestamp,
    /// 65-byte cosign signature; ignored when no cosigner is configured.
    pub signature: Vec<u8>,
}

/// What a successful mint did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintReceipt {
    pub first_token_id: TokenId,
    pub quantity: u32,
    /// Stage the mint was accounted against; None for owner mints.
    pub stage: Option<u32>,
    pub cost: Value,
    pub refund: Value,
}

/// Read-side view of one stage plus the caller's accounting in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageInfo {
    pub stage: Stage,
    pub wallet_minted: u32,
    pub stage_minted: u32,
}

// ── MintEngine ───────────────────────────────────────────────────────────────

/// The mint authorization and accounting state machine.
///
/// Every mutating call is transactional: all checks and external transfers
/// run before any engine state is committed, so an error at any point leaves
/// the store exactly as it was. The reentrancy latch is held across the
/// value transfers that hand control to external code.
pub struct MintEngine {
    db: Arc<MintDb>,
    ledger: Arc<dyn TokenLedger>,
    outlet: Arc<dyn ValueOutlet>,
    guard: ReentrancyGuard,
    events: Mutex<Vec<EngineEvent>>,
}

impl MintEngine {
    /// Initialise a fresh engine. Fails `GlobalWalletLimitOverflow` if the
    /// per-wallet cap exceeds the supply cap.
    pub fn new(
        db: Arc<MintDb>,
        ledger: Arc<dyn TokenLedger>,
        outlet: Arc<dyn ValueOutlet>,
        params: EngineParams,
    ) -> Result<Self, EngineError> {
        if params.global_wallet_limit > params.max_mintable_supply {
            return Err(EngineError::GlobalWalletLimitOverflow);
        }
        let cfg = EngineConfig {
            engine_address: params.engine_address,
            owner: params.owner,
            name: params.name,
            symbol: params.symbol,
            base_uri: params.base_uri,
            token_uri_suffix: String::new(),
            base_uri_frozen: false,
            mintable: false,
            active_stage: 0,
            cosigner: params.cosigner.filter(|c| !c.is_zero()),
            crossmint_address: None,
            max_mintable_supply: params.max_mintable_supply,
            global_wallet_limit: params.global_wallet_limit,
            total_supply: 0,
            owner_minted: 0,
            held_balance: 0,
            schedule_generation: 0,
        };
        db.put_config(&cfg)?;
        info!(engine = %cfg.engine_address, owner = %cfg.owner, "engine initialised");
        Ok(Self::assemble(db, ledger, outlet))
    }

    /// Reopen an engine over previously persisted state.
    pub fn resume(
        db: Arc<MintDb>,
        ledger: Arc<dyn TokenLedger>,
        outlet: Arc<dyn ValueOutlet>,
    ) -> Result<Self, EngineError> {
        if db.config()?.is_none() {
            return Err(EngineError::Storage(
                "no engine config in this database".into(),
            ));
        }
        Ok(Self::assemble(db, ledger, outlet))
    }

    fn assemble(
        db: Arc<MintDb>,
        ledger: Arc<dyn TokenLedger>,
        outlet: Arc<dyn ValueOutlet>,
    ) -> Self {
        Self {
            db,
            ledger,
            outlet,
            guard: ReentrancyGuard::new(),
            events: Mutex::new(Vec::new()),
        }
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn config(&self) -> Result<EngineConfig, EngineError> {
        self.db
            .config()?
            .ok_or_else(|| EngineError::Storage("engine config missing".into()))
    }

    fn assert_owner(cfg: &EngineConfig, caller: &Address) -> Result<(), EngineError> {
        if *caller != cfg.owner {
            warn!(caller = %caller, "owner-gated call from non-owner");
            return Err(EngineError::Ownable);
        }
        Ok(())
    }

    fn emit(&self, event: EngineEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }

    /// Drain the buffered events emitted since the last call.
    pub fn take_events(&self) -> Vec<EngineEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(|e| e.into_inner()))
    }

    // ── Read surface ─────────────────────────────────────────────────────────

    pub fn owner(&self) -> Result<Address, EngineError> {
        Ok(self.config()?.owner)
    }

    pub fn name(&self) -> Result<String, EngineError> {
        Ok(self.config()?.name)
    }

    pub fn symbol(&self) -> Result<String, EngineError> {
        Ok(self.config()?.symbol)
    }

    pub fn mintable(&self) -> Result<bool, EngineError> {
        Ok(self.config()?.mintable)
    }

    pub fn cosigner(&self) -> Result<Option<Address>, EngineError> {
        Ok(self.config()?.cosigner)
    }

    pub fn crossmint_address(&self) -> Result<Option<Address>, EngineError> {
        Ok(self.config()?.crossmint_address)
    }

    pub fn max_mintable_supply(&self) -> Result<u32, EngineError> {
        Ok(self.config()?.max_mintable_supply)
    }

    pub fn global_wallet_limit(&self) -> Result<u32, EngineError> {
        Ok(self.config()?.global_wallet_limit)
    }

    pub fn total_supply(&self) -> Result<u32, EngineError> {
        Ok(self.config()?.total_supply)
    }

    pub fn owner_minted(&self) -> Result<u32, EngineError> {
        Ok(self.config()?.owner_minted)
    }

    pub fn held_balance(&self) -> Result<Value, EngineError> {
        Ok(self.config()?.held_balance)
    }

    pub fn active_stage(&self) -> Result<u32, EngineError> {
        Ok(self.config()?.active_stage)
    }

    pub fn stage_count(&self) -> u32 {
        self.db.stage_count()
    }

    pub fn stages(&self) -> Result<Vec<Stage>, EngineError> {
        self.db.stages()
    }

    /// One stage plus `wallet`'s accounting in it. Out of range →
    /// `InvalidStage`.
    pub fn get_stage_info(&self, index: u32, wallet: &Address) -> Result<StageInfo, EngineError> {
        let cfg = self.config()?;
        let stages = self.db.stages()?;
        let stage = stages
            .get(index as usize)
            .cloned()
            .ok_or(EngineError::InvalidStage)?;
        Ok(StageInfo {
            stage,
            wallet_minted: self
                .db
                .wallet_minted(cfg.schedule_generation, index, wallet)?,
            stage_minted: self.db.stage_minted(cfg.schedule_generation, index)?,
        })
    }

    /// Token URI for an existing token: `base || decimal(id) || suffix`.
    pub fn token_uri(&self, token_id: TokenId) -> Result<String, EngineError> {
        if !self.ledger.exists(token_id) {
            return Err(EngineError::URIQueryForNonexistentToken(token_id));
        }
        let cfg = self.config()?;
        Ok(compose_token_uri(
            &cfg.base_uri,
            token_id,
            &cfg.token_uri_suffix,
        ))
    }

    // ── Cosign surface ───────────────────────────────────────────────────────

    /// The digest a cosigner must sign for `(minter, quantity, timestamp)`.
    pub fn get_cosign_digest(
        &self,
        minter: &Address,
        quantity: u32,
        timestamp: Timestamp,
    ) -> Result<Bytes32, EngineError> {
        let cfg = self.config()?;
        let cosigner = cfg.cosigner.ok_or(EngineError::CosignerNotSet)?;
        Ok(cosign_digest(
            &cfg.engine_address,
            minter,
            quantity,
            &cosigner,
            timestamp,
        ))
    }

    /// Verify a cosign signature and its freshness against `now`.
    pub fn assert_valid_cosign(
        &self,
        minter: &Address,
        quantity: u32,
        timestamp: Timestamp,
        signature: &[u8],
        now: Timestamp,
    ) -> Result<(), EngineError> {
        let cfg = self.config()?;
        let cosigner = cfg.cosigner.ok_or(EngineError::CosignerNotSet)?;
        Self::verify_cosign(&cfg, cosigner, minter, quantity, timestamp, signature, now)
    }

    fn verify_cosign(
        cfg: &EngineConfig,
        cosigner: Address,
        minter: &Address,
        quantity: u32,
        timestamp: Timestamp,
        signature: &[u8],
        now: Timestamp,
    ) -> Result<(), EngineError> {
        let digest = cosign_digest(&cfg.engine_address, minter, quantity, &cosigner, timestamp);
        let recovered = recover_cosigner(&digest, signature).map_err(|e| {
            warn!(minter = %minter, "cosign rejected: {e}");
            EngineError::InvalidCosignSignature
        })?;
        if recovered != cosigner {
            warn!(minter = %minter, recovered = %recovered, "cosign rejected: wrong signer");
            return Err(EngineError::InvalidCosignSignature);
        }
        if now.abs_diff(timestamp) > COSIGN_FRESHNESS_SECS {
            warn!(timestamp, now, "cosign rejected: timestamp outside freshness window");
            return Err(EngineError::TimestampExpired);
        }
        Ok(())
    }

    // ── Admin surface ────────────────────────────────────────────────────────

    pub fn set_mintable(&self, caller: Address, mintable: bool) -> Result<(), EngineError> {
        let mut cfg = self.config()?;
        Self::assert_owner(&cfg, &caller)?;
        cfg.mintable = mintable;
        self.db.put_config(&cfg)?;
        self.emit(EngineEvent::SetMintable { mintable });
        info!(mintable, "set mintable");
        Ok(())
    }

    /// Atomically replace the stage schedule. Bumping the schedule generation
    /// resets every per-stage and per-wallet counter; the active stage
    /// pointer re-anchors to 0.
    pub fn set_stages(&self, caller: Address, stages: Vec<Stage>) -> Result<(), EngineError> {
        let mut cfg = self.config()?;
        Self::assert_owner(&cfg, &caller)?;
        validate_schedule(&stages)?;

        self.db.replace_stages(&stages)?;
        cfg.schedule_generation += 1;
        cfg.active_stage = 0;
        self.db.put_config(&cfg)?;

        for (index, stage) in stages.iter().enumerate() {
            self.emit(EngineEvent::UpdateStage {
                index: index as u32,
                stage: stage.clone(),
            });
        }
        info!(
            stages = stages.len(),
            generation = cfg.schedule_generation,
            "schedule replaced"
        );
        Ok(())
    }

    /// Update one stage in place. Only the neighbouring gaps are re-checked;
    /// the stage's counters are preserved.
    pub fn update_stage(
        &self,
        caller: Address,
        index: u32,
        stage: Stage,
    ) -> Result<(), EngineError> {
        let cfg = self.config()?;
        Self::assert_owner(&cfg, &caller)?;
        let stages = self.db.stages()?;
        if index as usize >= stages.len() {
            return Err(EngineError::InvalidStage);
        }
        validate_neighbours(&stages, index as usize, &stage)?;
        self.db.put_stage(index, &stage)?;
        self.emit(EngineEvent::UpdateStage {
            index,
            stage: stage.clone(),
        });
        info!(index, "stage updated");
        Ok(())
    }

    pub fn set_active_stage(&self, caller: Address, index: u32) -> Result<(), EngineError> {
        let mut cfg = self.config()?;
        Self::assert_owner(&cfg, &caller)?;
        if index >= self.db.stage_count() {
            return Err(EngineError::InvalidStage);
        }
        cfg.active_stage = index;
        self.db.put_config(&cfg)?;
        Ok(())
    }

    /// Decrease (never increase) the supply cap. Idempotent on equal values.
    pub fn set_max_mintable_supply(&self, caller: Address, supply: u32) -> Result<(), EngineError> {
        let mut cfg = self.config()?;
        Self::assert_owner(&cfg, &caller)?;
        if supply > cfg.max_mintable_supply {
            return Err(EngineError::CannotIncreaseMaxMintableSupply);
        }
        if supply < cfg.total_supply {
            return Err(EngineError::BelowCurrentSupply {
                minted: cfg.total_supply,
            });
        }
        if supply < cfg.global_wallet_limit {
            return Err(EngineError::GlobalWalletLimitOverflow);
        }
        cfg.max_mintable_supply = supply;
        self.db.put_config(&cfg)?;
        info!(supply, "max mintable supply set");
        Ok(())
    }

    pub fn set_global_wallet_limit(&self, caller: Address, limit: u32) -> Result<(), EngineError> {
        let mut cfg = self.config()?;
        Self::assert_owner(&cfg, &caller)?;
        if limit > cfg.max_mintable_supply {
            return Err(EngineError::GlobalWalletLimitOverflow);
        }
        cfg.global_wallet_limit = limit;
        self.db.put_config(&cfg)?;
        Ok(())
    }

    /// Set or clear (zero address) the cosigner.
    pub fn set_cosigner(&self, caller: Address, cosigner: Address) -> Result<(), EngineError> {
        let mut cfg = self.config()?;
        Self::assert_owner(&cfg, &caller)?;
        cfg.cosigner = (!cosigner.is_zero()).then_some(cosigner);
        self.db.put_config(&cfg)?;
        Ok(())
    }

    /// Set or clear (zero address) the third-party payer.
    pub fn set_crossmint_address(&self, caller: Address, addr: Address) -> Result<(), EngineError> {
        let mut cfg = self.config()?;
        Self::assert_owner(&cfg, &caller)?;
        cfg.crossmint_address = (!addr.is_zero()).then_some(addr);
        self.db.put_config(&cfg)?;
        Ok(())
    }

    pub fn set_base_uri(&self, caller: Address, base_uri: String) -> Result<(), EngineError> {
        let mut cfg = self.config()?;
        Self::assert_owner(&cfg, &caller)?;
        if cfg.base_uri_frozen {
            return Err(EngineError::CannotUpdatePermanentBaseURI);
        }
        cfg.base_uri = base_uri;
        self.db.put_config(&cfg)?;
        Ok(())
    }

    pub fn set_token_uri_suffix(&self, caller: Address, suffix: String) -> Result<(), EngineError> {
        let mut cfg = self.config()?;
        Self::assert_owner(&cfg, &caller)?;
        cfg.token_uri_suffix = suffix;
        self.db.put_config(&cfg)?;
        Ok(())
    }

    /// Freeze the base URI forever.
    pub fn set_base_uri_permanent(&self, caller: Address) -> Result<(), EngineError> {
        let mut cfg = self.config()?;
        Self::assert_owner(&cfg, &caller)?;
        cfg.base_uri_frozen = true;
        self.db.put_config(&cfg)?;
        self.emit(EngineEvent::PermanentBaseUri);
        info!("base URI frozen");
        Ok(())
    }

    /// Pay the full held balance out to the owner.
    pub fn withdraw(&self, caller: Address) -> Result<Value, EngineError> {
        let _entered = self.guard.enter()?;
        let mut cfg = self.config()?;
        Self::assert_owner(&cfg, &caller)?;
        let amount = cfg.held_balance;
        self.outlet.pay(&cfg.owner, amount)?;
        cfg.held_balance = 0;
        self.db.put_config(&cfg)?;
        info!(amount, "withdrawn");
        Ok(amount)
    }

    // ── Mint surface ─────────────────────────────────────────────────────────

    /// Direct mint: the caller pays and receives.
    pub fn mint(&self, req: &MintRequest, now: Timestamp) -> Result<MintReceipt, EngineError> {
        let _entered = self.guard.enter()?;
        let cfg = self.config()?;
        self.mint_internal(cfg, req.caller, req.caller, req, now)
    }

    /// Third-party-payer mint: only the configured crossmint principal may
    /// call; all authorization and accounting is keyed by `recipient`.
    pub fn crossmint(
        &self,
        req: &MintRequest,
        recipient: Address,
        now: Timestamp,
    ) -> Result<MintReceipt, EngineError> {
        let _entered = self.guard.enter()?;
        let cfg = self.config()?;
        let crossmint = match cfg.crossmint_address {
            Some(addr) => addr,
            None => {
                warn!("crossmint rejected: no crossmint address configured");
                return Err(EngineError::CrossmintAddressNotSet);
            }
        };
        if req.caller != crossmint {
            warn!(caller = %req.caller, "crossmint rejected: caller is not the crossmint address");
            return Err(EngineError::CrossmintOnly);
        }
        self.mint_internal(cfg, req.caller, recipient, req, now)
    }

    /// Owner mint: bypasses stages, allowlists, cosigner, wallet limits and
    /// the mintable flag. Only the supply cap still applies, and no stage
    /// accounting is touched.
    pub fn owner_mint(
        &self,
        caller: Address,
        recipient: Address,
        quantity: u32,
    ) -> Result<MintReceipt, EngineError> {
        let _entered = self.guard.enter()?;
        let mut cfg = self.config()?;
        Self::assert_owner(&cfg, &caller)?;
        if cfg.total_supply as u64 + quantity as u64 > cfg.max_mintable_supply as u64 {
            warn!(quantity, "owner mint rejected: no supply left");
            return Err(EngineError::NoSupplyLeft);
        }
        let first_token_id = self.ledger.mint_to(&recipient, quantity)?;
        cfg.total_supply += quantity;
        cfg.owner_minted += quantity;
        self.db.put_config(&cfg)?;
        info!(recipient = %recipient, quantity, "owner mint");
        Ok(MintReceipt {
            first_token_id,
            quantity,
            stage: None,
            cost: 0,
            refund: 0,
        })
    }

    /// The gated mint path shared by `mint` and `crossmint`. Check order is
    /// normative; every failure aborts with no state committed.
    fn mint_internal(
        &self,
        mut cfg: EngineConfig,
        caller: Address,
        recipient: Address,
        req: &MintRequest,
        now: Timestamp,
    ) -> Result<MintReceipt, EngineError> {
        if !cfg.mintable {
            warn!(recipient = %recipient, "mint rejected: minting disabled");
            return Err(EngineError::NotMintable);
        }

        // ── Stage selection ──────────────────────────────────────────────────
        let stages = self.db.stages()?;
        let index = match cfg.cosigner {
            Some(cosigner) => {
                // The signed timestamp picks the stage; the gap invariant
                // makes the match unique.
                let index = match stage_for_timestamp(&stages, req.timestamp) {
                    Some(index) => index,
                    None => {
                        warn!(
                            timestamp = req.timestamp,
                            "mint rejected: no stage covers the signed timestamp"
                        );
                        return Err(EngineError::InvalidStage);
                    }
                };
                Self::verify_cosign(
                    &cfg,
                    cosigner,
                    &recipient,
                    req.quantity,
                    req.timestamp,
                    &req.signature,
                    now,
                )?;
                index
            }
            None => {
                let index = cfg.active_stage as usize;
                if index >= stages.len() {
                    warn!(active_stage = cfg.active_stage, "mint rejected: no active stage");
                    return Err(EngineError::InvalidStage);
                }
                index
            }
        };
        let stage = stages[index].clone();

        // ── Allowlist ────────────────────────────────────────────────────────
        if !stage.merkle_root.is_zero()
            && !verify_proof(&stage.merkle_root, &req.proof, &recipient)
        {
            warn!(recipient = %recipient, stage = index, "mint rejected: invalid allowlist proof");
            return Err(EngineError::InvalidProof);
        }

        // ── Value ────────────────────────────────────────────────────────────
        // Saturating: no finite value covers an overflowing cost.
        let cost = stage.price.saturating_mul(req.quantity as Value);
        if req.value < cost {
            warn!(need = cost, got = req.value, "mint rejected: not enough value");
            return Err(EngineError::NotEnoughValue {
                need: cost,
                got: req.value,
            });
        }

        // ── Supply and wallet caps ───────────────────────────────────────────
        if cfg.total_supply as u64 + req.quantity as u64 > cfg.max_mintable_supply as u64 {
            warn!(quantity = req.quantity, "mint rejected: no supply left");
            return Err(EngineError::NoSupplyLeft);
        }
        let generation = cfg.schedule_generation;
        let stage_minted = self.db.stage_minted(generation, index as u32)?;
        if stage.max_stage_supply != 0
            && stage_minted as u64 + req.quantity as u64 > stage.max_stage_supply as u64
        {
            warn!(stage = index, "mint rejected: stage supply exceeded");
            return Err(EngineError::StageSupplyExceeded);
        }
        if cfg.global_wallet_limit != 0
            && self.ledger.balance_of(&recipient) as u64 + req.quantity as u64
                > cfg.global_wallet_limit as u64
        {
            warn!(recipient = %recipient, "mint rejected: global wallet limit exceeded");
            return Err(EngineError::WalletGlobalLimitExceeded);
        }
        let wallet_minted = self.db.wallet_minted(generation, index as u32, &recipient)?;
        if stage.wallet_limit != 0
            && wallet_minted as u64 + req.quantity as u64 > stage.wallet_limit as u64
        {
            warn!(recipient = %recipient, stage = index, "mint rejected: stage wallet limit exceeded");
            return Err(EngineError::WalletStageLimitExceeded);
        }

        // ── External transfers ───────────────────────────────────────────────
        // Refund runs before the ledger mint: both are fatal on failure, and
        // an aborted transaction must leave the ledger untouched. The latch
        // is held here, so a re-entering refund recipient fails cleanly.
        let refund = req.value - cost;
        if refund > 0 {
            self.outlet.pay(&caller, refund)?;
        }
        let first_token_id = self.ledger.mint_to(&recipient, req.quantity)?;

        // ── Commit ───────────────────────────────────────────────────────────
        self.db
            .put_stage_minted(generation, index as u32, stage_minted + req.quantity)?;
        self.db.put_wallet_minted(
            generation,
            index as u32,
            &recipient,
            wallet_minted + req.quantity,
        )?;
        cfg.total_supply += req.quantity;
        cfg.held_balance += cost;
        self.db.put_config(&cfg)?;

        info!(
            recipient = %recipient,
            quantity = req.quantity,
            stage = index,
            cost,
            "minted"
        );
        Ok(MintReceipt {
            first_token_id,
            quantity: req.quantity,
            stage: Some(index as u32),
            cost,
            refund,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
