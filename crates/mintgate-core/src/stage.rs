//! Stage schedule: ordered sale windows with uniform price and access rules.
//!
//! Two invariants hold over every accepted schedule:
//!   1. each stage satisfies `start_unix < end_unix`;
//!   2. adjacent stages are separated by at least [`MIN_STAGE_GAP_SECS`],
//!      so a signed timestamp selects at most one stage.

use serde::{Deserialize, Serialize};

use crate::constants::MIN_STAGE_GAP_SECS;
use crate::error::EngineError;
use crate::types::{Bytes32, Timestamp, Value};

// ── Stage ────────────────────────────────────────────────────────────────────

/// One timed sale window. Zero-valued `wallet_limit`, `max_stage_supply` and
/// `merkle_root` disable the corresponding check.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stage {
    /// Price per token in the smallest native denomination.
    pub price: Value,
    /// Per-wallet cap within this stage. 0 = uncapped.
    pub wallet_limit: u32,
    /// Allowlist commitment. All-zero = public stage.
    pub merkle_root: Bytes32,
    /// Total mintable within this stage. 0 = uncapped.
    pub max_stage_supply: u32,
    /// Window start (inclusive), Unix seconds.
    pub start_unix: Timestamp,
    /// Window end (inclusive), Unix seconds.
    pub end_unix: Timestamp,
}

impl Stage {
    /// Per-stage invariant: the window must be non-empty.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.start_unix >= self.end_unix {
            return Err(EngineError::InvalidStartAndEndTimestamp);
        }
        Ok(())
    }

    /// Whether `ts` falls inside the stage window `[start, end]`.
    pub fn in_window(&self, ts: Timestamp) -> bool {
        self.start_unix <= ts && ts <= self.end_unix
    }
}

// ── Schedule validation ──────────────────────────────────────────────────────

/// Validate a complete replacement schedule: every stage window is non-empty
/// and every adjacent pair keeps the minimum gap.
pub fn validate_schedule(stages: &[Stage]) -> Result<(), EngineError> {
    for stage in stages {
        stage.validate()?;
    }
    for pair in stages.windows(2) {
        check_gap(&pair[0], &pair[1])?;
    }
    Ok(())
}

/// Validate one updated stage against its surviving neighbours only.
/// `update_stage` never re-checks the rest of the schedule.
pub fn validate_neighbours(
    stages: &[Stage],
    index: usize,
    updated: &Stage,
) -> Result<(), EngineError> {
    updated.validate()?;
    if index > 0 {
        check_gap(&stages[index - 1], updated)?;
    }
    if index + 1 < stages.len() {
        check_gap(updated, &stages[index + 1])?;
    }
    Ok(())
}

fn check_gap(prev: &Stage, next: &Stage) -> Result<(), EngineError> {
    if next.start_unix < prev.end_unix.saturating_add(MIN_STAGE_GAP_SECS) {
        return Err(EngineError::InsufficientStageTimeGap {
            min_gap_secs: MIN_STAGE_GAP_SECS,
        });
    }
    Ok(())
}

/// Select the stage whose window contains `ts`. The gap invariant makes any
/// match unique, so the first hit wins.
pub fn stage_for_timestamp(stages: &[Stage], ts: Timestamp) -> Option<usize> {
    stages.iter().position(|s| s.in_window(ts))
}
