//! Allocation-deviation check and threshold-gated rebalancing.
//!
//! Each active holding's share of pool value is measured in basis points and
//! compared to its target. When the largest gap reaches the policy threshold
//! (and the cooldown has elapsed), every holding that is itself out of band
//! has its recorded balance snapped to `total_value * target / 10000`.
//! Holdings inside the band are left alone, and the pool's total value is
//! then re-derived from the holdings.

use log::info;

use crate::error::{PoolError, Result, mul_div_floor};
use crate::holding::{Holding, HoldingRegistry};
use crate::oracle::ValueOracle;
use crate::state::PoolState;
use crate::types::{Amount, BPS_SCALE, BlockHeight, Bps, HoldingId};

/// Blocks that must pass between two rebalances.
pub const DEFAULT_COOLDOWN_BLOCKS: BlockHeight = 144;

/// Minimum max-deviation (bp) that triggers a rebalance.
pub const DEFAULT_THRESHOLD_BPS: Bps = 200;

/// Rebalance gating policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalancePolicy {
    pub cooldown_blocks: BlockHeight,
    pub threshold_bps: Bps,
}

impl Default for RebalancePolicy {
    fn default() -> Self {
        Self {
            cooldown_blocks: DEFAULT_COOLDOWN_BLOCKS,
            threshold_bps: DEFAULT_THRESHOLD_BPS,
        }
    }
}

/// A holding rewritten by a rebalance.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SnapRecord {
    pub id: HoldingId,
    /// Deviation (bp) that put the holding out of band
    pub deviation_bps: Bps,
    pub previous_balance: Amount,
    pub new_balance: Amount,
}

/// Outcome of a triggered rebalance.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalanceResult {
    /// Always true: a rebalance that passes its gates visits every holding
    pub triggered: bool,
    pub block: BlockHeight,
    pub max_deviation_bps: Bps,
    /// Holdings that were snapped to target, in id order
    pub snapped: Vec<SnapRecord>,
    pub previous_total_value: Amount,
    pub total_value: Amount,
}

impl RebalanceResult {
    /// Returns true if the holding was snapped.
    pub fn was_snapped(&self, id: HoldingId) -> bool {
        self.snapped.iter().any(|s| s.id == id)
    }
}

/// Current share of `total_value` held by `value`, in basis points (floored).
///
/// Zero when the pool is empty. Saturates instead of overflowing.
#[inline]
pub fn current_bps(value: Amount, total_value: Amount) -> Amount {
    if total_value == 0 {
        return 0;
    }
    value
        .checked_mul(BPS_SCALE as Amount)
        .map_or(Amount::MAX, |n| n / total_value)
}

/// Absolute gap between a holding's actual share and its target, in bp.
pub fn deviation<O: ValueOracle + ?Sized>(
    holding: &Holding,
    total_value: Amount,
    oracle: &O,
) -> Bps {
    let current = current_bps(oracle.value_of(holding), total_value);
    let gap = current.abs_diff(holding.target_bps as Amount);
    Bps::try_from(gap).unwrap_or(Bps::MAX)
}

/// Largest deviation across active holdings; 0 when none are active.
pub fn max_deviation<O: ValueOracle + ?Sized>(
    registry: &HoldingRegistry,
    total_value: Amount,
    oracle: &O,
) -> Bps {
    registry
        .active()
        .map(|h| deviation(h, total_value, oracle))
        .fold(0, Bps::max)
}

/// Value a holding should carry at its target allocation.
#[inline]
pub fn target_value(total_value: Amount, target_bps: Bps) -> Result<Amount> {
    mul_div_floor(total_value, target_bps as Amount, BPS_SCALE as Amount)
}

/// Applies the rebalance policy to a registry and pool state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebalanceEngine {
    policy: RebalancePolicy,
}

impl RebalanceEngine {
    pub fn new(policy: RebalancePolicy) -> Self {
        Self { policy }
    }

    #[inline]
    pub fn policy(&self) -> &RebalancePolicy {
        &self.policy
    }

    /// Blocks left before a rebalance is allowed at `current_block`.
    pub fn blocks_until_eligible(&self, state: &PoolState, current_block: BlockHeight) -> BlockHeight {
        let elapsed = current_block.saturating_sub(state.last_rebalance_block);
        self.policy.cooldown_blocks.saturating_sub(elapsed)
    }

    /// Run the gated rebalance at `current_block`.
    ///
    /// Gates, in order: pause flag, cooldown, threshold. Once they pass, the
    /// fold visits every active holding against the pre-rebalance total, the
    /// total is re-derived through the oracle, and `last_rebalance_block`
    /// advances. The new registry is built aside and swapped in only when
    /// every step succeeds.
    pub fn rebalance<O: ValueOracle + ?Sized>(
        &self,
        registry: &mut HoldingRegistry,
        state: &mut PoolState,
        oracle: &O,
        current_block: BlockHeight,
    ) -> Result<RebalanceResult> {
        if state.paused {
            return Err(PoolError::Paused);
        }

        let elapsed = current_block.saturating_sub(state.last_rebalance_block);
        if elapsed < self.policy.cooldown_blocks {
            return Err(PoolError::RebalanceCooldown {
                elapsed,
                required: self.policy.cooldown_blocks,
            });
        }

        let total_value = state.total_value;
        let max_deviation_bps = max_deviation(registry, total_value, oracle);
        if max_deviation_bps < self.policy.threshold_bps {
            return Err(PoolError::RebalanceThreshold {
                max_deviation: max_deviation_bps,
                threshold: self.policy.threshold_bps,
            });
        }

        let mut next = registry.clone();
        let mut snapped = Vec::new();
        for holding in next.active_mut() {
            let dev = deviation(holding, total_value, oracle);
            if dev < self.policy.threshold_bps {
                continue;
            }
            let new_balance = target_value(total_value, holding.target_bps)?;
            snapped.push(SnapRecord {
                id: holding.id,
                deviation_bps: dev,
                previous_balance: holding.recorded_balance,
                new_balance,
            });
            holding.recorded_balance = new_balance;
        }

        let new_total = next
            .active()
            .try_fold(0 as Amount, |acc, h| acc.checked_add(oracle.value_of(h)))
            .ok_or(PoolError::Overflow)?;

        *registry = next;
        state.total_value = new_total;
        state.last_rebalance_block = current_block;

        info!(
            "rebalance at block {current_block}: max_deviation={max_deviation_bps}bp snapped={} total_value {total_value} -> {new_total}",
            snapped.len()
        );

        Ok(RebalanceResult {
            triggered: true,
            block: current_block,
            max_deviation_bps,
            snapped,
            previous_total_value: total_value,
            total_value: new_total,
        })
    }
}
