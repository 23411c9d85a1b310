//! Point-in-time pool views for display and reporting.

use crate::state::PoolState;
use crate::types::{Amount, AssetRef, Bps, HoldingId};

/// A holding as seen at snapshot time.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HoldingSnapshot {
    pub id: HoldingId,
    pub asset: AssetRef,
    pub target_bps: Bps,
    pub recorded_balance: Amount,
    pub active: bool,
    /// Oracle value of the holding
    pub value: Amount,
    /// Share of total pool value (bp, floored)
    pub current_bps: Amount,
    pub deviation_bps: Bps,
}

/// A snapshot of the whole pool.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolSnapshot {
    pub state: PoolState,
    /// Every stored holding, in id order
    pub holdings: Vec<HoldingSnapshot>,
    /// Accounts holding a non-zero share balance
    pub accounts: usize,
    pub max_deviation_bps: Bps,
    /// Sum of active targets (need not be 10000)
    pub total_target_bps: u64,
}

impl PoolSnapshot {
    /// Active holdings only.
    pub fn active(&self) -> impl Iterator<Item = &HoldingSnapshot> {
        self.holdings.iter().filter(|h| h.active)
    }

    /// Sum of active holding values.
    pub fn holdings_value(&self) -> Amount {
        self.active().map(|h| h.value).sum()
    }

    /// Value held in the pool but not attributed to any holding.
    ///
    /// Deposits land here until the next rebalance allocates them. Negative
    /// gaps (holdings worth more than the pool total) report as zero.
    pub fn unallocated_value(&self) -> Amount {
        self.state.total_value.saturating_sub(self.holdings_value())
    }

    /// Whether active targets sum to exactly 100%.
    pub fn fully_allocated(&self) -> bool {
        self.total_target_bps == crate::types::BPS_SCALE as u64
    }
}
