//! Pool-wide totals and the pause gate.

use crate::types::{Amount, BlockHeight, Shares};

/// Aggregate pool state shared by the ledger and the rebalance engine.
///
/// `total_value` and `total_shares` move together on deposit and withdraw.
/// Only a rebalance recomputes `total_value` without touching shares.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolState {
    pub total_value: Amount,
    pub total_shares: Shares,
    pub last_rebalance_block: BlockHeight,
    pub paused: bool,
}

impl PoolState {
    pub fn new() -> Self {
        Self::default()
    }

    /// NAV per share as a float, for display. `None` before the first deposit.
    pub fn nav_per_share(&self) -> Option<f64> {
        if self.total_shares == 0 {
            return None;
        }
        Some(self.total_value as f64 / self.total_shares as f64)
    }
}
