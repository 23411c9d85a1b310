//! Event log for deterministic replay.
//!
//! Every input to a pool is recorded as an event, rejected ones included.
//! Rejected operations never change state, so replaying the same events on
//! a pool with the same configuration reproduces it exactly.

use crate::error::Result;
use crate::oracle::{RecordedBalance, ValueOracle};
use crate::pool::{Pool, PoolConfig};
use crate::rebalance::RebalanceResult;
use crate::types::{AccountId, Amount, AssetRef, BlockHeight, Bps, HoldingId, Shares};

/// An input operation that can be applied to a pool.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PoolEvent {
    AddHolding {
        caller: AccountId,
        id: HoldingId,
        asset: AssetRef,
        target_bps: Bps,
    },
    SetTargetAllocation {
        caller: AccountId,
        id: HoldingId,
        target_bps: Bps,
    },
    DeactivateHolding {
        caller: AccountId,
        id: HoldingId,
    },
    SetPaused {
        caller: AccountId,
        paused: bool,
    },
    Deposit {
        caller: AccountId,
        amount: Amount,
    },
    Withdraw {
        caller: AccountId,
        shares: Shares,
    },
    Rebalance {
        caller: AccountId,
        block: BlockHeight,
    },
}

impl PoolEvent {
    pub fn deposit(caller: AccountId, amount: Amount) -> Self {
        PoolEvent::Deposit { caller, amount }
    }

    pub fn withdraw(caller: AccountId, shares: Shares) -> Self {
        PoolEvent::Withdraw { caller, shares }
    }

    pub fn rebalance(caller: AccountId, block: BlockHeight) -> Self {
        PoolEvent::Rebalance { caller, block }
    }

    /// The account that issued the operation.
    pub fn caller(&self) -> AccountId {
        match self {
            PoolEvent::AddHolding { caller, .. }
            | PoolEvent::SetTargetAllocation { caller, .. }
            | PoolEvent::DeactivateHolding { caller, .. }
            | PoolEvent::SetPaused { caller, .. }
            | PoolEvent::Deposit { caller, .. }
            | PoolEvent::Withdraw { caller, .. }
            | PoolEvent::Rebalance { caller, .. } => *caller,
        }
    }

    /// Short operation name, used in audit trails.
    pub fn name(&self) -> &'static str {
        match self {
            PoolEvent::AddHolding { .. } => "add_holding",
            PoolEvent::SetTargetAllocation { .. } => "set_target_allocation",
            PoolEvent::DeactivateHolding { .. } => "deactivate_holding",
            PoolEvent::SetPaused { .. } => "set_paused",
            PoolEvent::Deposit { .. } => "deposit",
            PoolEvent::Withdraw { .. } => "withdraw",
            PoolEvent::Rebalance { .. } => "rebalance",
        }
    }
}

/// Result of successfully applying an event.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ApplyOutcome {
    /// Admin operation accepted
    Done,
    /// Shares minted by a deposit
    Issued(Shares),
    /// Value paid by a withdrawal
    Paid(Amount),
    Rebalanced(RebalanceResult),
}

impl<O: ValueOracle> Pool<O> {
    /// Apply a single event to the pool.
    ///
    /// Events applied via this method are recorded in the event log.
    pub fn apply(&mut self, event: &PoolEvent) -> Result<ApplyOutcome> {
        self.events.push(event.clone());

        match event {
            PoolEvent::AddHolding {
                caller,
                id,
                asset,
                target_bps,
            } => self
                .add_holding_internal(*caller, *id, asset.clone(), *target_bps)
                .map(|()| ApplyOutcome::Done),
            PoolEvent::SetTargetAllocation {
                caller,
                id,
                target_bps,
            } => self
                .set_target_allocation_internal(*caller, *id, *target_bps)
                .map(|()| ApplyOutcome::Done),
            PoolEvent::DeactivateHolding { caller, id } => self
                .deactivate_holding_internal(*caller, *id)
                .map(|()| ApplyOutcome::Done),
            PoolEvent::SetPaused { caller, paused } => self
                .set_paused_internal(*caller, *paused)
                .map(|()| ApplyOutcome::Done),
            PoolEvent::Deposit { caller, amount } => self
                .deposit_internal(*caller, *amount)
                .map(ApplyOutcome::Issued),
            PoolEvent::Withdraw { caller, shares } => self
                .withdraw_internal(*caller, *shares)
                .map(ApplyOutcome::Paid),
            PoolEvent::Rebalance { caller, block } => self
                .rebalance_internal(*caller, *block)
                .map(ApplyOutcome::Rebalanced),
        }
    }

    /// Apply events in order, returning each outcome.
    pub fn apply_all(&mut self, events: &[PoolEvent]) -> Vec<Result<ApplyOutcome>> {
        events.iter().map(|e| self.apply(e)).collect()
    }

    /// Rebuild a pool from an event log with a custom oracle.
    pub fn replay_with_oracle(config: PoolConfig, oracle: O, events: &[PoolEvent]) -> Self {
        let mut pool = Self::with_oracle(config, oracle);
        for event in events {
            // Rejections are part of the log and leave no trace in state
            let _ = pool.apply(event);
        }
        pool
    }

    /// Get all recorded events.
    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    /// Clear the event log.
    ///
    /// Useful after persisting events to external storage.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl Pool<RecordedBalance> {
    /// Rebuild a pool from an event log.
    ///
    /// The result has the same holdings, balances, totals and event log as
    /// the pool that recorded the events.
    pub fn replay(config: PoolConfig, events: &[PoolEvent]) -> Self {
        Self::replay_with_oracle(config, RecordedBalance, events)
    }
}
