//! Pool: the context object that owns all fund state.
//!
//! A [`Pool`] bundles the holding registry, share ledger, pool totals, the
//! rebalance engine and the value oracle. Every operation takes `&mut self`
//! and validates before it writes, so each call is one indivisible step
//! over the whole state. Share it across threads with
//! [`SharedPool`](crate::SharedPool).

use log::{debug, info};

#[cfg(feature = "event-log")]
use crate::event::PoolEvent;
use crate::{
    error::{PoolError, Result},
    holding::{Holding, HoldingRegistry},
    ledger::ShareLedger,
    oracle::{RecordedBalance, ValueOracle},
    rebalance::{self, RebalanceEngine, RebalancePolicy, RebalanceResult},
    snapshot::{HoldingSnapshot, PoolSnapshot},
    state::PoolState,
    types::{AccountId, Amount, AssetRef, BlockHeight, Bps, HoldingId, Shares},
};

/// Static pool configuration: who administers it and how it rebalances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    pub admin: AccountId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub policy: RebalancePolicy,
}

impl PoolConfig {
    pub fn new(admin: AccountId) -> Self {
        Self {
            admin,
            policy: RebalancePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RebalancePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// A pooled fund: holdings, share balances, totals and the pause gate.
///
/// With the `event-log` feature every public operation is appended to an
/// in-memory log, rejected ones included, and the log is never trimmed on
/// its own. Long-lived pools should persist and clear it periodically
/// (`flush_events` with the `persistence` feature, or `events` followed by
/// `clear_events`).
#[derive(Clone, Debug)]
pub struct Pool<O: ValueOracle = RecordedBalance> {
    admin: AccountId,
    registry: HoldingRegistry,
    ledger: ShareLedger,
    state: PoolState,
    engine: RebalanceEngine,
    oracle: O,
    /// Input log for replay (only with "event-log" feature)
    #[cfg(feature = "event-log")]
    pub(crate) events: Vec<PoolEvent>,
}

impl Pool {
    /// Create an empty pool valued by recorded balances.
    pub fn new(config: PoolConfig) -> Self {
        Self::with_oracle(config, RecordedBalance)
    }
}

impl<O: ValueOracle> Pool<O> {
    /// Create an empty pool valued by a custom oracle.
    pub fn with_oracle(config: PoolConfig, oracle: O) -> Self {
        Self::from_parts(
            config,
            HoldingRegistry::new(),
            ShareLedger::new(),
            PoolState::new(),
            oracle,
        )
    }

    /// Reassemble a pool from previously captured parts.
    ///
    /// The event log starts empty.
    pub fn from_parts(
        config: PoolConfig,
        registry: HoldingRegistry,
        ledger: ShareLedger,
        state: PoolState,
        oracle: O,
    ) -> Self {
        Self {
            admin: config.admin,
            registry,
            ledger,
            state,
            engine: RebalanceEngine::new(config.policy),
            oracle,
            #[cfg(feature = "event-log")]
            events: Vec::new(),
        }
    }

    // === Queries ===

    pub fn config(&self) -> PoolConfig {
        PoolConfig {
            admin: self.admin,
            policy: *self.engine.policy(),
        }
    }

    #[inline]
    pub fn admin(&self) -> AccountId {
        self.admin
    }

    pub fn registry(&self) -> &HoldingRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &ShareLedger {
        &self.ledger
    }

    pub fn state(&self) -> &PoolState {
        &self.state
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Mutable oracle access, for feeding new valuations between operations.
    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    /// Share balance of `account` (0 if absent).
    #[inline]
    pub fn shares_of(&self, account: AccountId) -> Shares {
        self.ledger.shares_of(account)
    }

    /// Full holding record, active or not.
    pub fn holding(&self, id: HoldingId) -> Option<&Holding> {
        self.registry.get(id)
    }

    #[inline]
    pub fn total_value(&self) -> Amount {
        self.state.total_value
    }

    #[inline]
    pub fn total_shares(&self) -> Shares {
        self.state.total_shares
    }

    #[inline]
    pub fn last_rebalance_block(&self) -> BlockHeight {
        self.state.last_rebalance_block
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    /// Deviation of an active holding from its target, in bp.
    pub fn deviation(&self, id: HoldingId) -> Option<Bps> {
        self.registry
            .get_active(id)
            .map(|h| rebalance::deviation(h, self.state.total_value, &self.oracle))
    }

    /// Largest deviation across active holdings.
    pub fn max_deviation(&self) -> Bps {
        rebalance::max_deviation(&self.registry, self.state.total_value, &self.oracle)
    }

    /// Shares a deposit would mint at the current NAV.
    pub fn preview_deposit(&self, amount: Amount) -> Result<Shares> {
        ShareLedger::preview_deposit(&self.state, amount)
    }

    /// Value a redemption would pay at the current NAV.
    pub fn preview_withdraw(&self, shares: Shares) -> Result<Amount> {
        ShareLedger::preview_withdraw(&self.state, shares)
    }

    /// Point-in-time view of the pool for display and reporting.
    pub fn snapshot(&self) -> PoolSnapshot {
        let total_value = self.state.total_value;
        let holdings = self
            .registry
            .iter()
            .map(|h| {
                let value = self.oracle.value_of(h);
                HoldingSnapshot {
                    id: h.id,
                    asset: h.asset.clone(),
                    target_bps: h.target_bps,
                    recorded_balance: h.recorded_balance,
                    active: h.active,
                    value,
                    current_bps: rebalance::current_bps(value, total_value),
                    deviation_bps: rebalance::deviation(h, total_value, &self.oracle),
                }
            })
            .collect();

        PoolSnapshot {
            state: self.state,
            holdings,
            accounts: self.ledger.account_count(),
            max_deviation_bps: self.max_deviation(),
            total_target_bps: self.registry.total_target_allocation(),
        }
    }

    // === Admin operations ===

    /// Register a holding with a zero balance. Admin only.
    pub fn add_holding(
        &mut self,
        caller: AccountId,
        id: HoldingId,
        asset: impl Into<AssetRef>,
        target_bps: Bps,
    ) -> Result<()> {
        let asset = asset.into();
        #[cfg(feature = "event-log")]
        self.events.push(PoolEvent::AddHolding {
            caller,
            id,
            asset: asset.clone(),
            target_bps,
        });
        self.add_holding_internal(caller, id, asset, target_bps)
    }

    /// Change an active holding's target allocation. Admin only.
    pub fn set_target_allocation(
        &mut self,
        caller: AccountId,
        id: HoldingId,
        target_bps: Bps,
    ) -> Result<()> {
        #[cfg(feature = "event-log")]
        self.events.push(PoolEvent::SetTargetAllocation {
            caller,
            id,
            target_bps,
        });
        self.set_target_allocation_internal(caller, id, target_bps)
    }

    /// Deactivate a holding. Admin only.
    pub fn deactivate_holding(&mut self, caller: AccountId, id: HoldingId) -> Result<()> {
        #[cfg(feature = "event-log")]
        self.events.push(PoolEvent::DeactivateHolding { caller, id });
        self.deactivate_holding_internal(caller, id)
    }

    /// Set or clear the pause gate. Admin only; works while paused.
    pub fn set_paused(&mut self, caller: AccountId, paused: bool) -> Result<()> {
        #[cfg(feature = "event-log")]
        self.events.push(PoolEvent::SetPaused { caller, paused });
        self.set_paused_internal(caller, paused)
    }

    // === User operations ===

    /// Deposit value and receive shares at the current NAV.
    pub fn deposit(&mut self, caller: AccountId, amount: Amount) -> Result<Shares> {
        #[cfg(feature = "event-log")]
        self.events.push(PoolEvent::Deposit { caller, amount });
        self.deposit_internal(caller, amount)
    }

    /// Redeem shares for a proportional slice of pool value.
    pub fn withdraw(&mut self, caller: AccountId, shares: Shares) -> Result<Amount> {
        #[cfg(feature = "event-log")]
        self.events.push(PoolEvent::Withdraw { caller, shares });
        self.withdraw_internal(caller, shares)
    }

    /// Permissionless rebalance trigger at `current_block`.
    pub fn rebalance(
        &mut self,
        caller: AccountId,
        current_block: BlockHeight,
    ) -> Result<RebalanceResult> {
        #[cfg(feature = "event-log")]
        self.events.push(PoolEvent::Rebalance {
            caller,
            block: current_block,
        });
        self.rebalance_internal(caller, current_block)
    }

    // === Internal (unrecorded) implementations ===

    fn authorize(&self, caller: AccountId) -> Result<()> {
        if caller != self.admin {
            return Err(PoolError::Unauthorized { caller });
        }
        Ok(())
    }

    pub(crate) fn add_holding_internal(
        &mut self,
        caller: AccountId,
        id: HoldingId,
        asset: AssetRef,
        target_bps: Bps,
    ) -> Result<()> {
        self.authorize(caller)
            .and_then(|()| self.registry.add(Holding::new(id, asset, target_bps)))
            .inspect(|_| debug!("holding {id} added with target {target_bps}bp"))
            .inspect_err(|e| debug!("add_holding {id} by {caller} rejected: {e}"))
    }

    pub(crate) fn set_target_allocation_internal(
        &mut self,
        caller: AccountId,
        id: HoldingId,
        target_bps: Bps,
    ) -> Result<()> {
        self.authorize(caller)
            .and_then(|()| self.registry.set_target(id, target_bps))
            .inspect(|_| debug!("holding {id} retargeted to {target_bps}bp"))
            .inspect_err(|e| debug!("set_target_allocation {id} by {caller} rejected: {e}"))
    }

    pub(crate) fn deactivate_holding_internal(
        &mut self,
        caller: AccountId,
        id: HoldingId,
    ) -> Result<()> {
        self.authorize(caller)
            .and_then(|()| self.registry.deactivate(id))
            .inspect(|_| debug!("holding {id} deactivated"))
            .inspect_err(|e| debug!("deactivate_holding {id} by {caller} rejected: {e}"))
    }

    pub(crate) fn set_paused_internal(&mut self, caller: AccountId, paused: bool) -> Result<()> {
        self.authorize(caller)
            .inspect_err(|e| debug!("set_paused by {caller} rejected: {e}"))?;
        if self.state.paused != paused {
            info!("pool {}", if paused { "paused" } else { "resumed" });
        }
        self.state.paused = paused;
        Ok(())
    }

    pub(crate) fn deposit_internal(&mut self, caller: AccountId, amount: Amount) -> Result<Shares> {
        self.ledger
            .deposit(&mut self.state, caller, amount)
            .inspect_err(|e| debug!("deposit by {caller} rejected: {e}"))
    }

    pub(crate) fn withdraw_internal(&mut self, caller: AccountId, shares: Shares) -> Result<Amount> {
        self.ledger
            .withdraw(&mut self.state, caller, shares)
            .inspect_err(|e| debug!("withdraw by {caller} rejected: {e}"))
    }

    pub(crate) fn rebalance_internal(
        &mut self,
        caller: AccountId,
        current_block: BlockHeight,
    ) -> Result<RebalanceResult> {
        self.engine
            .rebalance(
                &mut self.registry,
                &mut self.state,
                &self.oracle,
                current_block,
            )
            .inspect(|r| debug!("rebalance by {caller}: {} holdings snapped", r.snapped.len()))
            .inspect_err(|e| debug!("rebalance by {caller} at block {current_block} rejected: {e}"))
    }
}
