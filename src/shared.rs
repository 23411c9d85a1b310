//! Thread-safe pool handle.
//!
//! [`SharedPool`] wraps a [`Pool`] in one mutex. Each operation holds the
//! lock for its whole duration, so concurrent callers observe a total order
//! of complete operations and never a half-applied rebalance.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::holding::Holding;
use crate::oracle::{RecordedBalance, ValueOracle};
use crate::pool::{Pool, PoolConfig};
use crate::rebalance::RebalanceResult;
use crate::snapshot::PoolSnapshot;
use crate::state::PoolState;
use crate::types::{AccountId, Amount, AssetRef, BlockHeight, Bps, HoldingId, Shares};

/// Clonable, `Send + Sync` handle to a pool.
pub struct SharedPool<O: ValueOracle = RecordedBalance> {
    inner: Arc<Mutex<Pool<O>>>,
}

impl<O: ValueOracle> Clone for SharedPool<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SharedPool {
    pub fn new(config: PoolConfig) -> Self {
        Self::from_pool(Pool::new(config))
    }
}

impl<O: ValueOracle> SharedPool<O> {
    pub fn from_pool(pool: Pool<O>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    // Operations validate before writing, so a panic while the lock was
    // held cannot have left the pool half-updated.
    fn lock(&self) -> MutexGuard<'_, Pool<O>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the pool.
    ///
    /// Use this for several reads (or a read-then-write) that must observe
    /// one consistent state.
    pub fn with<R>(&self, f: impl FnOnce(&mut Pool<O>) -> R) -> R {
        f(&mut *self.lock())
    }

    pub fn add_holding(
        &self,
        caller: AccountId,
        id: HoldingId,
        asset: impl Into<AssetRef>,
        target_bps: Bps,
    ) -> Result<()> {
        self.lock().add_holding(caller, id, asset, target_bps)
    }

    pub fn set_target_allocation(&self, caller: AccountId, id: HoldingId, target_bps: Bps) -> Result<()> {
        self.lock().set_target_allocation(caller, id, target_bps)
    }

    pub fn deactivate_holding(&self, caller: AccountId, id: HoldingId) -> Result<()> {
        self.lock().deactivate_holding(caller, id)
    }

    pub fn set_paused(&self, caller: AccountId, paused: bool) -> Result<()> {
        self.lock().set_paused(caller, paused)
    }

    pub fn deposit(&self, caller: AccountId, amount: Amount) -> Result<Shares> {
        self.lock().deposit(caller, amount)
    }

    pub fn withdraw(&self, caller: AccountId, shares: Shares) -> Result<Amount> {
        self.lock().withdraw(caller, shares)
    }

    pub fn rebalance(&self, caller: AccountId, current_block: BlockHeight) -> Result<RebalanceResult> {
        self.lock().rebalance(caller, current_block)
    }

    pub fn shares_of(&self, account: AccountId) -> Shares {
        self.lock().shares_of(account)
    }

    /// Copy of a holding record.
    pub fn holding(&self, id: HoldingId) -> Option<Holding> {
        self.lock().holding(id).cloned()
    }

    pub fn state(&self) -> PoolState {
        *self.lock().state()
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        self.lock().snapshot()
    }

    /// Unwrap the pool if this is the last handle.
    pub fn into_inner(self) -> std::result::Result<Pool<O>, Self> {
        Arc::try_unwrap(self.inner)
            .map(|m| m.into_inner().unwrap_or_else(PoisonError::into_inner))
            .map_err(|inner| Self { inner })
    }
}
