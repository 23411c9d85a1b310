//! # poolbook
//!
//! Deterministic share accounting and threshold rebalancing for a pooled fund.
//!
//! A pool is split into fungible shares and backed by up to ten holdings,
//! each with a target allocation in basis points. Deposits mint shares at the
//! current net asset value (NAV) per share, withdrawals burn them for a
//! proportional slice of pool value, and a permissionless rebalance snaps
//! drifted holdings back to their targets.
//!
//! ## Features
//!
//! - **NAV share math**: floor division everywhere, rounding in favor of the pool
//! - **Bounded registry**: a fixed array of ten holding slots, so every fold has bounded cost
//! - **Gated rebalancing**: pause flag, block cooldown, and a max-deviation threshold
//! - **Pluggable valuation**: swap in any [`ValueOracle`] without touching the ledger
//! - **Deterministic replay**: record inputs and replay them to reconstruct exact state
//!
//! ## Quick Start
//!
//! ```
//! use poolbook::{AccountId, HoldingId, Pool, PoolConfig};
//!
//! let admin = AccountId(1);
//! let alice = AccountId(2);
//! let mut pool = Pool::new(PoolConfig::new(admin));
//!
//! pool.add_holding(admin, HoldingId(0), "BTC", 6_000).unwrap();
//! pool.add_holding(admin, HoldingId(1), "ETH", 4_000).unwrap();
//!
//! // First deposit bootstraps 1:1
//! assert_eq!(pool.deposit(alice, 10_000).unwrap(), 10_000);
//!
//! // Deposits are not allocated until a rebalance runs
//! assert_eq!(pool.max_deviation(), 6_000);
//! let result = pool.rebalance(alice, 144).unwrap();
//! assert_eq!(result.snapped.len(), 2);
//! assert_eq!(pool.holding(HoldingId(0)).unwrap().recorded_balance, 6_000);
//! ```
//!
//! ## Share Math
//!
//! Shares are minted at `floor(amount * total_shares / total_value)` and
//! redeemed at `floor(shares * total_value / total_shares)`. A deposit that is
//! tiny relative to NAV can mint zero shares; its value stays with the
//! existing holders.
//!
//! ```
//! use poolbook::{AccountId, Pool, PoolConfig};
//!
//! let mut pool = Pool::new(PoolConfig::new(AccountId(1)));
//! pool.deposit(AccountId(2), 100).unwrap();
//! pool.deposit(AccountId(3), 50).unwrap();
//!
//! assert_eq!(pool.withdraw(AccountId(2), 100).unwrap(), 100);
//! assert_eq!(pool.total_value(), 50);
//! ```
//!
//! ## Rebalance Gates
//!
//! | Gate | Rejection |
//! |------|-----------|
//! | Pause flag set | [`PoolError::Paused`] |
//! | Fewer than `cooldown_blocks` since last rebalance | [`PoolError::RebalanceCooldown`] |
//! | Max deviation below `threshold_bps` | [`PoolError::RebalanceThreshold`] |
//!
//! ```
//! use poolbook::{AccountId, HoldingId, Pool, PoolConfig, PoolError};
//!
//! let admin = AccountId(1);
//! let mut pool = Pool::new(PoolConfig::new(admin));
//! pool.add_holding(admin, HoldingId(0), "BTC", 10_000).unwrap();
//! pool.deposit(AccountId(2), 1_000).unwrap();
//!
//! // Default cooldown is 144 blocks from block 0
//! assert!(matches!(
//!     pool.rebalance(AccountId(2), 100),
//!     Err(PoolError::RebalanceCooldown { elapsed: 100, required: 144 })
//! ));
//! assert!(pool.rebalance(AccountId(2), 144).is_ok());
//!
//! // Now everything is on target
//! assert!(matches!(
//!     pool.rebalance(AccountId(2), 288),
//!     Err(PoolError::RebalanceThreshold { max_deviation: 0, .. })
//! ));
//! ```
//!
//! ## Custom Valuation
//!
//! Any `Fn(&Holding) -> Amount` is a [`ValueOracle`]:
//!
//! ```
//! use poolbook::{AccountId, Holding, Pool, PoolConfig};
//!
//! let oracle = |h: &Holding| h.recorded_balance * 3;
//! let pool = Pool::with_oracle(PoolConfig::new(AccountId(1)), oracle);
//! assert_eq!(pool.max_deviation(), 0);
//! ```
//!
//! ## Event Replay
//!
//! All operations are recorded as events for deterministic replay
//! (requires the `event-log` feature, enabled by default):
//!
//! ```ignore
//! use poolbook::{AccountId, Pool, PoolConfig};
//!
//! let config = PoolConfig::new(AccountId(1));
//! let mut pool = Pool::new(config);
//! pool.deposit(AccountId(2), 500).unwrap();
//!
//! let replayed = Pool::replay(config, pool.events());
//! assert_eq!(replayed.state(), pool.state());
//! ```

mod error;
#[cfg(feature = "event-log")]
mod event;
mod holding;
mod ledger;
mod oracle;
#[cfg(feature = "persistence")]
pub mod persistence;
mod pool;
pub mod rebalance;
mod shared;
mod snapshot;
mod state;
mod types;

// Re-export public API
pub use error::{PoolError, Result};
#[cfg(feature = "event-log")]
pub use event::{ApplyOutcome, PoolEvent};
pub use holding::{Holding, HoldingRegistry};
pub use ledger::ShareLedger;
pub use oracle::{RecordedBalance, ValueOracle};
pub use pool::{Pool, PoolConfig};
pub use rebalance::{RebalanceEngine, RebalancePolicy, RebalanceResult, SnapRecord};
pub use shared::SharedPool;
pub use snapshot::{HoldingSnapshot, PoolSnapshot};
pub use state::PoolState;
pub use types::{
    AccountId, Amount, AssetRef, BPS_SCALE, BlockHeight, Bps, HoldingId, MAX_HOLDINGS, Shares,
};
