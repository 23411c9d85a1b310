//! Edge cases: empty pools, inactive holdings, overflow, out-of-range ids,
//! and the no-partial-commit guarantee.

use poolbook::{
    AccountId, Holding, HoldingId, HoldingRegistry, Pool, PoolConfig, PoolError, PoolState,
    RebalanceEngine, RebalancePolicy, RecordedBalance, ShareLedger,
};

const ADMIN: AccountId = AccountId(1);
const ALICE: AccountId = AccountId(2);
const BOB: AccountId = AccountId(3);

fn pool() -> Pool {
    Pool::new(PoolConfig::new(ADMIN))
}

fn eager_pool() -> Pool {
    Pool::new(PoolConfig::new(ADMIN).with_policy(RebalancePolicy {
        cooldown_blocks: 0,
        threshold_bps: 200,
    }))
}

// ============================================================================
// Empty pool
// ============================================================================

#[test]
fn empty_pool_queries() {
    let pool = pool();
    assert_eq!(pool.total_value(), 0);
    assert_eq!(pool.total_shares(), 0);
    assert_eq!(pool.shares_of(ALICE), 0);
    assert_eq!(pool.max_deviation(), 0);
    assert!(pool.holding(HoldingId(0)).is_none());
    assert_eq!(pool.state().nav_per_share(), None);
}

#[test]
fn withdraw_from_empty_pool() {
    let mut pool = pool();
    assert_eq!(
        pool.withdraw(ALICE, 1),
        Err(PoolError::InsufficientBalance {
            requested: 1,
            available: 0
        })
    );
}

#[test]
fn zero_share_withdrawal_changes_nothing() {
    let mut pool = pool();
    pool.deposit(ALICE, 1_000).unwrap();
    let before = pool.snapshot();

    assert_eq!(pool.withdraw(ALICE, 0), Ok(0));
    // An account with no shares can also redeem nothing
    assert_eq!(pool.withdraw(BOB, 0), Ok(0));
    assert_eq!(pool.snapshot(), before);
    assert_eq!(pool.shares_of(ALICE), 1_000);
}

#[test]
fn zero_share_withdrawal_from_empty_pool() {
    let mut pool = pool();
    assert_eq!(
        pool.withdraw(ALICE, 0),
        Err(PoolError::InsufficientBalance {
            requested: 0,
            available: 0
        })
    );
}

#[test]
fn preview_withdraw_on_empty_pool() {
    assert!(matches!(
        ShareLedger::preview_withdraw(&PoolState::new(), 10),
        Err(PoolError::InsufficientBalance { .. })
    ));
}

#[test]
fn rebalance_with_no_holdings_is_below_threshold() {
    let mut pool = eager_pool();
    pool.deposit(ALICE, 1_000).unwrap();
    assert_eq!(
        pool.rebalance(ALICE, 0),
        Err(PoolError::RebalanceThreshold {
            max_deviation: 0,
            threshold: 200
        })
    );
}

#[test]
fn rebalance_on_empty_pool_snaps_to_zero() {
    let mut pool = eager_pool();
    pool.add_holding(ADMIN, HoldingId(0), "A", 5_000).unwrap();

    // Empty pool: current share reads 0 bp, deviation equals the target
    assert_eq!(pool.deviation(HoldingId(0)), Some(5_000));
    let result = pool.rebalance(ALICE, 0).unwrap();
    assert_eq!(result.snapped[0].new_balance, 0);
    assert_eq!(pool.total_value(), 0);
}

// ============================================================================
// Emptied value with outstanding shares
// ============================================================================

#[test]
fn zero_value_with_shares_bootstraps_next_deposit() {
    let mut pool = eager_pool();
    // Tiny pool: 1 * 5000 / 10000 floors to zero
    pool.add_holding(ADMIN, HoldingId(0), "A", 5_000).unwrap();
    pool.deposit(ALICE, 1).unwrap();
    pool.rebalance(ALICE, 0).unwrap();
    assert_eq!(pool.total_value(), 0);
    assert_eq!(pool.total_shares(), 1);

    assert_eq!(pool.deposit(AccountId(3), 500).unwrap(), 500);
    assert_eq!(pool.total_shares(), 501);
}

// ============================================================================
// Inactive holdings
// ============================================================================

#[test]
fn inactive_holding_stays_addressable() {
    let mut pool = pool();
    pool.add_holding(ADMIN, HoldingId(7), "OLD", 2_500).unwrap();
    pool.deactivate_holding(ADMIN, HoldingId(7)).unwrap();

    let h = pool.holding(HoldingId(7)).unwrap();
    assert!(!h.active);
    assert_eq!(h.target_bps, 2_500);
    assert_eq!(pool.deviation(HoldingId(7)), None);
    assert_eq!(pool.max_deviation(), 0);
}

#[test]
fn deactivate_twice_fails() {
    let mut pool = pool();
    pool.add_holding(ADMIN, HoldingId(7), "OLD", 2_500).unwrap();
    pool.deactivate_holding(ADMIN, HoldingId(7)).unwrap();
    assert_eq!(
        pool.deactivate_holding(ADMIN, HoldingId(7)),
        Err(PoolError::HoldingNotFound(HoldingId(7)))
    );
}

#[test]
fn inactive_holding_excluded_from_rebalanced_total() {
    let engine = RebalanceEngine::new(RebalancePolicy {
        cooldown_blocks: 0,
        threshold_bps: 200,
    });
    let mut reg = HoldingRegistry::new();
    reg.add(Holding::new(HoldingId(0), "A", 10_000).with_balance(100))
        .unwrap();
    reg.add(Holding::new(HoldingId(1), "B", 0).with_balance(5_000))
        .unwrap();
    reg.deactivate(HoldingId(1)).unwrap();
    let mut state = PoolState {
        total_value: 1_000,
        total_shares: 1_000,
        ..PoolState::default()
    };

    engine
        .rebalance(&mut reg, &mut state, &RecordedBalance, 0)
        .unwrap();

    assert_eq!(state.total_value, 1_000);
    assert_eq!(reg.get(HoldingId(1)).unwrap().recorded_balance, 5_000);
}

// ============================================================================
// Ids and percentages
// ============================================================================

#[test]
fn out_of_range_id() {
    let mut pool = pool();
    assert!(matches!(
        pool.add_holding(ADMIN, HoldingId(200), "X", 100),
        Err(PoolError::CapacityExceeded { .. })
    ));
    assert!(pool.holding(HoldingId(200)).is_none());
}

#[test]
fn full_allocation_boundaries() {
    let mut pool = pool();
    pool.add_holding(ADMIN, HoldingId(0), "ALL", 10_000).unwrap();
    pool.add_holding(ADMIN, HoldingId(1), "NONE", 0).unwrap();
    assert_eq!(
        pool.add_holding(ADMIN, HoldingId(2), "TOO_MUCH", 10_001),
        Err(PoolError::InvalidPercentage(10_001))
    );
}

// ============================================================================
// Overflow and atomicity
// ============================================================================

#[test]
fn total_value_overflow_rejected() {
    let mut pool = pool();
    pool.deposit(ALICE, u128::MAX).unwrap();
    assert_eq!(pool.deposit(ALICE, 1), Err(PoolError::Overflow));
    assert_eq!(pool.total_value(), u128::MAX);
    assert_eq!(pool.shares_of(ALICE), u128::MAX);
}

#[test]
fn rebalance_target_overflow_leaves_registry_untouched() {
    let engine = RebalanceEngine::new(RebalancePolicy {
        cooldown_blocks: 0,
        threshold_bps: 1,
    });
    let mut reg = HoldingRegistry::new();
    reg.add(Holding::new(HoldingId(0), "A", 10_000)).unwrap();
    reg.add(Holding::new(HoldingId(1), "B", 10_000)).unwrap();
    let mut state = PoolState {
        total_value: u128::MAX,
        total_shares: 1,
        ..PoolState::default()
    };
    let (reg_before, state_before) = (reg.clone(), state);

    assert_eq!(
        engine.rebalance(&mut reg, &mut state, &RecordedBalance, 5),
        Err(PoolError::Overflow)
    );
    assert_eq!(reg, reg_before);
    assert_eq!(state, state_before);
}

#[test]
fn failed_operations_change_nothing() {
    let mut pool = pool();
    pool.add_holding(ADMIN, HoldingId(0), "A", 10_000).unwrap();
    pool.deposit(ALICE, 1_000).unwrap();
    let state = *pool.state();
    let registry = pool.registry().clone();

    let _ = pool.withdraw(ALICE, 5_000);
    let _ = pool.deposit(ALICE, 0);
    let _ = pool.rebalance(ALICE, 3);
    let _ = pool.add_holding(ALICE, HoldingId(1), "B", 1);
    let _ = pool.set_target_allocation(ADMIN, HoldingId(0), 99_999);

    assert_eq!(*pool.state(), state);
    assert_eq!(*pool.registry(), registry);
    assert_eq!(pool.shares_of(ALICE), 1_000);
}
