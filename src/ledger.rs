//! Share ledger: NAV-based issuance and redemption.
//!
//! Deposits mint `floor(amount * total_shares / total_value)` shares and
//! withdrawals pay `floor(shares * total_value / total_shares)`. Both round
//! toward the pool, so remaining holders never lose value to rounding.

use log::debug;
use rustc_hash::FxHashMap;

use crate::error::{PoolError, Result, mul_div_floor};
use crate::state::PoolState;
use crate::types::{AccountId, Amount, Shares};

/// Serde helper for `FxHashMap<AccountId, Shares>`: serializes as a sorted `Vec<(AccountId, Shares)>`.
#[cfg(feature = "serde")]
mod serde_accounts {
    use super::{AccountId, FxHashMap, Shares};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        map: &FxHashMap<AccountId, Shares>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut vec: Vec<(&AccountId, &Shares)> = map.iter().collect();
        vec.sort_by_key(|(account, _)| **account);
        vec.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<FxHashMap<AccountId, Shares>, D::Error> {
        let vec: Vec<(AccountId, Shares)> = Vec::deserialize(deserializer)?;
        Ok(vec.into_iter().collect())
    }
}

/// Per-account share balances.
///
/// Totals live in [`PoolState`]; the ledger keeps the invariant that the sum
/// of all balances equals `PoolState::total_shares`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShareLedger {
    #[cfg_attr(
        feature = "serde",
        serde(
            serialize_with = "serde_accounts::serialize",
            deserialize_with = "serde_accounts::deserialize"
        )
    )]
    accounts: FxHashMap<AccountId, Shares>,
}

impl ShareLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // === Queries ===

    /// Share balance of an account (0 if it never held shares).
    #[inline]
    pub fn shares_of(&self, account: AccountId) -> Shares {
        self.accounts.get(&account).copied().unwrap_or(0)
    }

    /// Accounts with a non-zero balance.
    pub fn accounts(&self) -> impl Iterator<Item = (AccountId, Shares)> + '_ {
        self.accounts.iter().map(|(a, s)| (*a, *s))
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Sum of every account balance. Equals `total_shares` when consistent.
    pub fn total_recorded(&self) -> Shares {
        self.accounts.values().sum()
    }

    /// Shares a deposit of `amount` would mint right now. No gates applied.
    ///
    /// An empty pool (no value or no shares) issues 1:1.
    pub fn preview_deposit(state: &PoolState, amount: Amount) -> Result<Shares> {
        if state.total_value == 0 || state.total_shares == 0 {
            return Ok(amount);
        }
        mul_div_floor(amount, state.total_shares, state.total_value)
    }

    /// Value a redemption of `shares` would pay right now. No gates applied.
    pub fn preview_withdraw(state: &PoolState, shares: Shares) -> Result<Amount> {
        if state.total_shares == 0 {
            return Err(PoolError::InsufficientBalance {
                requested: shares,
                available: 0,
            });
        }
        mul_div_floor(shares, state.total_value, state.total_shares)
    }

    // === Mutation ===

    /// Deposit `amount` for `caller` and return the shares issued.
    ///
    /// A deposit that is small relative to NAV can legitimately issue zero
    /// shares; the value still enters the pool.
    pub fn deposit(
        &mut self,
        state: &mut PoolState,
        caller: AccountId,
        amount: Amount,
    ) -> Result<Shares> {
        if state.paused {
            return Err(PoolError::Paused);
        }
        if amount == 0 {
            return Err(PoolError::InvalidAmount);
        }

        let issued = Self::preview_deposit(state, amount)?;
        let total_value = state
            .total_value
            .checked_add(amount)
            .ok_or(PoolError::Overflow)?;
        let total_shares = state
            .total_shares
            .checked_add(issued)
            .ok_or(PoolError::Overflow)?;

        if issued > 0 {
            *self.accounts.entry(caller).or_default() += issued;
        }
        state.total_value = total_value;
        state.total_shares = total_shares;

        debug!("deposit {caller}: amount={amount} issued={issued} total_value={total_value} total_shares={total_shares}");
        Ok(issued)
    }

    /// Redeem `shares` from `caller` and return the value paid out.
    ///
    /// Redeeming zero shares pays nothing and leaves the ledger as it was.
    pub fn withdraw(
        &mut self,
        state: &mut PoolState,
        caller: AccountId,
        shares: Shares,
    ) -> Result<Amount> {
        if state.paused {
            return Err(PoolError::Paused);
        }

        let available = self.shares_of(caller);
        let insufficient = PoolError::InsufficientBalance {
            requested: shares,
            available,
        };
        if shares > available || shares > state.total_shares {
            return Err(insufficient);
        }

        let paid = Self::preview_withdraw(state, shares)?;
        let total_value = state.total_value.checked_sub(paid).ok_or(insufficient)?;

        let remaining = available - shares;
        if remaining == 0 {
            self.accounts.remove(&caller);
        } else {
            self.accounts.insert(caller, remaining);
        }
        state.total_shares -= shares;
        state.total_value = total_value;

        debug!(
            "withdraw {caller}: shares={shares} paid={paid} total_value={total_value} total_shares={}",
            state.total_shares
        );
        Ok(paid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: AccountId = AccountId(1);
    const BOB: AccountId = AccountId(2);

    fn setup() -> (ShareLedger, PoolState) {
        (ShareLedger::new(), PoolState::new())
    }

    #[test]
    fn first_deposit_is_one_to_one() {
        let (mut ledger, mut state) = setup();
        assert_eq!(ledger.deposit(&mut state, ALICE, 1_000).unwrap(), 1_000);
        assert_eq!(state.total_value, 1_000);
        assert_eq!(state.total_shares, 1_000);
        assert_eq!(ledger.shares_of(ALICE), 1_000);
    }

    #[test]
    fn deposit_at_nav() {
        let (mut ledger, mut state) = setup();
        ledger.deposit(&mut state, ALICE, 1_000).unwrap();
        // Value doubles without new shares: NAV = 2
        state.total_value = 2_000;

        assert_eq!(ledger.deposit(&mut state, BOB, 500).unwrap(), 250);
        assert_eq!(state.total_value, 2_500);
        assert_eq!(state.total_shares, 1_250);
    }

    #[test]
    fn tiny_deposit_issues_zero_shares() {
        let (mut ledger, mut state) = setup();
        ledger.deposit(&mut state, ALICE, 100).unwrap();
        state.total_value = 1_000; // NAV = 10

        assert_eq!(ledger.deposit(&mut state, BOB, 9).unwrap(), 0);
        assert_eq!(ledger.shares_of(BOB), 0);
        assert_eq!(state.total_value, 1_009);
        assert_eq!(state.total_shares, 100);
        assert_eq!(ledger.account_count(), 1);
    }

    #[test]
    fn zero_deposit_rejected() {
        let (mut ledger, mut state) = setup();
        assert_eq!(
            ledger.deposit(&mut state, ALICE, 0),
            Err(PoolError::InvalidAmount)
        );
    }

    #[test]
    fn zero_share_withdrawal_is_a_no_op() {
        let (mut ledger, mut state) = setup();
        ledger.deposit(&mut state, ALICE, 1_000).unwrap();
        let before = state;

        assert_eq!(ledger.withdraw(&mut state, ALICE, 0).unwrap(), 0);
        assert_eq!(ledger.withdraw(&mut state, BOB, 0).unwrap(), 0);
        assert_eq!(state, before);
        assert_eq!(ledger.shares_of(ALICE), 1_000);
        assert_eq!(ledger.account_count(), 1);
    }

    #[test]
    fn paused_gate() {
        let (mut ledger, mut state) = setup();
        ledger.deposit(&mut state, ALICE, 100).unwrap();
        state.paused = true;

        assert_eq!(ledger.deposit(&mut state, ALICE, 100), Err(PoolError::Paused));
        assert_eq!(ledger.withdraw(&mut state, ALICE, 50), Err(PoolError::Paused));
        assert_eq!(state.total_value, 100);
    }

    #[test]
    fn withdraw_full_balance() {
        let (mut ledger, mut state) = setup();
        ledger.deposit(&mut state, ALICE, 700).unwrap();
        ledger.deposit(&mut state, BOB, 300).unwrap();

        assert_eq!(ledger.withdraw(&mut state, ALICE, 700).unwrap(), 700);
        assert_eq!(ledger.shares_of(ALICE), 0);
        assert_eq!(state.total_shares, 300);
        assert_eq!(state.total_value, 300);
    }

    #[test]
    fn withdraw_one_more_than_balance() {
        let (mut ledger, mut state) = setup();
        ledger.deposit(&mut state, ALICE, 700).unwrap();

        assert_eq!(
            ledger.withdraw(&mut state, ALICE, 701),
            Err(PoolError::InsufficientBalance {
                requested: 701,
                available: 700
            })
        );
        assert_eq!(ledger.shares_of(ALICE), 700);
    }

    #[test]
    fn withdraw_from_unknown_account() {
        let (mut ledger, mut state) = setup();
        assert_eq!(
            ledger.withdraw(&mut state, BOB, 1),
            Err(PoolError::InsufficientBalance {
                requested: 1,
                available: 0
            })
        );
    }

    #[test]
    fn withdraw_rounds_down() {
        let (mut ledger, mut state) = setup();
        ledger.deposit(&mut state, ALICE, 3).unwrap();
        state.total_value = 10;

        // 1 * 10 / 3 = 3.33 → 3
        assert_eq!(ledger.withdraw(&mut state, ALICE, 1).unwrap(), 3);
        assert_eq!(state.total_value, 7);
        assert_eq!(state.total_shares, 2);
    }

    #[test]
    fn deposit_overflow_leaves_state_untouched() {
        let (mut ledger, mut state) = setup();
        ledger.deposit(&mut state, ALICE, u128::MAX - 1).unwrap();
        let before = state;

        assert_eq!(
            ledger.deposit(&mut state, BOB, 10),
            Err(PoolError::Overflow)
        );
        assert_eq!(state, before);
        assert_eq!(ledger.shares_of(BOB), 0);
    }

    #[test]
    fn balances_sum_to_total_shares() {
        let (mut ledger, mut state) = setup();
        ledger.deposit(&mut state, ALICE, 1_000).unwrap();
        state.total_value = 1_337;
        ledger.deposit(&mut state, BOB, 421).unwrap();
        ledger.withdraw(&mut state, ALICE, 333).unwrap();

        assert_eq!(ledger.total_recorded(), state.total_shares);
    }
}
