//! Holding valuation.
//!
//! The engine never prices anything itself: it asks a [`ValueOracle`] for the
//! value of each holding in the pool's unit of account. The default
//! [`RecordedBalance`] oracle treats the recorded balance as its own value.
//! Other oracles plug in without touching the ledger or the rebalance engine,
//! as long as they keep balances value-denominated (see [`ValueOracle`]).

use crate::holding::Holding;
use crate::types::Amount;

/// Values a holding in the pool's unit of account.
///
/// Rebalancing snaps `recorded_balance` to a target *value*, so balances are
/// value-denominated. An oracle that applies a price to the balance prices
/// that value a second time: after a snap the pool's total value is scaled
/// by the price. Such an oracle should report value changes since the last
/// snap, not unit prices.
pub trait ValueOracle {
    fn value_of(&self, holding: &Holding) -> Amount;
}

/// Identity valuation: a holding is worth its recorded balance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordedBalance;

impl ValueOracle for RecordedBalance {
    #[inline]
    fn value_of(&self, holding: &Holding) -> Amount {
        holding.recorded_balance
    }
}

impl<F> ValueOracle for F
where
    F: Fn(&Holding) -> Amount,
{
    #[inline]
    fn value_of(&self, holding: &Holding) -> Amount {
        self(holding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HoldingId;

    #[test]
    fn recorded_balance_is_identity() {
        let h = Holding::new(HoldingId(0), "A", 5_000).with_balance(1_234);
        assert_eq!(RecordedBalance.value_of(&h), 1_234);
    }

    #[test]
    fn closure_oracle() {
        let doubled = |h: &Holding| h.recorded_balance * 2;
        let h = Holding::new(HoldingId(1), "B", 5_000).with_balance(50);
        assert_eq!(doubled.value_of(&h), 100);
    }
}
