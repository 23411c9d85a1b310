//! Errors returned by pool operations.

use crate::types::{AccountId, Amount, BlockHeight, Bps, HoldingId, Shares};

/// Every way a pool operation can be rejected.
///
/// All checks run before any state is written, so an `Err` never leaves
/// a partial update behind.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PoolError {
    /// A non-admin caller invoked an admin-only operation.
    #[error("caller {caller} is not the pool admin")]
    Unauthorized { caller: AccountId },

    /// The holding is absent or inactive.
    #[error("holding {0} not found")]
    HoldingNotFound(HoldingId),

    /// Allocation above 100%.
    #[error("allocation {0} bp exceeds 10000 bp")]
    InvalidPercentage(Bps),

    /// Withdrawal larger than the caller's share balance.
    #[error("insufficient shares: requested {requested}, available {available}")]
    InsufficientBalance { requested: Shares, available: Shares },

    /// An active holding already uses this id.
    #[error("holding {0} already exists")]
    AlreadyExists(HoldingId),

    /// The registry has no free slot for this id.
    #[error("registry capacity of {max} holdings exceeded")]
    CapacityExceeded { max: usize },

    /// Zero deposit.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// Too few blocks since the last rebalance.
    #[error("rebalance cooldown: {elapsed} of {required} blocks elapsed")]
    RebalanceCooldown {
        elapsed: BlockHeight,
        required: BlockHeight,
    },

    /// No holding has drifted far enough to justify a rebalance.
    #[error("max deviation {max_deviation} bp below threshold {threshold} bp")]
    RebalanceThreshold { max_deviation: Bps, threshold: Bps },

    /// The pause gate is set.
    #[error("pool is paused")]
    Paused,

    /// A value or share total would not fit in the accounting integer.
    #[error("arithmetic overflow")]
    Overflow,
}

impl PoolError {
    /// Stable short name, used in audit trails and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PoolError::Unauthorized { .. } => "unauthorized",
            PoolError::HoldingNotFound(_) => "not_found",
            PoolError::InvalidPercentage(_) => "invalid_percentage",
            PoolError::InsufficientBalance { .. } => "insufficient_balance",
            PoolError::AlreadyExists(_) => "already_exists",
            PoolError::CapacityExceeded { .. } => "capacity_exceeded",
            PoolError::InvalidAmount => "invalid_amount",
            PoolError::RebalanceCooldown { .. } => "rebalance_cooldown",
            PoolError::RebalanceThreshold { .. } => "rebalance_threshold",
            PoolError::Paused => "paused",
            PoolError::Overflow => "overflow",
        }
    }
}

/// Checked `a * b / c` with floor division in 128-bit arithmetic.
///
/// Callers guarantee `c > 0`.
#[inline]
pub(crate) fn mul_div_floor(a: Amount, b: Amount, c: Amount) -> Result<Amount> {
    debug_assert!(c > 0, "mul_div_floor divisor must be non-zero");
    a.checked_mul(b)
        .map(|n| n / c)
        .ok_or(PoolError::Overflow)
}

pub type Result<T> = std::result::Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(format!("{}", PoolError::Paused), "pool is paused");
        assert_eq!(
            format!(
                "{}",
                PoolError::InsufficientBalance {
                    requested: 11,
                    available: 10
                }
            ),
            "insufficient shares: requested 11, available 10"
        );
        assert_eq!(
            format!("{}", PoolError::HoldingNotFound(HoldingId(4))),
            "holding H4 not found"
        );
    }

    #[test]
    fn is_error() {
        let err: Box<dyn std::error::Error> = Box::new(PoolError::InvalidAmount);
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn kinds_are_distinct() {
        let all = [
            PoolError::Unauthorized {
                caller: AccountId(1),
            },
            PoolError::HoldingNotFound(HoldingId(0)),
            PoolError::InvalidPercentage(10_001),
            PoolError::InsufficientBalance {
                requested: 1,
                available: 0,
            },
            PoolError::AlreadyExists(HoldingId(0)),
            PoolError::CapacityExceeded { max: 10 },
            PoolError::InvalidAmount,
            PoolError::RebalanceCooldown {
                elapsed: 0,
                required: 144,
            },
            PoolError::RebalanceThreshold {
                max_deviation: 0,
                threshold: 200,
            },
            PoolError::Paused,
            PoolError::Overflow,
        ];
        let kinds: std::collections::HashSet<_> = all.iter().map(PoolError::kind).collect();
        assert_eq!(kinds.len(), all.len());
    }

    #[test]
    fn mul_div_floors() {
        assert_eq!(mul_div_floor(7, 3, 2).unwrap(), 10);
        assert_eq!(mul_div_floor(1, 1, 2).unwrap(), 0);
        assert_eq!(mul_div_floor(u128::MAX, 2, 3), Err(PoolError::Overflow));
    }
}
