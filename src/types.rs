//! Core types: HoldingId, AccountId, AssetRef, Amount, Shares, Bps, BlockHeight

use std::fmt;

/// Value in the pool's unit of account (smallest unit, no decimals).
pub type Amount = u128;

/// Pool ownership shares. Always whole units.
pub type Shares = u128;

/// Basis points: 1 bp = 0.01%, `BPS_SCALE` bp = 100%.
pub type Bps = u32;

/// Block height supplied by the environment when triggering a rebalance.
pub type BlockHeight = u64;

/// 100% expressed in basis points.
pub const BPS_SCALE: Bps = 10_000;

/// Maximum number of holding slots in a registry.
pub const MAX_HOLDINGS: usize = 10;

/// Identifier of a holding slot in `[0, MAX_HOLDINGS)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HoldingId(pub u8);

impl HoldingId {
    /// Slot index, or `None` if the id lies outside the registry.
    #[inline]
    pub fn slot(self) -> Option<usize> {
        let idx = self.0 as usize;
        (idx < MAX_HOLDINGS).then_some(idx)
    }
}

impl fmt::Display for HoldingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.0)
    }
}

/// Caller identity. The pool admin is one of these.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}", self.0)
    }
}

/// Opaque reference to the asset behind a holding.
///
/// The engine never interprets it; it is carried for display and for
/// oracles that price by asset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetRef(pub String);

impl AssetRef {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AssetRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}
