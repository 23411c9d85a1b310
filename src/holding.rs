//! Holding records and the bounded registry that stores them.

use crate::error::{PoolError, Result};
use crate::types::{Amount, AssetRef, BPS_SCALE, Bps, HoldingId, MAX_HOLDINGS};

/// One sub-holding of the pool.
///
/// `recorded_balance` is already denominated in the pool's unit of account
/// and is only rewritten by a rebalance.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Holding {
    pub id: HoldingId,
    pub asset: AssetRef,
    /// Target share of pool value, in basis points (0..=10000)
    pub target_bps: Bps,
    pub recorded_balance: Amount,
    /// Inactive holdings stay addressable but are skipped by valuation
    pub active: bool,
}

impl Holding {
    /// A fresh, active holding with a zero balance.
    pub fn new(id: HoldingId, asset: impl Into<AssetRef>, target_bps: Bps) -> Self {
        Self {
            id,
            asset: asset.into(),
            target_bps,
            recorded_balance: 0,
            active: true,
        }
    }

    /// Builder-style balance seed, for restoring state or staging tests.
    pub fn with_balance(mut self, balance: Amount) -> Self {
        self.recorded_balance = balance;
        self
    }
}

fn check_bps(bps: Bps) -> Result<()> {
    if bps > BPS_SCALE {
        return Err(PoolError::InvalidPercentage(bps));
    }
    Ok(())
}

/// Fixed-capacity holding table indexed by [`HoldingId`].
///
/// Iteration always walks the `MAX_HOLDINGS` slots in id order, so every
/// fold over the registry has a bounded, deterministic cost.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HoldingRegistry {
    slots: [Option<Holding>; MAX_HOLDINGS],
}

impl HoldingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // === Queries ===

    /// Look up a holding by id, active or not.
    pub fn get(&self, id: HoldingId) -> Option<&Holding> {
        id.slot().and_then(|idx| self.slots[idx].as_ref())
    }

    /// Look up an active holding.
    pub fn get_active(&self, id: HoldingId) -> Option<&Holding> {
        self.get(id).filter(|h| h.active)
    }

    /// Active holdings in id order.
    pub fn active(&self) -> impl Iterator<Item = &Holding> {
        self.slots.iter().flatten().filter(|h| h.active)
    }

    /// Every stored holding (active and inactive) in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Holding> {
        self.slots.iter().flatten()
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Sum of target allocations across active holdings.
    pub fn total_target_allocation(&self) -> u64 {
        self.active().map(|h| h.target_bps as u64).sum()
    }

    /// Whether active targets sum to exactly 100%.
    ///
    /// Informational only: no operation refuses to run when this is false.
    pub fn validate_total_allocation(&self) -> bool {
        self.total_target_allocation() == BPS_SCALE as u64
    }

    // === Mutation ===

    /// Insert a holding into its slot.
    ///
    /// Fails with `InvalidPercentage` for targets above 100%,
    /// `AlreadyExists` if an active holding owns the id, and
    /// `CapacityExceeded` when every slot is active or the id lies outside
    /// the slot range. An inactive record with the same id is replaced.
    pub fn add(&mut self, holding: Holding) -> Result<()> {
        check_bps(holding.target_bps)?;
        if self.get_active(holding.id).is_some() {
            return Err(PoolError::AlreadyExists(holding.id));
        }
        let capacity = PoolError::CapacityExceeded { max: MAX_HOLDINGS };
        if self.active_count() >= MAX_HOLDINGS {
            return Err(capacity);
        }
        let idx = holding.id.slot().ok_or(capacity)?;
        self.slots[idx] = Some(holding);
        Ok(())
    }

    /// Change an active holding's target allocation.
    pub fn set_target(&mut self, id: HoldingId, target_bps: Bps) -> Result<()> {
        check_bps(target_bps)?;
        let holding = self.get_active_mut(id)?;
        holding.target_bps = target_bps;
        Ok(())
    }

    /// Mark an active holding inactive. Its record stays in place.
    pub fn deactivate(&mut self, id: HoldingId) -> Result<()> {
        let holding = self.get_active_mut(id)?;
        holding.active = false;
        Ok(())
    }

    fn get_active_mut(&mut self, id: HoldingId) -> Result<&mut Holding> {
        id.slot()
            .and_then(|idx| self.slots[idx].as_mut())
            .filter(|h| h.active)
            .ok_or(PoolError::HoldingNotFound(id))
    }

    /// Mutable access to active holdings, for the rebalance fold.
    pub(crate) fn active_mut(&mut self) -> impl Iterator<Item = &mut Holding> {
        self.slots.iter_mut().flatten().filter(|h| h.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_registry() -> HoldingRegistry {
        let mut reg = HoldingRegistry::new();
        for i in 0..MAX_HOLDINGS as u8 {
            reg.add(Holding::new(HoldingId(i), "X", 1_000)).unwrap();
        }
        reg
    }

    #[test]
    fn add_and_get() {
        let mut reg = HoldingRegistry::new();
        reg.add(Holding::new(HoldingId(2), "ETH", 3_000)).unwrap();

        let h = reg.get(HoldingId(2)).unwrap();
        assert_eq!(h.asset.as_str(), "ETH");
        assert_eq!(h.target_bps, 3_000);
        assert_eq!(h.recorded_balance, 0);
        assert!(h.active);
        assert!(reg.get(HoldingId(1)).is_none());
    }

    #[test]
    fn duplicate_active_id_rejected() {
        let mut reg = HoldingRegistry::new();
        reg.add(Holding::new(HoldingId(0), "A", 100)).unwrap();
        assert_eq!(
            reg.add(Holding::new(HoldingId(0), "B", 100)),
            Err(PoolError::AlreadyExists(HoldingId(0)))
        );
    }

    #[test]
    fn target_above_100_percent_rejected() {
        let mut reg = HoldingRegistry::new();
        assert_eq!(
            reg.add(Holding::new(HoldingId(0), "A", 10_001)),
            Err(PoolError::InvalidPercentage(10_001))
        );
        reg.add(Holding::new(HoldingId(0), "A", 10_000)).unwrap();
        assert_eq!(
            reg.set_target(HoldingId(0), 20_000),
            Err(PoolError::InvalidPercentage(20_000))
        );
    }

    #[test]
    fn eleventh_holding_exceeds_capacity() {
        let mut reg = full_registry();
        assert_eq!(
            reg.add(Holding::new(HoldingId(10), "Z", 0)),
            Err(PoolError::CapacityExceeded { max: MAX_HOLDINGS })
        );
    }

    #[test]
    fn out_of_range_id_exceeds_capacity() {
        let mut reg = HoldingRegistry::new();
        assert_eq!(
            reg.add(Holding::new(HoldingId(42), "Z", 0)),
            Err(PoolError::CapacityExceeded { max: MAX_HOLDINGS })
        );
    }

    #[test]
    fn deactivated_slot_can_be_reused() {
        let mut reg = full_registry();
        reg.deactivate(HoldingId(4)).unwrap();
        assert_eq!(reg.active_count(), MAX_HOLDINGS - 1);
        assert!(reg.get(HoldingId(4)).is_some());
        assert!(reg.get_active(HoldingId(4)).is_none());

        reg.add(Holding::new(HoldingId(4), "NEW", 500)).unwrap();
        assert_eq!(reg.get_active(HoldingId(4)).unwrap().asset.as_str(), "NEW");
    }

    #[test]
    fn set_target_requires_active_holding() {
        let mut reg = HoldingRegistry::new();
        assert_eq!(
            reg.set_target(HoldingId(1), 100),
            Err(PoolError::HoldingNotFound(HoldingId(1)))
        );
        reg.add(Holding::new(HoldingId(1), "A", 100)).unwrap();
        reg.deactivate(HoldingId(1)).unwrap();
        assert_eq!(
            reg.set_target(HoldingId(1), 100),
            Err(PoolError::HoldingNotFound(HoldingId(1)))
        );
    }

    #[test]
    fn total_allocation_ignores_inactive() {
        let mut reg = HoldingRegistry::new();
        reg.add(Holding::new(HoldingId(0), "A", 6_000)).unwrap();
        reg.add(Holding::new(HoldingId(1), "B", 4_000)).unwrap();
        assert!(reg.validate_total_allocation());

        reg.add(Holding::new(HoldingId(2), "C", 2_500)).unwrap();
        assert_eq!(reg.total_target_allocation(), 12_500);
        assert!(!reg.validate_total_allocation());

        reg.deactivate(HoldingId(2)).unwrap();
        assert!(reg.validate_total_allocation());
    }
}
