//! Cross-hopper rebalancing
//!
//! When two hoppers sit next to each other and the source has content
//! sharing enabled, stored units flow from the fuller hopper to the
//! emptier one. The policy is stateless; the agent only carries the
//! fixed-interval throttle so the transfer does not run every tick.

use crate::container::ExtractOptions;
use crate::hopper::StorageHopper;
use hopper_core::{Permissions, Taxonomy, Unit};

/// Ticks between rebalance runs.
pub const REBALANCE_INTERVAL: u32 = 5;

/// Source hoppers holding this many units or fewer do not share; moving
/// the last couple of units back and forth is churn, not balance.
pub const SHARE_EPSILON: u32 = 2;

/// Throttled fuller-to-emptier transfer policy between two hoppers.
#[derive(Debug, Clone)]
pub struct RebalanceAgent {
    interval: u32,
    ticks: u32,
}

impl Default for RebalanceAgent {
    fn default() -> Self {
        Self::new(REBALANCE_INTERVAL)
    }
}

impl RebalanceAgent {
    pub fn new(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
            ticks: 0,
        }
    }

    /// Advance the throttle; runs the policy every `interval`-th call.
    /// Returns the number of units moved.
    pub fn tick(
        &mut self,
        source: &mut StorageHopper,
        target: &mut StorageHopper,
        taxonomy: &dyn Taxonomy,
    ) -> u32 {
        self.ticks += 1;
        if self.ticks < self.interval {
            return 0;
        }
        self.ticks = 0;
        Self::run(source, target, taxonomy)
    }

    /// Run the transfer policy once, ignoring the throttle.
    pub fn run(
        source: &mut StorageHopper,
        target: &mut StorageHopper,
        taxonomy: &dyn Taxonomy,
    ) -> u32 {
        if !source.content_sharing_on
            || source.permissions() == Permissions::Locked
            || target.permissions() == Permissions::Locked
            || source.container().used_capacity() <= SHARE_EPSILON
        {
            return 0;
        }

        let source_total = source.container().max_capacity() as f64;
        let target_total = target.container().max_capacity() as f64;
        if source_total == 0.0 || target_total == 0.0 {
            return 0;
        }

        // Only flow from fuller to emptier.
        let source_ratio = source.container().used_capacity() as f64 / source_total;
        let target_ratio = target.container().used_capacity() as f64 / target_total;
        if source_ratio <= target_ratio {
            return 0;
        }

        let mut transfer = ((source_ratio - target_ratio) * 0.5 * target_total) as u32;
        if transfer < 1 {
            return 0;
        }
        transfer = transfer.min(target.container().remaining_capacity());
        log::debug!(
            "rebalance: moving up to {transfer} units ({:.2} -> {:.2})",
            source_ratio,
            target_ratio
        );

        // A one-type target with its lock set only receives that key.
        if target.container().is_one_type() {
            if let Some(locked) = target.container().one_type_key() {
                let options = ExtractOptions::for_key(locked);
                if locked.is_material() {
                    // Bulk material moves as one all-or-nothing transfer.
                    let options = options.with_amounts(transfer, transfer);
                    return match source.container_mut().extract(&options, taxonomy) {
                        Some(extracted) => {
                            Self::deliver(source, target, extracted.unit, extracted.amount)
                        }
                        None => 0,
                    };
                }

                let mut moved = 0;
                while moved < transfer {
                    let options = options.with_amounts(1, transfer - moved);
                    let extracted = match source.container_mut().extract(&options, taxonomy) {
                        Some(extracted) if extracted.amount > 0 => extracted,
                        _ => break,
                    };
                    let amount = extracted.amount;
                    if Self::deliver(source, target, extracted.unit, amount) == 0 {
                        break;
                    }
                    moved += amount;
                }
                return moved;
            }
        }

        // Any key may move, selected by the fairness algorithm.
        let mut moved = 0;
        while moved < transfer {
            let options = ExtractOptions::any().with_amounts(1, transfer - moved);
            let extracted = match source.container_mut().extract(&options, taxonomy) {
                Some(extracted) if extracted.amount > 0 => extracted,
                _ => break,
            };
            let amount = extracted.amount;
            if Self::deliver(source, target, extracted.unit, amount) == 0 {
                break;
            }
            moved += amount;
            // An unset one-type lock auto-detects on the first delivery;
            // stop there rather than guess what else it now accepts.
            if target.container().is_one_type() {
                break;
            }
        }
        moved
    }

    /// Insert into the target; on failure the unit goes back into the
    /// source, never the floor.
    fn deliver(
        source: &mut StorageHopper,
        target: &mut StorageHopper,
        unit: Unit,
        amount: u32,
    ) -> u32 {
        match target.container_mut().insert(unit) {
            Ok(()) => amount,
            Err(rejected) => {
                log::debug!("rebalance insert rejected: {}", rejected.reason);
                if source.container_mut().load_unit(rejected.unit).is_err() {
                    log::warn!("rebalance put-back failed; unit lost");
                }
                0
            }
        }
    }
}
