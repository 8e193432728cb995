//! Stack entries
//!
//! A [`StackEntry`] is one addressable inventory slot: all stored units that
//! share a storage key. Bulk kinds keep a single amount. Charge and
//! durability items are compressed into counted buckets keyed by their
//! attribute, so a thousand identical worn tools cost one map entry instead
//! of a thousand records. Location markers carry unique position data and
//! have to be stored individually.
//!
//! Buckets live in `BTreeMap`s: removal drains ascending attribute values,
//! which keeps unit selection deterministic, and serialization walks the
//! buckets in a stable order.

use hopper_core::{StackKind, StorageKey, Unit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Contract violations on a stack entry. These indicate a caller bug, not a
/// data condition; the offending unit rides along so it is never dropped.
#[derive(Debug, Error)]
pub enum StackError {
    /// The unit's kind does not match the entry's stacking strategy.
    #[error("cannot add a {found:?} unit to a {expected:?} entry")]
    KindMismatch {
        expected: StackKind,
        found: StackKind,
        unit: Unit,
    },
}

impl StackError {
    /// Recover the unit that could not be stored.
    pub fn into_unit(self) -> Unit {
        match self {
            StackError::KindMismatch { unit, .. } => unit,
        }
    }
}

/// Storage for a single storage key, polymorphic over stacking strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StackEntry {
    /// Bulk terrain material: one amount.
    BulkMaterial { kind: u16, value: u16, amount: u32 },
    /// Bulk item: one amount.
    BulkItem { id: u32, amount: u32 },
    /// Charge-bearing items bucketed by charge level.
    ChargeBucketed {
        id: u32,
        buckets: BTreeMap<i32, u16>,
    },
    /// Durability-bearing items bucketed by current durability. The maximum
    /// durability is cached to rebuild full units on removal.
    DurabilityBucketed {
        id: u32,
        max_durability: u16,
        buckets: BTreeMap<u16, u16>,
    },
    /// Location markers, stored one record per unit.
    LocationList { id: u32, markers: Vec<Unit> },
}

impl StackEntry {
    /// Create an empty entry for the given strategy and key.
    /// `max_durability` is only used for [`StackKind::DurabilityBucketed`].
    pub fn new(kind: StackKind, key: StorageKey, max_durability: u16) -> Self {
        match kind {
            StackKind::BulkMaterial => StackEntry::BulkMaterial {
                kind: key.material_kind(),
                value: key.material_value(),
                amount: 0,
            },
            StackKind::BulkItem => StackEntry::BulkItem {
                id: key.raw(),
                amount: 0,
            },
            StackKind::ChargeBucketed => StackEntry::ChargeBucketed {
                id: key.raw(),
                buckets: BTreeMap::new(),
            },
            StackKind::DurabilityBucketed => StackEntry::DurabilityBucketed {
                id: key.raw(),
                max_durability,
                buckets: BTreeMap::new(),
            },
            StackKind::LocationList => StackEntry::LocationList {
                id: key.raw(),
                markers: Vec::new(),
            },
        }
    }

    /// Create an empty entry shaped for `unit`, taking durability metadata
    /// from the unit itself.
    pub fn for_unit(unit: &Unit) -> Self {
        let max = match *unit {
            Unit::Durable { max_durability, .. } => max_durability,
            _ => 0,
        };
        Self::new(unit.kind(), unit.storage_key(), max)
    }

    /// Storage key this entry stores.
    pub fn storage_key(&self) -> StorageKey {
        match *self {
            StackEntry::BulkMaterial { kind, value, .. } => StorageKey::from_material(kind, value),
            StackEntry::BulkItem { id, .. }
            | StackEntry::ChargeBucketed { id, .. }
            | StackEntry::DurabilityBucketed { id, .. }
            | StackEntry::LocationList { id, .. } => StorageKey::from_item(id),
        }
    }

    /// Stacking strategy of this entry.
    pub fn kind(&self) -> StackKind {
        match self {
            StackEntry::BulkMaterial { .. } => StackKind::BulkMaterial,
            StackEntry::BulkItem { .. } => StackKind::BulkItem,
            StackEntry::ChargeBucketed { .. } => StackKind::ChargeBucketed,
            StackEntry::DurabilityBucketed { .. } => StackKind::DurabilityBucketed,
            StackEntry::LocationList { .. } => StackKind::LocationList,
        }
    }

    /// Number of units this slot represents. Always the sum of bucket
    /// counts, the list length, or the bulk amount.
    pub fn count(&self) -> u32 {
        match self {
            StackEntry::BulkMaterial { amount, .. } | StackEntry::BulkItem { amount, .. } => {
                *amount
            }
            StackEntry::ChargeBucketed { buckets, .. } => {
                buckets.values().map(|&n| n as u32).sum()
            }
            StackEntry::DurabilityBucketed { buckets, .. } => {
                buckets.values().map(|&n| n as u32).sum()
            }
            StackEntry::LocationList { markers, .. } => markers.len() as u32,
        }
    }

    /// Add one unit (or a bulk amount) to this entry. Capacity is the
    /// caller's concern; this only enforces the kind contract.
    pub fn add_unit(&mut self, unit: Unit) -> Result<(), StackError> {
        if unit.kind() != self.kind() {
            return Err(StackError::KindMismatch {
                expected: self.kind(),
                found: unit.kind(),
                unit,
            });
        }

        match (self, unit) {
            (StackEntry::BulkMaterial { amount, .. }, Unit::Material { amount: add, .. })
            | (StackEntry::BulkItem { amount, .. }, Unit::Item { amount: add, .. }) => {
                *amount += add;
            }
            (StackEntry::ChargeBucketed { buckets, .. }, Unit::Charged { charge, .. }) => {
                *buckets.entry(charge).or_insert(0) += 1;
            }
            (
                StackEntry::DurabilityBucketed { buckets, .. },
                Unit::Durable { durability, .. },
            ) => {
                *buckets.entry(durability).or_insert(0) += 1;
            }
            (StackEntry::LocationList { markers, .. }, unit @ Unit::Location { .. }) => {
                markers.push(unit);
            }
            _ => unreachable!("kind checked above"),
        }
        Ok(())
    }

    /// Remove and materialize exactly one unit. Bucketed kinds drain the
    /// lowest attribute bucket first. Returns `None` when empty.
    pub fn remove_one(&mut self) -> Option<Unit> {
        match self {
            StackEntry::BulkMaterial { kind, value, amount } => {
                if *amount == 0 {
                    return None;
                }
                *amount -= 1;
                Some(Unit::Material {
                    kind: *kind,
                    value: *value,
                    amount: 1,
                })
            }
            StackEntry::BulkItem { id, amount } => {
                if *amount == 0 {
                    return None;
                }
                *amount -= 1;
                Some(Unit::Item { id: *id, amount: 1 })
            }
            StackEntry::ChargeBucketed { id, buckets } => {
                let charge = *buckets.keys().next()?;
                let unit = Unit::Charged { id: *id, charge };
                decrement_bucket(buckets, charge);
                Some(unit)
            }
            StackEntry::DurabilityBucketed {
                id,
                max_durability,
                buckets,
            } => {
                let durability = *buckets.keys().next()?;
                let unit = Unit::Durable {
                    id: *id,
                    durability,
                    max_durability: *max_durability,
                };
                decrement_bucket(buckets, durability);
                Some(unit)
            }
            StackEntry::LocationList { markers, .. } => {
                if markers.is_empty() {
                    None
                } else {
                    Some(markers.remove(0))
                }
            }
        }
    }

    /// Remove up to `amount` units, draining buckets or list entries
    /// greedily. Returns the amount actually removed.
    pub fn remove_amount(&mut self, amount: u32) -> u32 {
        match self {
            StackEntry::BulkMaterial { amount: stored, .. }
            | StackEntry::BulkItem { amount: stored, .. } => {
                let removed = amount.min(*stored);
                *stored -= removed;
                removed
            }
            StackEntry::ChargeBucketed { buckets, .. } => drain_buckets(buckets, amount),
            StackEntry::DurabilityBucketed { buckets, .. } => drain_buckets(buckets, amount),
            StackEntry::LocationList { markers, .. } => {
                let removed = amount.min(markers.len() as u32);
                markers.drain(..removed as usize);
                removed
            }
        }
    }

    /// Visit every stored unit individually, expanding bulk amounts and
    /// buckets into per-unit instances. The visitor returns `false` to stop
    /// early; the method returns `false` if it did.
    pub fn for_each_unit<F: FnMut(&Unit) -> bool>(&self, mut visit: F) -> bool {
        match self {
            StackEntry::BulkMaterial { kind, value, amount } => {
                let unit = Unit::Material {
                    kind: *kind,
                    value: *value,
                    amount: 1,
                };
                for _ in 0..*amount {
                    if !visit(&unit) {
                        return false;
                    }
                }
                true
            }
            StackEntry::BulkItem { id, amount } => {
                let unit = Unit::Item { id: *id, amount: 1 };
                for _ in 0..*amount {
                    if !visit(&unit) {
                        return false;
                    }
                }
                true
            }
            StackEntry::ChargeBucketed { id, buckets } => {
                for (&charge, &n) in buckets {
                    let unit = Unit::Charged { id: *id, charge };
                    for _ in 0..n {
                        if !visit(&unit) {
                            return false;
                        }
                    }
                }
                true
            }
            StackEntry::DurabilityBucketed {
                id,
                max_durability,
                buckets,
            } => {
                for (&durability, &n) in buckets {
                    let unit = Unit::Durable {
                        id: *id,
                        durability,
                        max_durability: *max_durability,
                    };
                    for _ in 0..n {
                        if !visit(&unit) {
                            return false;
                        }
                    }
                }
                true
            }
            StackEntry::LocationList { markers, .. } => {
                for marker in markers {
                    if !visit(marker) {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Reset to empty, keeping the entry's kind and key.
    pub fn clear(&mut self) {
        match self {
            StackEntry::BulkMaterial { amount, .. } | StackEntry::BulkItem { amount, .. } => {
                *amount = 0
            }
            StackEntry::ChargeBucketed { buckets, .. } => buckets.clear(),
            StackEntry::DurabilityBucketed { buckets, .. } => buckets.clear(),
            StackEntry::LocationList { markers, .. } => markers.clear(),
        }
    }

    /// Bulk unit of `amount` for a bulk entry, `None` otherwise.
    pub fn bulk_unit(&self, amount: u32) -> Option<Unit> {
        match *self {
            StackEntry::BulkMaterial { kind, value, .. } => Some(Unit::Material {
                kind,
                value,
                amount,
            }),
            StackEntry::BulkItem { id, .. } => Some(Unit::Item { id, amount }),
            _ => None,
        }
    }
}

fn decrement_bucket<K: Ord + Copy>(buckets: &mut BTreeMap<K, u16>, key: K) {
    if let Some(n) = buckets.get_mut(&key) {
        *n -= 1;
        if *n == 0 {
            buckets.remove(&key);
        }
    }
}

fn drain_buckets<K: Ord + Copy>(buckets: &mut BTreeMap<K, u16>, amount: u32) -> u32 {
    let mut remaining = amount;
    let keys: Vec<K> = buckets.keys().copied().collect();
    for key in keys {
        if remaining == 0 {
            break;
        }
        let n = buckets[&key] as u32;
        if n <= remaining {
            buckets.remove(&key);
            remaining -= n;
        } else {
            *buckets.get_mut(&key).expect("bucket present") -= remaining as u16;
            remaining = 0;
        }
    }
    amount - remaining
}

#[cfg(test)]
mod tests {
    use super::*;

    fn durable(durability: u16) -> Unit {
        Unit::Durable {
            id: 2001,
            durability,
            max_durability: 100,
        }
    }

    #[test]
    fn test_bulk_add_remove() {
        let mut entry = StackEntry::for_unit(&Unit::Material {
            kind: 5,
            value: 0,
            amount: 0,
        });
        entry
            .add_unit(Unit::Material {
                kind: 5,
                value: 0,
                amount: 7,
            })
            .unwrap();
        assert_eq!(entry.count(), 7);
        assert_eq!(entry.remove_amount(3), 3);
        assert_eq!(entry.count(), 4);
        assert_eq!(entry.remove_amount(10), 4);
        assert_eq!(entry.count(), 0);
        assert_eq!(entry.remove_one(), None);
    }

    #[test]
    fn test_bucket_compression() {
        let mut entry = StackEntry::for_unit(&durable(80));
        for _ in 0..1000 {
            entry.add_unit(durable(80)).unwrap();
        }
        assert_eq!(entry.count(), 1000);
        match &entry {
            StackEntry::DurabilityBucketed { buckets, .. } => {
                assert_eq!(buckets.len(), 1);
                assert_eq!(buckets[&80], 1000);
            }
            _ => panic!("wrong entry kind"),
        }
    }

    #[test]
    fn test_remove_one_drains_ascending() {
        let mut entry = StackEntry::for_unit(&durable(80));
        entry.add_unit(durable(80)).unwrap();
        entry.add_unit(durable(20)).unwrap();
        entry.add_unit(durable(50)).unwrap();

        let first = entry.remove_one().unwrap();
        assert_eq!(
            first,
            Unit::Durable {
                id: 2001,
                durability: 20,
                max_durability: 100
            }
        );
        assert_eq!(entry.count(), 2);
    }

    #[test]
    fn test_remove_amount_across_buckets() {
        let mut entry = StackEntry::for_unit(&Unit::Charged { id: 10, charge: 0 });
        for charge in [0, 0, 0, 5, 5, 9] {
            entry.add_unit(Unit::Charged { id: 10, charge }).unwrap();
        }
        assert_eq!(entry.remove_amount(4), 4);
        assert_eq!(entry.count(), 2);
        assert_eq!(entry.remove_amount(10), 2);
        assert_eq!(entry.count(), 0);
    }

    #[test]
    fn test_kind_mismatch_returns_unit() {
        let mut entry = StackEntry::for_unit(&Unit::Item { id: 7, amount: 0 });
        let err = entry
            .add_unit(Unit::Charged { id: 7, charge: 1 })
            .unwrap_err();
        assert_eq!(err.into_unit(), Unit::Charged { id: 7, charge: 1 });
    }

    #[test]
    fn test_iterate_expands_and_stops() {
        let mut entry = StackEntry::for_unit(&Unit::Item { id: 7, amount: 0 });
        entry.add_unit(Unit::Item { id: 7, amount: 5 }).unwrap();

        let mut seen = 0;
        let finished = entry.for_each_unit(|unit| {
            assert_eq!(unit.amount(), 1);
            seen += 1;
            seen < 3
        });
        assert!(!finished);
        assert_eq!(seen, 3);

        let mut total = 0;
        assert!(entry.for_each_unit(|_| {
            total += 1;
            true
        }));
        assert_eq!(total, 5);
    }

    #[test]
    fn test_location_list_is_ordered() {
        let marker = |x: i64| Unit::Location {
            id: 900,
            position: [x, 0, 0],
            label: format!("m{x}"),
        };
        let mut entry = StackEntry::for_unit(&marker(0));
        entry.add_unit(marker(1)).unwrap();
        entry.add_unit(marker(2)).unwrap();
        assert_eq!(entry.remove_one(), Some(marker(1)));
        assert_eq!(entry.count(), 1);
        entry.clear();
        assert_eq!(entry.count(), 0);
    }
}
