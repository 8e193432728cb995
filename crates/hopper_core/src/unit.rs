//! Resource units
//!
//! A [`Unit`] is the host's transferable resource: bulk terrain material,
//! bulk items, and the attributed kinds that cannot share a plain counter
//! (charge level, durability, location markers).

use crate::key::StorageKey;
use serde::{Deserialize, Serialize};

/// Stacking strategy used to store units of a given kind. The discriminants
/// are wire tags and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StackKind {
    /// Bulk terrain material, stored as a single amount.
    BulkMaterial = 0,
    /// Bulk item, stored as a single amount.
    BulkItem = 1,
    /// Charge-bearing items, bucketed by charge level.
    ChargeBucketed = 2,
    /// Durability-bearing items, bucketed by current durability.
    DurabilityBucketed = 3,
    /// Location markers, stored individually.
    LocationList = 4,
}

impl StackKind {
    /// Decode a wire tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::BulkMaterial),
            1 => Some(Self::BulkItem),
            2 => Some(Self::ChargeBucketed),
            3 => Some(Self::DurabilityBucketed),
            4 => Some(Self::LocationList),
            _ => None,
        }
    }

    /// Whether this kind stores a plain amount rather than per-unit records.
    pub fn is_bulk(self) -> bool {
        matches!(self, Self::BulkMaterial | Self::BulkItem)
    }
}

/// A transferable resource unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Unit {
    /// Bulk terrain material.
    Material { kind: u16, value: u16, amount: u32 },
    /// Bulk item. A single loose item is an amount of 1.
    Item { id: u32, amount: u32 },
    /// Charge-bearing item.
    Charged { id: u32, charge: i32 },
    /// Durability-bearing item.
    Durable {
        id: u32,
        durability: u16,
        max_durability: u16,
    },
    /// Location marker. Carries unique position data and cannot be bucketed.
    Location {
        id: u32,
        position: [i64; 3],
        label: String,
    },
}

impl Unit {
    /// Storage key addressing this unit's slot.
    pub fn storage_key(&self) -> StorageKey {
        match *self {
            Unit::Material { kind, value, .. } => StorageKey::from_material(kind, value),
            Unit::Item { id, .. }
            | Unit::Charged { id, .. }
            | Unit::Durable { id, .. }
            | Unit::Location { id, .. } => StorageKey::from_item(id),
        }
    }

    /// Stacking strategy for this unit.
    pub fn kind(&self) -> StackKind {
        match self {
            Unit::Material { .. } => StackKind::BulkMaterial,
            Unit::Item { .. } => StackKind::BulkItem,
            Unit::Charged { .. } => StackKind::ChargeBucketed,
            Unit::Durable { .. } => StackKind::DurabilityBucketed,
            Unit::Location { .. } => StackKind::LocationList,
        }
    }

    /// Number of individual units this value represents.
    pub fn amount(&self) -> u32 {
        match *self {
            Unit::Material { amount, .. } | Unit::Item { amount, .. } => amount,
            _ => 1,
        }
    }

    /// Copy of this unit carrying a different bulk amount. Attributed kinds
    /// always represent one unit and are returned unchanged.
    pub fn with_amount(&self, new_amount: u32) -> Unit {
        match *self {
            Unit::Material { kind, value, .. } => Unit::Material {
                kind,
                value,
                amount: new_amount,
            },
            Unit::Item { id, .. } => Unit::Item {
                id,
                amount: new_amount,
            },
            ref other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_keys_and_kinds() {
        let material = Unit::Material {
            kind: 42,
            value: 1,
            amount: 10,
        };
        assert_eq!(material.kind(), StackKind::BulkMaterial);
        assert_eq!(material.storage_key(), StorageKey::from_material(42, 1));
        assert_eq!(material.amount(), 10);

        let tool = Unit::Durable {
            id: 2001,
            durability: 80,
            max_durability: 100,
        };
        assert_eq!(tool.kind(), StackKind::DurabilityBucketed);
        assert_eq!(tool.amount(), 1);
        assert_eq!(tool.storage_key(), StorageKey::from_item(2001));
    }

    #[test]
    fn test_with_amount() {
        let items = Unit::Item { id: 7, amount: 5 };
        assert_eq!(items.with_amount(2).amount(), 2);

        let marker = Unit::Location {
            id: 900,
            position: [1, 2, 3],
            label: "base".into(),
        };
        // Attributed units ignore the amount override.
        assert_eq!(marker.with_amount(5), marker);
    }

    #[test]
    fn test_stack_kind_tags() {
        for kind in [
            StackKind::BulkMaterial,
            StackKind::BulkItem,
            StackKind::ChargeBucketed,
            StackKind::DurabilityBucketed,
            StackKind::LocationList,
        ] {
            assert_eq!(StackKind::from_tag(kind as u8), Some(kind));
        }
        assert_eq!(StackKind::from_tag(5), None);
    }
}
