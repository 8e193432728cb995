//! Storage key codec
//!
//! A storage key collapses the two addressing schemes the host uses for
//! resources - plain item ids and (material kind, material value) pairs -
//! into one dense `u32`. Values below 65536 are item ids taken as-is;
//! values at or above it pack the material kind into the high 16 bits and
//! the material value into the low 16 bits. Material kind 0 is reserved and
//! never stored, so raw value 0 doubles as the "none" sentinel.
//!
//! The encoding is injective because the host never issues item ids that
//! reach the material range (mod item ids start at 10000 and stay below
//! [`MAX_ITEM_ID`]) and material kinds are always nonzero.

use serde::{Deserialize, Serialize};

/// Highest item id the host will ever issue. Ids at or above 65536 would
/// alias a (material kind, value) pair; the host stays well below that.
pub const MAX_ITEM_ID: u32 = 55_000;

/// Dense identifier for a stored resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StorageKey(u32);

impl StorageKey {
    /// Create a key for an item id.
    pub fn from_item(item_id: u32) -> Self {
        debug_assert!(item_id < MAX_ITEM_ID, "item id {item_id} aliases the material range");
        Self(item_id)
    }

    /// Create a key for a bulk material. `kind` must be nonzero.
    pub fn from_material(kind: u16, value: u16) -> Self {
        debug_assert!(kind != 0, "material kind 0 is reserved");
        Self(((kind as u32) << 16) | value as u32)
    }

    /// Reinterpret a raw `u32`. Returns `None` for the reserved 0 sentinel.
    pub fn from_raw(raw: u32) -> Option<Self> {
        if raw == 0 {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// The raw `u32` form. The "none" sentinel is represented by callers as
    /// `Option::None` and round-trips through raw value 0.
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Whether this key addresses a bulk material rather than an item.
    pub fn is_material(self) -> bool {
        self.0 >= 0x1_0000
    }

    /// Item id, if this key addresses an item.
    pub fn item_id(self) -> Option<u32> {
        if self.is_material() {
            None
        } else {
            Some(self.0)
        }
    }

    /// Material kind (high 16 bits). 0 for item keys.
    pub fn material_kind(self) -> u16 {
        if self.is_material() {
            (self.0 >> 16) as u16
        } else {
            0
        }
    }

    /// Material value (low 16 bits). 0 for item keys.
    pub fn material_value(self) -> u16 {
        if self.is_material() {
            (self.0 & 0xFFFF) as u16
        } else {
            0
        }
    }
}

/// Raw form of an optional key, for wire layouts that use 0 as "unset".
pub fn raw_or_zero(key: Option<StorageKey>) -> u32 {
    key.map(StorageKey::raw).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_key() {
        let key = StorageKey::from_item(4100);
        assert!(!key.is_material());
        assert_eq!(key.item_id(), Some(4100));
        assert_eq!(key.raw(), 4100);
        assert_eq!(key.material_kind(), 0);
    }

    #[test]
    fn test_material_key() {
        let key = StorageKey::from_material(120, 7);
        assert!(key.is_material());
        assert_eq!(key.material_kind(), 120);
        assert_eq!(key.material_value(), 7);
        assert_eq!(key.item_id(), None);
        assert_eq!(key.raw(), (120u32 << 16) | 7);
    }

    #[test]
    fn test_raw_round_trip() {
        let key = StorageKey::from_material(1, 0);
        assert_eq!(StorageKey::from_raw(key.raw()), Some(key));
        assert_eq!(StorageKey::from_raw(0), None);
        assert_eq!(raw_or_zero(None), 0);
        assert_eq!(raw_or_zero(Some(key)), key.raw());
    }

    #[test]
    fn test_injective_across_ranges() {
        // An item id and a material pair can never collide: materials start
        // at 0x10000 and item ids stop below MAX_ITEM_ID.
        let item = StorageKey::from_item(MAX_ITEM_ID - 1);
        let material = StorageKey::from_material(1, (MAX_ITEM_ID - 1) as u16);
        assert_ne!(item, material);
    }
}
