//! Inventory container
//!
//! Maps storage keys to stack entries, enforces capacity, permissions and
//! the one-type lock, and implements round-robin filtered extraction.
//!
//! Fairness: the container keeps a cursor into its key list that persists
//! across extraction calls. Repeated "take one" requests (a conveyor pulling
//! every tick) therefore cycle through all occupied keys instead of draining
//! the first match forever.

use crate::stack::StackEntry;
use hopper_core::{Permissions, RequestKind, StorageKey, Taxonomy, Unit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Why an insert was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Permission mode forbids adding.
    #[error("permissions forbid adding")]
    NotPermitted,
    /// One-type lock is set to a different key.
    #[error("container is locked to another type")]
    TypeLocked,
    /// The unit would not fit in the remaining capacity.
    #[error("insufficient capacity")]
    Overflow,
    /// Zero-amount bulk units are never stored.
    #[error("zero amount")]
    ZeroAmount,
    /// The key is already stored under a different stacking kind.
    #[error("stacking kind mismatch")]
    KindMismatch,
}

/// A refused insert. Carries the unit back so the caller can return it to
/// wherever it came from.
#[derive(Debug, Error)]
#[error("insert rejected: {reason}")]
pub struct RejectedUnit {
    pub unit: Unit,
    pub reason: RejectReason,
}

/// Target filter for extraction: a specific key, optionally inverted by
/// [`ExtractOptions::invert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Exemplar {
    /// No exemplar; only the request type filters.
    #[default]
    None,
    /// Match a specific item id.
    Item(u32),
    /// Match a material kind/value pair.
    Material { kind: u16, value: u16 },
}

impl Exemplar {
    fn exact_key(self) -> Option<StorageKey> {
        match self {
            Exemplar::None => None,
            Exemplar::Item(id) => Some(StorageKey::from_item(id)),
            Exemplar::Material { kind, value } => Some(StorageKey::from_material(kind, value)),
        }
    }
}

/// How exemplar material matching treats the `u16::MAX` value sentinel.
/// The two observed variants of the extraction algorithm disagree on this
/// axis, so it is a policy rather than a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wildcard {
    /// Material value `u16::MAX` on the exemplar matches any stored value.
    #[default]
    ValueSentinel,
    /// The exemplar value must match exactly.
    Exact,
}

/// Filter set for [`InventoryContainer::extract`] and the count/purge scans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractOptions {
    /// Host request category. `Any` passes everything.
    pub request: RequestKind,
    /// Target key filter.
    pub exemplar: Exemplar,
    /// Invert the exemplar and request checks ("take anything except X").
    pub invert: bool,
    /// Bulk stacks must hold at least this many units to be selected.
    pub min_amount: u32,
    /// Upper bound on the units removed.
    pub max_amount: u32,
    /// Only consider keys the requester's research knows.
    pub known_only: bool,
    /// Wildcard policy for material exemplars.
    pub wildcard: Wildcard,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            request: RequestKind::Any,
            exemplar: Exemplar::None,
            invert: false,
            min_amount: 1,
            max_amount: 1,
            known_only: false,
            wildcard: Wildcard::default(),
        }
    }
}

impl ExtractOptions {
    /// Take anything.
    pub fn any() -> Self {
        Self::default()
    }

    /// Take a specific item id.
    pub fn for_item(id: u32) -> Self {
        Self {
            exemplar: Exemplar::Item(id),
            ..Self::default()
        }
    }

    /// Take a specific material. Value `u16::MAX` acts as a wildcard under
    /// the default policy.
    pub fn for_material(kind: u16, value: u16) -> Self {
        Self {
            exemplar: Exemplar::Material { kind, value },
            ..Self::default()
        }
    }

    /// Take whatever matches a host request category.
    pub fn for_request(request: RequestKind) -> Self {
        Self {
            request,
            ..Self::default()
        }
    }

    /// Take a specific stored key.
    pub fn for_key(key: StorageKey) -> Self {
        if key.is_material() {
            Self::for_material(key.material_kind(), key.material_value())
        } else {
            Self::for_item(key.raw())
        }
    }

    /// Set minimum and maximum amounts.
    pub fn with_amounts(mut self, min: u32, max: u32) -> Self {
        self.min_amount = min;
        self.max_amount = max;
        self
    }

    /// Invert the match ("anything except").
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    /// Only extract known resources.
    pub fn known_only(mut self) -> Self {
        self.known_only = true;
        self
    }

    /// Use exact exemplar value matching instead of the wildcard sentinel.
    pub fn exact_values(mut self) -> Self {
        self.wildcard = Wildcard::Exact;
        self
    }
}

/// A successful extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    /// The removed unit. For bulk kinds it carries the whole amount; for
    /// attributed kinds it is a single unit.
    pub unit: Unit,
    /// Units removed.
    pub amount: u32,
}

/// Capacity-bounded stacking inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryContainer {
    entries: BTreeMap<StorageKey, StackEntry>,
    max_capacity: u16,
    used_capacity: u32,
    active_slots: u32,
    #[serde(skip)]
    cursor: usize,
    one_type: bool,
    one_type_key: Option<StorageKey>,
    permissions: Permissions,
}

impl InventoryContainer {
    /// Create an empty container.
    pub fn new(max_capacity: u16) -> Self {
        Self {
            entries: BTreeMap::new(),
            max_capacity,
            used_capacity: 0,
            active_slots: 0,
            cursor: 0,
            one_type: false,
            one_type_key: None,
            permissions: Permissions::default(),
        }
    }

    /// Create an empty one-type container. The lock key is detected from
    /// the first deposit unless set explicitly.
    pub fn new_one_type(max_capacity: u16) -> Self {
        let mut container = Self::new(max_capacity);
        container.one_type = true;
        container
    }

    pub fn max_capacity(&self) -> u16 {
        self.max_capacity
    }

    /// Sum of `count()` over all entries.
    pub fn used_capacity(&self) -> u32 {
        self.used_capacity
    }

    pub fn remaining_capacity(&self) -> u32 {
        (self.max_capacity as u32).saturating_sub(self.used_capacity)
    }

    /// Number of keys currently holding at least one unit.
    pub fn active_slots(&self) -> u32 {
        self.active_slots
    }

    pub fn is_empty(&self) -> bool {
        self.used_capacity == 0
    }

    pub fn is_full(&self) -> bool {
        self.remaining_capacity() == 0
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    /// Change the permission mode. Existing content is never evicted; the
    /// mode only affects future insert/extract calls.
    pub fn set_permissions(&mut self, permissions: Permissions) {
        self.permissions = permissions;
    }

    pub fn is_one_type(&self) -> bool {
        self.one_type
    }

    pub fn one_type_key(&self) -> Option<StorageKey> {
        self.one_type_key
    }

    /// Set or clear the one-type lock key. Does not evict existing content.
    pub fn set_one_type_key(&mut self, key: Option<StorageKey>) {
        self.one_type_key = key;
    }

    /// Enable or disable the one-type constraint.
    pub fn set_one_type(&mut self, enabled: bool) {
        self.one_type = enabled;
    }

    /// Used by the persistence codec when rebuilding a saved container.
    pub fn set_max_capacity(&mut self, max_capacity: u16) {
        self.max_capacity = max_capacity;
    }

    /// Stored units for one key.
    pub fn count_of(&self, key: StorageKey) -> u32 {
        self.entries.get(&key).map_or(0, StackEntry::count)
    }

    /// Iterate entries, including zero-count ones awaiting pruning.
    pub fn entries(&self) -> impl Iterator<Item = &StackEntry> {
        self.entries.values()
    }

    /// Visit every stored unit individually. The visitor returns `false`
    /// to stop.
    pub fn for_each_unit<F: FnMut(&Unit) -> bool>(&self, mut visit: F) {
        for entry in self.entries.values() {
            if !entry.for_each_unit(&mut visit) {
                return;
            }
        }
    }

    /// Insert a unit, all or nothing.
    pub fn insert(&mut self, unit: Unit) -> Result<(), RejectedUnit> {
        if !self.permissions.allows_add() {
            return Err(RejectedUnit {
                unit,
                reason: RejectReason::NotPermitted,
            });
        }
        self.load_unit(unit)
    }

    /// Insert as much of a bulk unit as fits. Returns the amount stored and
    /// the remainder unit, if any.
    pub fn insert_partial(&mut self, unit: Unit) -> (u32, Option<Unit>) {
        if !self.permissions.allows_add() {
            return (0, Some(unit));
        }
        let amount = unit.amount();
        let remaining = self.remaining_capacity();
        if amount == 0 || remaining == 0 {
            return (0, Some(unit));
        }

        if unit.kind().is_bulk() && amount > remaining {
            let fitting = unit.with_amount(remaining);
            match self.load_unit(fitting) {
                Ok(()) => (remaining, Some(unit.with_amount(amount - remaining))),
                Err(rejected) => (0, Some(rejected.unit.with_amount(amount))),
            }
        } else {
            match self.load_unit(unit) {
                Ok(()) => (amount, None),
                Err(rejected) => (0, Some(rejected.unit)),
            }
        }
    }

    /// Restore path used by the persistence codec and by rebalance
    /// put-backs: enforces the one-type lock and capacity but ignores the
    /// permission mode.
    pub fn load_unit(&mut self, unit: Unit) -> Result<(), RejectedUnit> {
        let amount = unit.amount();
        if amount == 0 {
            return Err(RejectedUnit {
                unit,
                reason: RejectReason::ZeroAmount,
            });
        }
        let key = unit.storage_key();
        if !self.key_allowed(key) {
            return Err(RejectedUnit {
                unit,
                reason: RejectReason::TypeLocked,
            });
        }
        if amount > self.remaining_capacity() {
            return Err(RejectedUnit {
                unit,
                reason: RejectReason::Overflow,
            });
        }

        let entry = self
            .entries
            .entry(key)
            .or_insert_with(|| StackEntry::for_unit(&unit));
        if let Err(err) = entry.add_unit(unit) {
            return Err(RejectedUnit {
                unit: err.into_unit(),
                reason: RejectReason::KindMismatch,
            });
        }
        self.recount();
        Ok(())
    }

    /// One-type gate. An unset lock auto-detects from the first deposit.
    fn key_allowed(&mut self, key: StorageKey) -> bool {
        if !self.one_type {
            return true;
        }
        match self.one_type_key {
            None => {
                log::debug!("one-type lock auto-set to {:?}", key);
                self.one_type_key = Some(key);
                true
            }
            Some(locked) => locked == key,
        }
    }

    /// Round-robin filtered extraction. See the module docs for the
    /// fairness contract; filters apply in exemplar, request, known order.
    pub fn extract(
        &mut self,
        options: &ExtractOptions,
        taxonomy: &dyn Taxonomy,
    ) -> Option<Extracted> {
        if !self.permissions.allows_remove() {
            return None;
        }
        if options.request == RequestKind::None && options.exemplar == Exemplar::None {
            return None;
        }
        if options.max_amount == 0 {
            return None;
        }

        // Direct pull: an uninverted any-request with a concrete exemplar
        // skips the scan entirely.
        let mut selected = None;
        if !options.invert && options.request == RequestKind::Any {
            if let Some(key) = options.exemplar.exact_key() {
                if self.entries.contains_key(&key) {
                    selected = Some(key);
                }
            }
        }

        if selected.is_none() {
            let keys: Vec<StorageKey> = self.entries.keys().copied().collect();
            for _ in 0..keys.len() {
                self.cursor = (self.cursor + 1) % keys.len();
                let key = keys[self.cursor];
                let entry = &self.entries[&key];

                if !self.passes_filters(key, options, taxonomy) {
                    continue;
                }

                let count = entry.count();
                let eligible = if entry.kind().is_bulk() {
                    count >= options.min_amount
                } else {
                    count > 0 && options.min_amount <= 1
                };
                if eligible {
                    selected = Some(key);
                    break;
                }
            }
        }

        let key = selected?;
        let entry = self.entries.get_mut(&key)?;
        // Direct pulls can land on a lazily retained empty entry.
        if entry.count() == 0 {
            return None;
        }

        let extracted = if entry.kind().is_bulk() {
            let take = entry.count().min(options.max_amount);
            let unit = entry.bulk_unit(take)?;
            entry.remove_amount(take);
            Extracted { unit, amount: take }
        } else {
            let unit = entry.remove_one()?;
            Extracted { unit, amount: 1 }
        };
        self.recount();
        Some(extracted)
    }

    /// Count stored units matching the filters without mutating anything.
    pub fn count_matching(&self, options: &ExtractOptions, taxonomy: &dyn Taxonomy) -> u32 {
        if options.request == RequestKind::None && options.exemplar == Exemplar::None {
            return 0;
        }
        self.entries
            .keys()
            .filter(|&&key| self.passes_filters(key, options, taxonomy))
            .map(|key| self.entries[key].count())
            .sum()
    }

    /// Disposal mode: clear every matching entry, not just the first.
    /// Returns the number of units destroyed.
    pub fn purge_matching(&mut self, options: &ExtractOptions, taxonomy: &dyn Taxonomy) -> u32 {
        if !self.permissions.allows_remove() {
            return 0;
        }
        let keys: Vec<StorageKey> = self
            .entries
            .keys()
            .copied()
            .filter(|&key| self.passes_filters(key, options, taxonomy))
            .collect();
        let mut purged = 0;
        for key in keys {
            let entry = self.entries.get_mut(&key).expect("key just listed");
            purged += entry.count();
            entry.clear();
        }
        if purged > 0 {
            self.recount();
        }
        purged
    }

    /// Drain up to `limit` units into a list, walking entries in key order.
    /// Bulk stacks come out as one unit each; attributed kinds come out as
    /// individual units.
    pub fn unload(&mut self, limit: u32) -> Vec<Unit> {
        let mut cargo = Vec::new();
        let mut remaining = limit.min(self.used_capacity);
        if remaining == 0 {
            return cargo;
        }

        for entry in self.entries.values_mut() {
            if remaining == 0 {
                break;
            }
            if entry.kind().is_bulk() {
                let take = entry.count().min(remaining);
                if take == 0 {
                    continue;
                }
                if let Some(unit) = entry.bulk_unit(take) {
                    entry.remove_amount(take);
                    remaining -= take;
                    cargo.push(unit);
                }
            } else {
                while remaining > 0 {
                    match entry.remove_one() {
                        Some(unit) => {
                            cargo.push(unit);
                            remaining -= 1;
                        }
                        None => break,
                    }
                }
            }
        }
        self.recount();
        cargo
    }

    /// Drop zero-count entries. Called at serialization time; during
    /// extraction they are merely skipped, so a scan in progress never sees
    /// its key list shift.
    pub fn prune_empty(&mut self) {
        self.entries.retain(|_, entry| entry.count() > 0);
        self.cursor = 0;
        self.recount();
    }

    /// Insert a rebuilt entry directly, replacing any existing entry for
    /// its key. Persistence codec use only; capacity is recounted, not
    /// enforced, exactly like the save format it mirrors.
    pub fn restore_entry(&mut self, entry: StackEntry) {
        self.entries.insert(entry.storage_key(), entry);
        self.recount();
    }

    /// Internal removal that bypasses permission gates. Machine-level
    /// passes (spoilage) mutate their own storage regardless of mode.
    pub(crate) fn take_from(&mut self, key: StorageKey, amount: u32) -> u32 {
        let removed = match self.entries.get_mut(&key) {
            Some(entry) => entry.remove_amount(amount),
            None => 0,
        };
        if removed > 0 {
            self.recount();
        }
        removed
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
        self.recount();
    }

    fn passes_filters(
        &self,
        key: StorageKey,
        options: &ExtractOptions,
        taxonomy: &dyn Taxonomy,
    ) -> bool {
        match options.exemplar {
            Exemplar::None => {}
            Exemplar::Item(id) => {
                let matched = !key.is_material() && key.raw() == id;
                if matched == options.invert {
                    return false;
                }
            }
            Exemplar::Material { kind, value } => {
                let wildcard =
                    options.wildcard == Wildcard::ValueSentinel && value == u16::MAX;
                let matched = key.is_material()
                    && key.material_kind() == kind
                    && (wildcard || key.material_value() == value);
                if matched == options.invert {
                    return false;
                }
            }
        }

        if options.request != RequestKind::Any {
            let matched = taxonomy.matches(options.request, key);
            if matched == options.invert {
                return false;
            }
        }

        if options.known_only && !taxonomy.is_known(key) {
            return false;
        }

        true
    }

    fn recount(&mut self) {
        let mut used = 0;
        let mut slots = 0;
        for entry in self.entries.values() {
            let count = entry.count();
            used += count;
            if count > 0 {
                slots += 1;
            }
        }
        self.used_capacity = used;
        self.active_slots = slots;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopper_core::OpenTaxonomy;

    fn material(kind: u16, amount: u32) -> Unit {
        Unit::Material {
            kind,
            value: 0,
            amount,
        }
    }

    #[test]
    fn test_capacity_scenario() {
        let mut container = InventoryContainer::new(10);

        assert!(container.insert(material(5, 7)).is_ok());
        assert_eq!(container.used_capacity(), 7);

        // 7 + 5 would overflow: rejected outright.
        let rejected = container.insert(material(5, 5)).unwrap_err();
        assert_eq!(rejected.reason, RejectReason::Overflow);
        assert_eq!(rejected.unit.amount(), 5);
        assert_eq!(container.used_capacity(), 7);

        // Partial insert stores what fits and reports the remainder.
        let (stored, remainder) = container.insert_partial(material(5, 5));
        assert_eq!(stored, 3);
        assert_eq!(remainder, Some(material(5, 2)));
        assert_eq!(container.used_capacity(), 10);
        assert!(container.is_full());

        let out = container
            .extract(
                &ExtractOptions::for_material(5, 0).with_amounts(1, 10),
                &OpenTaxonomy,
            )
            .unwrap();
        assert_eq!(out.amount, 10);
        assert_eq!(container.used_capacity(), 0);
        assert!(container.is_empty());
    }

    #[test]
    fn test_used_capacity_tracks_entry_counts() {
        let mut container = InventoryContainer::new(100);
        container.insert(material(1, 20)).unwrap();
        container.insert(Unit::Item { id: 7, amount: 5 }).unwrap();
        container
            .insert(Unit::Charged { id: 9, charge: 3 })
            .unwrap();

        let total: u32 = container.entries().map(StackEntry::count).sum();
        assert_eq!(container.used_capacity(), total);
        assert_eq!(container.used_capacity(), 26);
        assert_eq!(container.active_slots(), 3);

        container
            .extract(&ExtractOptions::any().with_amounts(1, 5), &OpenTaxonomy)
            .unwrap();
        let total: u32 = container.entries().map(StackEntry::count).sum();
        assert_eq!(container.used_capacity(), total);
    }

    #[test]
    fn test_fairness_cycles_all_keys() {
        let mut container = InventoryContainer::new(100);
        for kind in 1..=4u16 {
            container.insert(material(kind, 5)).unwrap();
        }

        let mut seen = Vec::new();
        for _ in 0..4 {
            let out = container
                .extract(&ExtractOptions::any().with_amounts(1, 1), &OpenTaxonomy)
                .unwrap();
            seen.push(out.unit.storage_key());
        }
        seen.sort();
        seen.dedup();
        // Four single-unit pulls hit four distinct keys before any repeat.
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_one_type_auto_detect_and_enforcement() {
        let mut container = InventoryContainer::new_one_type(50);
        assert_eq!(container.one_type_key(), None);

        container.insert(material(9, 3)).unwrap();
        assert_eq!(
            container.one_type_key(),
            Some(StorageKey::from_material(9, 0))
        );

        let rejected = container.insert(material(10, 1)).unwrap_err();
        assert_eq!(rejected.reason, RejectReason::TypeLocked);

        // Same key still accepted, subject to capacity.
        assert!(container.insert(material(9, 1)).is_ok());
        assert_eq!(container.used_capacity(), 4);
    }

    #[test]
    fn test_permission_gates() {
        let mut container = InventoryContainer::new(10);
        container.insert(material(1, 5)).unwrap();

        container.set_permissions(Permissions::RemoveOnly);
        let rejected = container.insert(material(1, 1)).unwrap_err();
        assert_eq!(rejected.reason, RejectReason::NotPermitted);
        assert!(container
            .extract(&ExtractOptions::any(), &OpenTaxonomy)
            .is_some());

        container.set_permissions(Permissions::AddOnly);
        assert!(container
            .extract(&ExtractOptions::any(), &OpenTaxonomy)
            .is_none());
        assert!(container.insert(material(1, 1)).is_ok());

        container.set_permissions(Permissions::Locked);
        assert!(container.insert(material(1, 1)).is_err());
        assert!(container
            .extract(&ExtractOptions::any(), &OpenTaxonomy)
            .is_none());
        // Content untouched by mode changes.
        assert_eq!(container.used_capacity(), 5);
    }

    #[test]
    fn test_inverted_exemplar_takes_everything_else() {
        let mut container = InventoryContainer::new(100);
        container.insert(material(1, 5)).unwrap();
        container.insert(material(2, 5)).unwrap();

        let options = ExtractOptions::for_material(1, 0)
            .inverted()
            .with_amounts(1, 10);
        for _ in 0..1 {
            let out = container.extract(&options, &OpenTaxonomy).unwrap();
            assert_eq!(out.unit.storage_key(), StorageKey::from_material(2, 0));
        }
        // Nothing but kind 1 left: inverted filter now matches nothing.
        assert!(container.extract(&options, &OpenTaxonomy).is_none());
        assert_eq!(container.count_of(StorageKey::from_material(1, 0)), 5);
    }

    #[test]
    fn test_wildcard_value_policy() {
        let mut container = InventoryContainer::new(100);
        container.insert(Unit::Material {
            kind: 3,
            value: 7,
            amount: 4,
        })
        .unwrap();

        let wild = ExtractOptions::for_material(3, u16::MAX).with_amounts(1, 4);
        let out = container.extract(&wild, &OpenTaxonomy).unwrap();
        assert_eq!(out.amount, 4);

        container
            .insert(Unit::Material {
                kind: 3,
                value: 7,
                amount: 4,
            })
            .unwrap();
        let exact = ExtractOptions::for_material(3, u16::MAX)
            .exact_values()
            .with_amounts(1, 4);
        assert!(container.extract(&exact, &OpenTaxonomy).is_none());
    }

    #[test]
    fn test_count_matching_does_not_mutate() {
        let mut container = InventoryContainer::new(100);
        container.insert(material(1, 5)).unwrap();
        container.insert(Unit::Item { id: 7, amount: 3 }).unwrap();

        let count = container.count_matching(&ExtractOptions::any(), &OpenTaxonomy);
        assert_eq!(count, 8);
        assert_eq!(container.used_capacity(), 8);

        let item_only = container.count_matching(&ExtractOptions::for_item(7), &OpenTaxonomy);
        assert_eq!(item_only, 3);
    }

    #[test]
    fn test_purge_matching_clears_all_matches() {
        let mut container = InventoryContainer::new(100);
        container.insert(material(1, 5)).unwrap();
        container.insert(material(2, 5)).unwrap();
        container.insert(Unit::Item { id: 7, amount: 3 }).unwrap();

        let purged = container.purge_matching(
            &ExtractOptions::for_item(7).inverted(),
            &OpenTaxonomy,
        );
        assert_eq!(purged, 10);
        assert_eq!(container.used_capacity(), 3);
        assert_eq!(container.count_of(StorageKey::from_item(7)), 3);
    }

    #[test]
    fn test_empty_entries_skipped_not_removed() {
        let mut container = InventoryContainer::new(100);
        container.insert(material(1, 1)).unwrap();
        container.insert(material(2, 1)).unwrap();

        // Drain kind 1 completely; its entry stays in the map.
        container
            .extract(&ExtractOptions::for_material(1, 0), &OpenTaxonomy)
            .unwrap();
        assert_eq!(container.entries().count(), 2);

        // Scans skip it and still find the other key.
        let out = container
            .extract(&ExtractOptions::any(), &OpenTaxonomy)
            .unwrap();
        assert_eq!(out.unit.storage_key(), StorageKey::from_material(2, 0));

        container.prune_empty();
        assert_eq!(container.entries().count(), 0);
    }

    #[test]
    fn test_min_amount_skips_small_stacks() {
        let mut container = InventoryContainer::new(100);
        container.insert(material(1, 2)).unwrap();
        container.insert(material(2, 9)).unwrap();

        let out = container
            .extract(&ExtractOptions::any().with_amounts(5, 9), &OpenTaxonomy)
            .unwrap();
        assert_eq!(out.unit.storage_key(), StorageKey::from_material(2, 0));
        assert_eq!(out.amount, 9);
    }

    #[test]
    fn test_unload_drains_in_key_order() {
        let mut container = InventoryContainer::new(100);
        container.insert(Unit::Item { id: 7, amount: 4 }).unwrap();
        container
            .insert(Unit::Charged { id: 9, charge: 2 })
            .unwrap();

        let cargo = container.unload(10);
        assert_eq!(cargo.len(), 2);
        assert_eq!(container.used_capacity(), 0);

        let total: u32 = cargo.iter().map(Unit::amount).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn test_request_none_yields_nothing() {
        let mut container = InventoryContainer::new(10);
        container.insert(material(1, 5)).unwrap();
        let options = ExtractOptions {
            request: RequestKind::None,
            ..ExtractOptions::default()
        };
        assert!(container.extract(&options, &OpenTaxonomy).is_none());
        assert_eq!(container.count_matching(&options, &OpenTaxonomy), 0);
    }
}
