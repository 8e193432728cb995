//! Storage hopper machine
//!
//! Wraps an [`InventoryContainer`] with the machine-level state the host
//! persists and the tick-driven behavior that sits above raw storage:
//! void hoppers that destroy deposits, spoilage of organic items, and the
//! last-added snapshot shown to players.

use crate::container::{ExtractOptions, Extracted, InventoryContainer, RejectedUnit};
use hopper_core::{Permissions, StackKind, StorageKey, Taxonomy, Unit};
use serde::{Deserialize, Serialize};

/// Static description of a hopper variant, as registered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HopperType {
    /// Display name.
    pub name: String,
    /// Storage capacity in units.
    pub capacity: u16,
    /// Display color.
    pub color: [f32; 3],
    /// Whether containers of this variant enforce the one-type lock.
    pub one_type: bool,
    /// Void hoppers destroy everything deposited into them.
    pub void: bool,
}

impl HopperType {
    pub fn new(name: impl Into<String>, capacity: u16) -> Self {
        Self {
            name: name.into(),
            capacity,
            color: [1.0, 1.0, 1.0],
            one_type: false,
            void: false,
        }
    }

    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn one_type(mut self) -> Self {
        self.one_type = true;
        self
    }

    pub fn void_hopper(mut self) -> Self {
        self.void = true;
        self.capacity = 0;
        self
    }
}

/// Receiver for units a void hopper forwards instead of destroying.
/// Ownership of the "closest hive" lookup stays with the scheduler, which
/// hands the sink into each call that can feed it.
pub trait UnitSink {
    fn accept(&mut self, unit: Unit);
}

/// A storage hopper machine entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageHopper {
    container: InventoryContainer,
    is_void: bool,
    /// Display color, persisted with the machine.
    pub color: [f32; 3],
    /// Item vacuum toggle. The world scan itself belongs to the host.
    pub vacuum_on: bool,
    /// Whether this hopper shares content with adjacent hoppers.
    pub content_sharing_on: bool,
    /// Whether a void hopper forwards deposits to the hive sink.
    pub hivemind_feeding_on: bool,
    /// Units a void hopper has destroyed.
    pub void_delete_count: i32,
    /// Snapshot of the last deposited unit.
    pub last_added: Option<Unit>,
}

impl StorageHopper {
    pub fn new(hopper_type: &HopperType) -> Self {
        let container = if hopper_type.one_type {
            InventoryContainer::new_one_type(hopper_type.capacity)
        } else {
            InventoryContainer::new(hopper_type.capacity)
        };
        Self {
            container,
            is_void: hopper_type.void,
            color: hopper_type.color,
            vacuum_on: false,
            content_sharing_on: false,
            hivemind_feeding_on: false,
            void_delete_count: 0,
            last_added: None,
        }
    }

    pub fn is_void(&self) -> bool {
        self.is_void
    }

    pub fn container(&self) -> &InventoryContainer {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut InventoryContainer {
        &mut self.container
    }

    /// Deposit a unit. Void hoppers count and destroy it, forwarding it to
    /// `hive` when feeding is enabled; storage hoppers store it.
    pub fn add_unit(
        &mut self,
        unit: Unit,
        hive: Option<&mut dyn UnitSink>,
    ) -> Result<(), RejectedUnit> {
        if self.is_void {
            self.void_delete_count += unit.amount() as i32;
            self.last_added = Some(unit.clone());
            match (self.hivemind_feeding_on, hive) {
                (true, Some(sink)) => sink.accept(unit),
                (true, None) => log::debug!("cannot feed hive until one is found"),
                _ => {}
            }
            return Ok(());
        }

        let snapshot = unit.clone();
        self.container.insert(unit)?;
        self.last_added = Some(snapshot);
        Ok(())
    }

    /// Deposit a bulk material stack.
    pub fn add_material(
        &mut self,
        kind: u16,
        value: u16,
        amount: u32,
        hive: Option<&mut dyn UnitSink>,
    ) -> Result<(), RejectedUnit> {
        self.add_unit(
            Unit::Material {
                kind,
                value,
                amount,
            },
            hive,
        )
    }

    /// Extract through the container's fairness algorithm.
    pub fn extract(
        &mut self,
        options: &ExtractOptions,
        taxonomy: &dyn Taxonomy,
    ) -> Option<Extracted> {
        self.container.extract(options, taxonomy)
    }

    pub fn count_of(&self, key: StorageKey) -> u32 {
        self.container.count_of(key)
    }

    pub fn permissions(&self) -> Permissions {
        self.container.permissions()
    }

    pub fn set_permissions(&mut self, permissions: Permissions) {
        self.container.set_permissions(permissions);
    }

    pub fn set_vacuum(&mut self, enabled: bool) {
        self.vacuum_on = enabled;
    }

    pub fn set_content_sharing(&mut self, enabled: bool) {
        self.content_sharing_on = enabled;
    }

    pub fn set_hivemind_feeding(&mut self, enabled: bool) {
        self.hivemind_feeding_on = enabled;
    }

    /// Set or clear the one-type lock key.
    pub fn set_one_type_key(&mut self, key: Option<StorageKey>) {
        self.container.set_one_type_key(key);
    }

    /// Drain up to `limit` units for cargo transfer.
    pub fn unload(&mut self, limit: u32) -> Vec<Unit> {
        self.container.unload(limit)
    }

    /// Visit every stored unit.
    pub fn for_each_unit<F: FnMut(&Unit) -> bool>(&self, visit: F) {
        self.container.for_each_unit(visit)
    }

    /// Spoil one organic unit, converting it to its spoiled form. The
    /// caller owns the cadence (hosts typically run this every 30 seconds).
    /// Returns whether a unit was converted.
    pub fn update_spoilage(&mut self, taxonomy: &dyn Taxonomy) -> bool {
        let mut target = None;
        for entry in self.container.entries() {
            if entry.count() == 0 || entry.kind() != StackKind::BulkItem {
                continue;
            }
            if let Some(id) = entry.storage_key().item_id() {
                if let Some(spoiled_id) = taxonomy.spoils_into(id) {
                    target = Some((entry.storage_key(), id, spoiled_id));
                    break;
                }
            }
        }

        let (key, id, spoiled_id) = match target {
            Some(found) => found,
            None => return false,
        };

        if self.container.take_from(key, 1) == 0 {
            return false;
        }
        let spoiled = Unit::Item {
            id: spoiled_id,
            amount: 1,
        };
        if let Err(rejected) = self.container.load_unit(spoiled) {
            // One-type lock can refuse the spoiled form; put the original
            // back rather than lose it.
            log::warn!("spoilage insert rejected: {}", rejected.reason);
            let _ = self.container.load_unit(Unit::Item { id, amount: 1 });
            return false;
        }
        true
    }

    /// Reset feature flags to safe defaults after a corrupt load.
    pub fn reset_feature_flags(&mut self) {
        self.vacuum_on = false;
        self.content_sharing_on = false;
        self.hivemind_feeding_on = false;
    }
}
