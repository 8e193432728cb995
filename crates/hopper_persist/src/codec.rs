//! Versioned hopper codec
//!
//! Serializes a [`StorageHopper`] to the binary machine-state layout and
//! reads both the current format and the legacy slot-array formats that
//! preceded it. The stream carries no version of its own; the host stores
//! an entity version alongside the payload and passes it to the readers.
//!
//! Layout (current): header (color, capacity, one-type flag and lock key,
//! permissions, vacuum, then feeding + delete count for void hoppers or
//! the sharing flag for storage hoppers), inventory section (entry count,
//! then one record per non-empty entry), last-added trailer.

use crate::wire::{PersistError, WireReader, WireWriter};
use hopper_core::{raw_or_zero, Permissions, StackKind, StorageKey, Taxonomy, Unit, MAX_ITEM_ID};
use hopper_inventory::{StackEntry, StorageHopper};
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// Current machine-state version. Streams below this decode through the
/// legacy path.
pub const SAVE_VERSION: u32 = 4;

/// Tag byte marking an empty slot in legacy slot arrays.
const NONE_TAG: u8 = 0xFF;

/// Write one unit: kind tag byte, then the kind payload.
pub fn write_unit<W: Write>(writer: &mut WireWriter<W>, unit: &Unit) -> Result<(), PersistError> {
    writer.write_u8(unit.kind() as u8)?;
    match *unit {
        Unit::Material { kind, value, amount } => {
            writer.write_u16(kind)?;
            writer.write_u16(value)?;
            writer.write_u32(amount)?;
        }
        Unit::Item { id, amount } => {
            writer.write_u32(id)?;
            writer.write_u32(amount)?;
        }
        Unit::Charged { id, charge } => {
            writer.write_u32(id)?;
            writer.write_i32(charge)?;
        }
        Unit::Durable {
            id,
            durability,
            max_durability,
        } => {
            writer.write_u32(id)?;
            writer.write_u16(durability)?;
            writer.write_u16(max_durability)?;
        }
        Unit::Location {
            id,
            position,
            ref label,
        } => {
            writer.write_u32(id)?;
            for coord in position {
                writer.write_i64(coord)?;
            }
            writer.write_string(label)?;
        }
    }
    Ok(())
}

/// Read one unit written by [`write_unit`].
pub fn read_unit<R: Read>(reader: &mut WireReader<R>) -> Result<Unit, PersistError> {
    let tag = reader.read_u8()?;
    let kind = StackKind::from_tag(tag).ok_or(PersistError::UnknownTag(tag))?;
    read_unit_payload(reader, kind)
}

fn read_unit_payload<R: Read>(
    reader: &mut WireReader<R>,
    kind: StackKind,
) -> Result<Unit, PersistError> {
    let unit = match kind {
        StackKind::BulkMaterial => {
            let kind = reader.read_u16()?;
            let value = reader.read_u16()?;
            let amount = reader.read_u32()?;
            if kind == 0 {
                return Err(PersistError::Corrupted("material kind 0 is reserved"));
            }
            Unit::Material {
                kind,
                value,
                amount,
            }
        }
        StackKind::BulkItem => Unit::Item {
            id: read_item_id(reader)?,
            amount: reader.read_u32()?,
        },
        StackKind::ChargeBucketed => Unit::Charged {
            id: read_item_id(reader)?,
            charge: reader.read_i32()?,
        },
        StackKind::DurabilityBucketed => Unit::Durable {
            id: read_item_id(reader)?,
            durability: reader.read_u16()?,
            max_durability: reader.read_u16()?,
        },
        StackKind::LocationList => {
            let id = read_item_id(reader)?;
            let mut position = [0i64; 3];
            for coord in &mut position {
                *coord = reader.read_i64()?;
            }
            Unit::Location {
                id,
                position,
                label: reader.read_string()?,
            }
        }
    };
    Ok(unit)
}

/// Item ids share the key space with material pairs, so a decoded id past
/// the host's ceiling is structurally invalid, not just unusual.
fn read_item_id<R: Read>(reader: &mut WireReader<R>) -> Result<u32, PersistError> {
    let id = reader.read_u32()?;
    if id >= MAX_ITEM_ID {
        return Err(PersistError::Corrupted("item id outside the item range"));
    }
    Ok(id)
}

/// Write an optional unit slot, [`NONE_TAG`] when empty.
pub fn write_optional_unit<W: Write>(
    writer: &mut WireWriter<W>,
    unit: Option<&Unit>,
) -> Result<(), PersistError> {
    match unit {
        Some(unit) => write_unit(writer, unit),
        None => writer.write_u8(NONE_TAG),
    }
}

/// Read an optional unit slot written by [`write_optional_unit`].
pub fn read_optional_unit<R: Read>(
    reader: &mut WireReader<R>,
) -> Result<Option<Unit>, PersistError> {
    let tag = reader.read_u8()?;
    if tag == NONE_TAG {
        return Ok(None);
    }
    let kind = StackKind::from_tag(tag).ok_or(PersistError::UnknownTag(tag))?;
    Ok(Some(read_unit_payload(reader, kind)?))
}

fn write_entry<W: Write>(
    writer: &mut WireWriter<W>,
    entry: &StackEntry,
) -> Result<(), PersistError> {
    writer.write_u8(entry.kind() as u8)?;
    writer.write_u32(entry.storage_key().raw())?;
    match entry {
        StackEntry::BulkMaterial { .. } | StackEntry::BulkItem { .. } => {
            let unit = entry
                .bulk_unit(entry.count())
                .ok_or(PersistError::Corrupted("bulk entry without bulk unit"))?;
            write_unit(writer, &unit)?;
        }
        StackEntry::ChargeBucketed { buckets, .. } => {
            writer.write_u16(buckets.len() as u16)?;
            for (&charge, &n) in buckets {
                writer.write_i32(charge)?;
                writer.write_u16(n)?;
            }
        }
        StackEntry::DurabilityBucketed { buckets, .. } => {
            writer.write_u16(buckets.len() as u16)?;
            for (&durability, &n) in buckets {
                writer.write_u16(durability)?;
                writer.write_u16(n)?;
            }
        }
        StackEntry::LocationList { markers, .. } => {
            writer.write_u16(markers.len() as u16)?;
            for marker in markers {
                write_unit(writer, marker)?;
            }
        }
    }
    Ok(())
}

fn read_entry<R: Read>(
    reader: &mut WireReader<R>,
    taxonomy: &dyn Taxonomy,
) -> Result<StackEntry, PersistError> {
    let tag = reader.read_u8()?;
    let kind = StackKind::from_tag(tag).ok_or(PersistError::UnknownTag(tag))?;
    let raw = reader.read_u32()?;
    let key =
        StorageKey::from_raw(raw).ok_or(PersistError::Corrupted("zero storage key in entry"))?;
    // Bulk entries are cross-checked against their decoded unit below;
    // bucketed and list entries carry only the key, so it has to be a
    // valid item id on its own.
    if !kind.is_bulk() && !matches!(key.item_id(), Some(id) if id < MAX_ITEM_ID) {
        return Err(PersistError::Corrupted("entry key is not an item id"));
    }

    let entry = match kind {
        StackKind::BulkMaterial | StackKind::BulkItem => {
            let unit = read_unit(reader)?;
            if unit.storage_key() != key {
                return Err(PersistError::Corrupted("entry key does not match unit"));
            }
            let mut entry = StackEntry::for_unit(&unit);
            entry
                .add_unit(unit)
                .map_err(|_| PersistError::Corrupted("entry kind does not match unit"))?;
            entry
        }
        StackKind::ChargeBucketed => {
            let mut buckets = BTreeMap::new();
            for _ in 0..reader.read_u16()? {
                let charge = reader.read_i32()?;
                let n = reader.read_u16()?;
                buckets.insert(charge, n);
            }
            StackEntry::ChargeBucketed {
                id: key.raw(),
                buckets,
            }
        }
        StackKind::DurabilityBucketed => {
            let mut buckets = BTreeMap::new();
            for _ in 0..reader.read_u16()? {
                let durability = reader.read_u16()?;
                let n = reader.read_u16()?;
                buckets.insert(durability, n);
            }
            StackEntry::DurabilityBucketed {
                id: key.raw(),
                max_durability: taxonomy.max_durability(key.raw()),
                buckets,
            }
        }
        StackKind::LocationList => {
            let mut markers = Vec::new();
            for _ in 0..reader.read_u16()? {
                match read_unit(reader)? {
                    marker @ Unit::Location { .. } => markers.push(marker),
                    _ => {
                        return Err(PersistError::Corrupted(
                            "non-location unit in location list",
                        ))
                    }
                }
            }
            StackEntry::LocationList {
                id: key.raw(),
                markers,
            }
        }
    };
    Ok(entry)
}

/// Serialize a hopper's machine state in the current format.
pub fn write_hopper<W: Write>(hopper: &StorageHopper, writer: W) -> Result<(), PersistError> {
    let mut writer = WireWriter::new(writer);
    let container = hopper.container();

    for channel in hopper.color {
        writer.write_f32(channel)?;
    }
    writer.write_u16(container.max_capacity())?;
    writer.write_bool(container.is_one_type())?;
    writer.write_u32(raw_or_zero(container.one_type_key()))?;
    writer.write_u8(container.permissions() as u8)?;
    writer.write_bool(hopper.vacuum_on)?;

    if hopper.is_void() {
        writer.write_bool(hopper.hivemind_feeding_on)?;
        writer.write_i32(hopper.void_delete_count)?;
    } else {
        writer.write_bool(hopper.content_sharing_on)?;
    }

    // Empty entries are pruned from the wire, not from memory.
    let live: Vec<&StackEntry> = container.entries().filter(|e| e.count() > 0).collect();
    writer.write_u16(live.len() as u16)?;
    for entry in live {
        write_entry(&mut writer, entry)?;
    }

    writer.write_bool(hopper.last_added.is_some())?;
    if let Some(ref unit) = hopper.last_added {
        write_unit(&mut writer, unit)?;
    }
    Ok(())
}

/// Strict read: decodes into `hopper` and propagates any stream error.
/// `version` is the entity version the host stored with the payload.
pub fn try_read_hopper<R: Read>(
    hopper: &mut StorageHopper,
    reader: R,
    version: u32,
    taxonomy: &dyn Taxonomy,
) -> Result<(), PersistError> {
    let mut reader = WireReader::new(reader);
    if version < SAVE_VERSION {
        return read_legacy(hopper, &mut reader, version, taxonomy);
    }

    for channel in &mut hopper.color {
        *channel = reader.read_f32()?;
    }
    let capacity = reader.read_u16()?;
    let one_type = reader.read_bool()?;
    let lock = StorageKey::from_raw(reader.read_u32()?);
    let permissions = read_permissions_byte(&mut reader)?;
    let vacuum = reader.read_bool()?;

    let container = hopper.container_mut();
    container.set_max_capacity(capacity);
    container.set_one_type(one_type);
    container.set_one_type_key(lock);
    container.set_permissions(permissions);
    hopper.vacuum_on = vacuum;

    if hopper.is_void() {
        hopper.hivemind_feeding_on = reader.read_bool()?;
        hopper.void_delete_count = reader.read_i32()?;
    } else {
        hopper.content_sharing_on = reader.read_bool()?;
    }

    hopper.container_mut().clear();
    let entry_count = reader.read_u16()?;
    for _ in 0..entry_count {
        let entry = read_entry(&mut reader, taxonomy)?;
        hopper.container_mut().restore_entry(entry);
    }

    hopper.last_added = if reader.read_bool()? {
        Some(read_unit(&mut reader)?)
    } else {
        None
    };
    Ok(())
}

/// Lenient read for load paths that must not fail: on a bad stream the
/// error is logged, feature flags reset to safe defaults, and whatever
/// decoded before the error is kept. Returns whether the read was clean.
pub fn read_hopper<R: Read>(
    hopper: &mut StorageHopper,
    reader: R,
    version: u32,
    taxonomy: &dyn Taxonomy,
) -> bool {
    match try_read_hopper(hopper, reader, version, taxonomy) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("hopper state load failed (version {version}): {err}");
            hopper.reset_feature_flags();
            false
        }
    }
}

/// Decode the pre-4 formats. Versions 1-3 stored a capacity-sized flat
/// slot-id array that is folded into per-material counters and replayed
/// as bulk inserts, with the material value looked up from the taxonomy.
fn read_legacy<R: Read>(
    hopper: &mut StorageHopper,
    reader: &mut WireReader<R>,
    version: u32,
    taxonomy: &dyn Taxonomy,
) -> Result<(), PersistError> {
    if hopper.container().is_one_type() {
        let item_id = reader.read_i32()?;
        reader.read_string()?; // display name, re-derived on load
        let kind = reader.read_u16()?;
        let value = reader.read_u16()?;
        let lock = if item_id != -1 {
            StorageKey::from_raw(item_id as u32)
        } else {
            StorageKey::from_raw(((kind as u32) << 16) | value as u32)
        };
        hopper.container_mut().set_one_type_key(lock);
    }

    let capacity = hopper.container().max_capacity();
    let mut counters: BTreeMap<u16, u32> = BTreeMap::new();
    for _ in 0..capacity {
        let slot = reader.read_u16()?;
        if slot != 0 {
            *counters.entry(slot).or_insert(0) += 1;
        }
    }

    let permissions = read_permissions_i32(reader)?;
    hopper.container_mut().set_permissions(permissions);
    hopper.vacuum_on = reader.read_bool()?;
    reader.read_bool()?; // dead flag
    hopper.hivemind_feeding_on = reader.read_bool()?;
    if version >= 3 {
        hopper.content_sharing_on = reader.read_bool()?;
    }

    // Dead feed ticker, narrower in the first version.
    if version == 1 {
        reader.read_u8()?;
    } else {
        reader.read_i32()?;
    }
    reader.read_i32()?;
    reader.read_i32()?;
    reader.read_i32()?;

    if version == 1 || hopper.is_void() {
        hopper.void_delete_count = reader.read_i32()?;
    }
    reader.read_i32()?; // debug hopper number
    reader.read_i32()?;

    if version > 0 {
        for _ in 0..capacity {
            if let Some(unit) = read_optional_unit(reader)? {
                restore(hopper, unit);
            }
        }
    }

    for (kind, amount) in counters {
        let unit = Unit::Material {
            kind,
            value: taxonomy.default_material_value(kind),
            amount,
        };
        restore(hopper, unit);
    }
    Ok(())
}

/// Legacy streams can hold more than the container admits (older builds
/// never enforced capacity on load); the excess is logged and dropped.
fn restore(hopper: &mut StorageHopper, unit: Unit) {
    if let Err(rejected) = hopper.container_mut().load_unit(unit) {
        log::warn!("dropping unit from legacy stream: {}", rejected.reason);
    }
}

fn read_permissions_byte<R: Read>(
    reader: &mut WireReader<R>,
) -> Result<Permissions, PersistError> {
    let byte = reader.read_u8()?;
    Permissions::from_byte(byte).ok_or(PersistError::UnknownPermissions(byte))
}

fn read_permissions_i32<R: Read>(reader: &mut WireReader<R>) -> Result<Permissions, PersistError> {
    let value = reader.read_i32()?;
    u8::try_from(value)
        .ok()
        .and_then(Permissions::from_byte)
        .ok_or(PersistError::UnknownPermissions(value as u8))
}
