//! Hopper Persist - Versioned Machine-State Serialization
//!
//! Binary save/load for storage hopper machines: a little-endian wire
//! layer and a versioned codec that writes the current format and reads
//! every format back to the earliest slot-array saves.
//!
//! # Features
//!
//! - Deterministic serialization (serialize, load, serialize again is
//!   byte-identical)
//! - Legacy stream migration, including the flat slot-id inventory
//! - Lenient load path that degrades to safe defaults instead of failing
//!
//! # Example
//!
//! ```
//! use hopper_core::OpenTaxonomy;
//! use hopper_inventory::{HopperType, StorageHopper};
//! use hopper_persist::{read_hopper, write_hopper, SAVE_VERSION};
//!
//! let mut hopper = StorageHopper::new(&HopperType::new("Storage Hopper", 100));
//! hopper.add_material(5, 0, 25, None).unwrap();
//!
//! let mut bytes = Vec::new();
//! write_hopper(&hopper, &mut bytes).unwrap();
//!
//! let mut loaded = StorageHopper::new(&HopperType::new("Storage Hopper", 100));
//! assert!(read_hopper(&mut loaded, bytes.as_slice(), SAVE_VERSION, &OpenTaxonomy));
//! assert_eq!(loaded.container().used_capacity(), 25);
//! ```

pub mod codec;
pub mod wire;

pub mod prelude {
    pub use crate::codec::{
        read_hopper, read_optional_unit, read_unit, try_read_hopper, write_hopper,
        write_optional_unit, write_unit, SAVE_VERSION,
    };
    pub use crate::wire::{PersistError, WireReader, WireWriter};
}

pub use prelude::*;
