//! Stacking inventory containers for the hopper engine.
//!
//! A container maps [storage keys](hopper_core::StorageKey) to stack
//! entries, enforces a unit-count capacity, and extracts through a
//! round-robin fairness cursor. On top of the container sit the storage
//! hopper machine itself and the agent that rebalances content between
//! adjacent hoppers.
//!
//! # Features
//!
//! - Five stacking disciplines: bulk counters for materials and plain
//!   items, charge and durability buckets, and per-unit location lists
//! - Filtered extraction with exemplar, category, inversion, and
//!   known-resource gates
//! - Permission modes, the one-type lock, and void hoppers
//! - Fuller-to-emptier content sharing between hopper pairs
//!
//! # Example
//!
//! ```
//! use hopper_core::{OpenTaxonomy, Unit};
//! use hopper_inventory::{ExtractOptions, InventoryContainer};
//!
//! let mut container = InventoryContainer::new(100);
//! container.insert(Unit::Material { kind: 5, value: 0, amount: 12 }).unwrap();
//!
//! let out = container
//!     .extract(&ExtractOptions::for_material(5, 0).with_amounts(1, 4), &OpenTaxonomy)
//!     .unwrap();
//! assert_eq!(out.amount, 4);
//! assert_eq!(container.used_capacity(), 8);
//! ```

pub mod container;
pub mod hopper;
pub mod rebalance;
pub mod stack;

/// Commonly used types.
pub mod prelude {
    pub use crate::container::{
        Exemplar, ExtractOptions, Extracted, InventoryContainer, RejectReason, RejectedUnit,
        Wildcard,
    };
    pub use crate::hopper::{HopperType, StorageHopper, UnitSink};
    pub use crate::rebalance::{RebalanceAgent, REBALANCE_INTERVAL, SHARE_EPSILON};
    pub use crate::stack::{StackEntry, StackError};
}

pub use prelude::*;
