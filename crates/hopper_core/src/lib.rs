//! Hopper Core - Storage Keys, Units and Taxonomy
//!
//! This crate provides the shared primitives of the hopper engine.
//!
//! # Features
//!
//! - Dense storage key codec unifying item ids and material pairs
//! - Resource unit model covering bulk and attributed kinds
//! - Opaque host taxonomy trait for request classification
//! - Container permission modes
//!
//! # Example
//!
//! ```
//! use hopper_core::prelude::*;
//!
//! let key = StorageKey::from_material(42, 1);
//! assert!(key.is_material());
//!
//! let unit = Unit::Material { kind: 42, value: 1, amount: 10 };
//! assert_eq!(unit.storage_key(), key);
//! ```

pub mod key;
pub mod permissions;
pub mod taxonomy;
pub mod unit;

pub mod prelude {
    pub use crate::key::{raw_or_zero, StorageKey, MAX_ITEM_ID};
    pub use crate::permissions::Permissions;
    pub use crate::taxonomy::{OpenTaxonomy, RequestKind, Taxonomy};
    pub use crate::unit::{StackKind, Unit};
}

pub use prelude::*;
