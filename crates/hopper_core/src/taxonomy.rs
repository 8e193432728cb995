//! Host resource taxonomy
//!
//! What counts as "ore", "organic", or "researchable" is the host game's
//! business. The engine only needs a yes/no answer per stored key, so the
//! whole classification surface is one trait consumed as an opaque
//! predicate.

use crate::key::StorageKey;
use serde::{Deserialize, Serialize};

/// Request categories a consumer can ask a container for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// No request. Extraction with this and no exemplar always yields nothing.
    None,
    /// Any stored key matches.
    Any,
    /// Smeltable ore materials.
    OreOnly,
    /// Organic items.
    Organic,
    /// Anything with research value.
    Researchable,
    /// Garbage materials.
    Garbage,
    /// Crystal ore.
    Crystals,
    /// Gem materials.
    Gems,
    /// Biomass ore.
    BioMass,
    /// Ingottable ore.
    Smeltable,
    /// High calorie materials.
    HighCalorie,
    /// Smelted bars.
    BarsOnly,
    /// Any crafted (non-material) item.
    AnyCraftedItem,
}

/// Host-supplied classification of stored keys.
///
/// All methods have permissive defaults so tests and simple hosts can
/// implement only what they care about.
pub trait Taxonomy {
    /// Whether `key` belongs to the requested category. `RequestKind::Any`
    /// is handled by the container and never reaches this method.
    fn matches(&self, request: RequestKind, key: StorageKey) -> bool;

    /// Whether the requesting player knows this resource (research gate).
    fn is_known(&self, _key: StorageKey) -> bool {
        true
    }

    /// Maximum durability for a durability-bearing item id. Used to
    /// reconstruct full units when removing from a durability bucket.
    fn max_durability(&self, _item_id: u32) -> u16 {
        0
    }

    /// Default material value for a material kind. Used when migrating
    /// legacy records that stored bare kind ids.
    fn default_material_value(&self, _kind: u16) -> u16 {
        0
    }

    /// Item id an organic item spoils into, if it spoils at all.
    fn spoils_into(&self, _item_id: u32) -> Option<u32> {
        None
    }
}

/// Permissive taxonomy: nothing matches any named category, everything is
/// known, nothing spoils.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenTaxonomy;

impl Taxonomy for OpenTaxonomy {
    fn matches(&self, _request: RequestKind, _key: StorageKey) -> bool {
        false
    }
}
