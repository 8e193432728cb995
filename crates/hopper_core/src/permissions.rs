//! Container permission modes

use serde::{Deserialize, Serialize};

/// What a container allows external callers to do. The discriminants are
/// the persisted wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Permissions {
    /// Both insertion and extraction allowed.
    AddAndRemove = 0,
    /// Insertion only.
    AddOnly = 1,
    /// Extraction only.
    RemoveOnly = 2,
    /// Neither.
    Locked = 3,
}

impl Default for Permissions {
    fn default() -> Self {
        Self::AddAndRemove
    }
}

impl Permissions {
    /// Decode a persisted byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::AddAndRemove),
            1 => Some(Self::AddOnly),
            2 => Some(Self::RemoveOnly),
            3 => Some(Self::Locked),
            _ => None,
        }
    }

    /// Whether insertion is allowed.
    pub fn allows_add(self) -> bool {
        matches!(self, Self::AddAndRemove | Self::AddOnly)
    }

    /// Whether extraction is allowed.
    pub fn allows_remove(self) -> bool {
        matches!(self, Self::AddAndRemove | Self::RemoveOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_round_trip() {
        for mode in [
            Permissions::AddAndRemove,
            Permissions::AddOnly,
            Permissions::RemoveOnly,
            Permissions::Locked,
        ] {
            assert_eq!(Permissions::from_byte(mode as u8), Some(mode));
        }
        assert_eq!(Permissions::from_byte(4), None);
    }

    #[test]
    fn test_gates() {
        assert!(Permissions::AddAndRemove.allows_add());
        assert!(Permissions::AddAndRemove.allows_remove());
        assert!(Permissions::AddOnly.allows_add());
        assert!(!Permissions::AddOnly.allows_remove());
        assert!(!Permissions::RemoveOnly.allows_add());
        assert!(Permissions::RemoveOnly.allows_remove());
        assert!(!Permissions::Locked.allows_add());
        assert!(!Permissions::Locked.allows_remove());
    }
}
