//! Battler identification.
//!
//! Every combatant in a battle has a unique `BattlerId`, allocated by
//! the [`Roster`](super::Roster) in spawn order. Ids are never reused
//! within a battle: a defeated battler keeps its id and its slot, it is
//! only excluded from active targeting.

use serde::{Deserialize, Serialize};

/// Unique identifier for a battler within one battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattlerId(pub u32);

impl BattlerId {
    /// Create a battler ID from a raw index.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Roster slot for this id.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for BattlerId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BattlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Battler({})", self.0)
    }
}
