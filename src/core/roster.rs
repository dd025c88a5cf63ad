//! The active roster and fuzzy name resolution.
//!
//! Directive text names its targets in free-form prose ("Slime A",
//! "the slime", "slime"), so lookup is closest-match rather than
//! exact: case-insensitive equality first, then name-stem equality,
//! then substring containment in roster order. Defeated battlers are
//! excluded from resolution entirely.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

use super::battler::Battler;
use super::entity::BattlerId;
use super::template::BattlerTemplate;

/// All battlers in one battle, indexed by `BattlerId`.
///
/// Battlers are never removed: defeat flips a flag and drops the
/// battler out of `active()` and `resolve()`, but ids stay stable for
/// the whole battle.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Roster {
    battlers: Vec<Battler>,
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a battler from a template, allocating the next id.
    pub fn spawn(&mut self, template: &BattlerTemplate) -> BattlerId {
        let id = BattlerId::new(self.battlers.len() as u32);
        self.battlers.push(Battler::from_template(id, template));
        id
    }

    /// Get a battler by id.
    #[must_use]
    pub fn get(&self, id: BattlerId) -> Option<&Battler> {
        self.battlers.get(id.index())
    }

    /// Get a mutable battler by id.
    pub fn get_mut(&mut self, id: BattlerId) -> Option<&mut Battler> {
        self.battlers.get_mut(id.index())
    }

    /// Iterate every battler, defeated included.
    pub fn iter(&self) -> impl Iterator<Item = &Battler> {
        self.battlers.iter()
    }

    /// Iterate battlers still standing.
    pub fn active(&self) -> impl Iterator<Item = &Battler> {
        self.battlers.iter().filter(|b| !b.is_defeated())
    }

    /// Number of battlers ever spawned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.battlers.len()
    }

    /// True when no battler has been spawned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.battlers.is_empty()
    }

    /// Resolve a free-form name against the active roster.
    ///
    /// Match order: case-insensitive name equality, stem equality,
    /// then the query contained in a battler name, then a battler
    /// stem contained in the query. Spawn order breaks ties.
    pub fn resolve(&self, name: &str) -> Result<BattlerId, EngineError> {
        let query = name.trim().to_lowercase();
        if query.is_empty() {
            return Err(EngineError::unknown_entity(name));
        }

        let exact = self
            .active()
            .find(|b| b.name.to_lowercase() == query)
            .or_else(|| self.active().find(|b| b.name_stem().to_lowercase() == query));
        if let Some(battler) = exact {
            return Ok(battler.id);
        }

        self.active()
            .find(|b| {
                let full = b.name.to_lowercase();
                full.contains(&query) || query.contains(&b.name_stem().to_lowercase())
            })
            .map(|b| b.id)
            .ok_or_else(|| EngineError::unknown_entity(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::template::Faction;

    fn roster() -> Roster {
        let mut roster = Roster::new();
        roster.spawn(&BattlerTemplate::new("Ralph", Faction::Ally, 30));
        roster.spawn(&BattlerTemplate::new("Slime A", Faction::Enemy, 5));
        roster.spawn(&BattlerTemplate::new("Slime B", Faction::Enemy, 5));
        roster
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        let roster = roster();
        assert_eq!(roster.resolve("ralph").unwrap(), BattlerId(0));
        assert_eq!(roster.resolve("SLIME B").unwrap(), BattlerId(2));
    }

    #[test]
    fn test_substring_match_prefers_spawn_order() {
        let roster = roster();
        assert_eq!(roster.resolve("slime").unwrap(), BattlerId(1));
    }

    #[test]
    fn test_query_containing_stem() {
        let mut roster = Roster::new();
        roster.spawn(&BattlerTemplate::new("Gorb, the Unwashed", Faction::Enemy, 8));
        assert_eq!(roster.resolve("gorb the terrible").unwrap(), BattlerId(0));
    }

    #[test]
    fn test_unknown_name() {
        let roster = roster();
        let err = roster.resolve("Dragon").unwrap_err();
        assert_eq!(err, EngineError::unknown_entity("Dragon"));
    }

    #[test]
    fn test_defeated_excluded() {
        let mut roster = roster();
        let id = roster.resolve("Ralph").unwrap();
        roster.get_mut(id).unwrap().receive_damage(999, true);

        assert!(roster.resolve("Ralph").is_err());
        assert_eq!(roster.active().count(), 2);
        assert_eq!(roster.len(), 3);
    }

    #[test]
    fn test_empty_query_rejected() {
        let roster = roster();
        assert!(roster.resolve("   ").is_err());
    }
}
