//! Battler templates.
//!
//! Templates are the configuration-side description of a combatant:
//! name, faction, base stats, and any marks active from the first
//! round. They arrive from an external configuration loader as plain
//! serde data; the engine only instantiates them.

use serde::{Deserialize, Serialize};

/// Which side of the battle a combatant fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Ally,
    Enemy,
}

/// Secondary combat stats.
///
/// Carried through from templates for external consumers (intent
/// display, narration prompts). The resolver itself only commits
/// hp/shield/mp changes; formulas over these values live upstream in
/// the narration source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    /// Physical attack.
    #[serde(default)]
    pub patk: i64,
    /// Physical defense.
    #[serde(default)]
    pub pdef: i64,
    /// Magical attack.
    #[serde(default)]
    pub matk: i64,
    /// Magical defense.
    #[serde(default)]
    pub mdef: i64,
    /// Agility.
    #[serde(default)]
    pub agi: i64,
    /// Evasion.
    #[serde(default)]
    pub eva: i64,
}

/// Template a battler is created from at battle start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattlerTemplate {
    /// Display name, also the lookup key for directive targeting.
    pub name: String,

    /// Side of the battle.
    pub faction: Faction,

    /// Maximum (and starting) hit points.
    pub hp: i64,

    /// Maximum (and starting) mind points.
    #[serde(default)]
    pub mp: i64,

    /// Secondary stats.
    #[serde(default)]
    pub stats: StatBlock,

    /// Mark clauses active from round one, in mark-directive body
    /// syntax, e.g. `+thick hide [3 turns] [ME: damaged {:d}] -> [ME: damaged {m[0] / 2}]`.
    /// Malformed clauses are logged and skipped at spawn.
    #[serde(default)]
    pub initial_marks: Vec<String>,
}

impl BattlerTemplate {
    /// Create a bare template with a name, faction, and hp.
    #[must_use]
    pub fn new(name: impl Into<String>, faction: Faction, hp: i64) -> Self {
        Self {
            name: name.into(),
            faction,
            hp,
            mp: 0,
            stats: StatBlock::default(),
            initial_marks: Vec::new(),
        }
    }

    /// Set mind points (builder pattern).
    #[must_use]
    pub fn with_mp(mut self, mp: i64) -> Self {
        self.mp = mp;
        self
    }

    /// Set the stat block (builder pattern).
    #[must_use]
    pub fn with_stats(mut self, stats: StatBlock) -> Self {
        self.stats = stats;
        self
    }

    /// Add an initial mark clause (builder pattern).
    #[must_use]
    pub fn with_initial_mark(mut self, clause: impl Into<String>) -> Self {
        self.initial_marks.push(clause.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let template = BattlerTemplate::new("Ralph", Faction::Ally, 30)
            .with_mp(5)
            .with_initial_mark("+guard [2 turns] [ME: damaged {:d}] -> [ME: damaged 0]");

        assert_eq!(template.name, "Ralph");
        assert_eq!(template.hp, 30);
        assert_eq!(template.mp, 5);
        assert_eq!(template.initial_marks.len(), 1);
    }

    #[test]
    fn test_deserialize_minimal() {
        let template: BattlerTemplate =
            serde_json::from_str(r#"{"name": "Slime", "faction": "enemy", "hp": 12}"#).unwrap();

        assert_eq!(template.faction, Faction::Enemy);
        assert_eq!(template.mp, 0);
        assert_eq!(template.stats, StatBlock::default());
        assert!(template.initial_marks.is_empty());
    }

    #[test]
    fn test_deserialize_full() {
        let json = r#"{
            "name": "Ralph",
            "faction": "ally",
            "hp": 1500,
            "mp": 200,
            "stats": {"patk": 250, "pdef": 150, "matk": 100, "mdef": 100, "agi": 80, "eva": 10}
        }"#;
        let template: BattlerTemplate = serde_json::from_str(json).unwrap();

        assert_eq!(template.stats.patk, 250);
        assert_eq!(template.stats.eva, 10);
    }
}
