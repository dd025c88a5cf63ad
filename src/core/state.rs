//! The full battle state the resolver mutates.

use tracing::warn;

use crate::marks::MarkRegistry;
use crate::parse::parse_mark_clause;
use crate::resolve::DelayQueue;

use super::entity::BattlerId;
use super::rng::BattleRng;
use super::roster::Roster;
use super::template::BattlerTemplate;

/// Everything mutable in one battle. Single-writer: all mutation
/// goes through the resolver, one directive at a time.
#[derive(Clone, Debug)]
pub struct BattleState {
    /// All combatants.
    pub roster: Roster,
    /// All active marks.
    pub marks: MarkRegistry,
    /// Directives waiting on an end-of-turn boundary.
    pub delayed: DelayQueue,
    /// End-of-turn boundaries crossed so far.
    pub turn: u32,
    /// Accuracy/crit roll source.
    pub rng: BattleRng,
}

impl BattleState {
    /// Create an empty battle with a seeded RNG.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            roster: Roster::new(),
            marks: MarkRegistry::new(),
            delayed: DelayQueue::new(),
            turn: 0,
            rng: BattleRng::new(seed),
        }
    }

    /// Spawn a battler and attach its template's initial marks.
    ///
    /// A malformed initial-mark clause is logged and skipped; it
    /// never prevents the spawn.
    pub fn spawn(&mut self, template: &BattlerTemplate) -> BattlerId {
        let id = self.roster.spawn(template);
        for clause in &template.initial_marks {
            match parse_mark_clause(clause) {
                Ok(spec) => {
                    self.marks.apply(id, spec);
                }
                Err(err) => {
                    warn!(battler = %id, %err, "skipping malformed initial mark");
                }
            }
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::template::Faction;

    #[test]
    fn test_spawn_attaches_initial_marks() {
        let mut state = BattleState::new(42);
        let id = state.spawn(
            &BattlerTemplate::new("Tortoise", Faction::Enemy, 10).with_initial_mark(
                "+thick hide [3 turns] [ME: damaged {:d}] -> [ME: damaged {m[0] / 2}]",
            ),
        );

        let marks = state.marks.marks_of(id);
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].name(), "thick hide");
    }

    #[test]
    fn test_malformed_initial_mark_skipped() {
        let mut state = BattleState::new(42);
        let id = state.spawn(
            &BattlerTemplate::new("Tortoise", Faction::Enemy, 10)
                .with_initial_mark("+broken [forever] nope"),
        );

        assert!(state.marks.marks_of(id).is_empty());
        assert_eq!(state.roster.len(), 1);
    }
}
