//! The delay queue.
//!
//! `delay n` parks a directive until the battle has crossed `n`
//! end-of-turn boundaries. Parked directives keep their schedule-time
//! source and target; crit, pierce, and drain are evaluated when they
//! fire (accuracy was already consumed at schedule time).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cards::CardOp;
use crate::core::BattlerId;
use crate::parse::{EntityAction, ModifierSet};

/// An entity directive waiting in the queue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DelayedDirective {
    /// Who caused it; drain heals this battler, and its defeat
    /// cancels the directive.
    pub source: Option<BattlerId>,
    /// Resolved at schedule time; dropped at fire time if defeated.
    pub target: BattlerId,
    /// The effect.
    pub action: EntityAction,
    /// Fire-time modifiers. Accuracy and delay are already spent.
    pub modifiers: ModifierSet,
}

/// One parked effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DelayedEffect {
    /// Entity-targeted.
    Entity(DelayedDirective),
    /// Forwarded to the card collection at fire time.
    Global(CardOp),
}

/// Parked effects, keyed by the turn counter value they fire at.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DelayQueue {
    by_turn: FxHashMap<u32, Vec<DelayedEffect>>,
}

impl DelayQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Park an effect to fire when the turn counter reaches `turn`.
    pub fn push(&mut self, turn: u32, effect: DelayedEffect) {
        self.by_turn.entry(turn).or_default().push(effect);
    }

    /// Remove and return everything due at or before `turn`, in
    /// schedule order (earlier boundaries first, insertion order
    /// within a boundary).
    pub fn drain_due(&mut self, turn: u32) -> Vec<DelayedEffect> {
        let mut due_turns: Vec<u32> = self
            .by_turn
            .keys()
            .copied()
            .filter(|&t| t <= turn)
            .collect();
        due_turns.sort_unstable();

        let mut due = Vec::new();
        for t in due_turns {
            if let Some(bucket) = self.by_turn.remove(&t) {
                due.extend(bucket);
            }
        }
        due
    }

    /// Cancel every parked entity directive sourced by a battler
    /// (defeat cleanup). Returns how many were cancelled.
    pub fn cancel_source(&mut self, source: BattlerId) -> usize {
        let mut cancelled = 0;
        for bucket in self.by_turn.values_mut() {
            bucket.retain(|effect| match effect {
                DelayedEffect::Entity(d) if d.source == Some(source) => {
                    cancelled += 1;
                    false
                }
                _ => true,
            });
        }
        cancelled
    }

    /// True when nothing is parked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_turn.values().all(Vec::is_empty)
    }
}
