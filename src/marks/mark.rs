//! Marks: conditional rewrite rules with a duration.
//!
//! A mark is one active status effect. It is owned by exactly one
//! battler, watches incoming directives through a trigger pattern
//! plus optional condition, and rewrites what it catches. Its
//! lifetime is counted either in battle rounds or in successful
//! rewrites.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::BattlerId;
use crate::parse::{Captures, Expr, Replacement, TriggerPattern};

/// How a mark's remaining duration counts down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationKind {
    /// Decrements once at each end-of-turn boundary.
    Turns,
    /// Decrements after each successful rewrite it produces.
    Uses,
}

/// The parsed body of a mark-apply directive: everything a mark is,
/// minus its owner and runtime counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkSpec {
    /// Display name, e.g. `diamond shield`.
    pub name: String,
    /// Starting duration.
    pub duration: u32,
    /// What the duration counts.
    pub kind: DurationKind,
    /// Shape of the directives this mark intercepts.
    pub pattern: TriggerPattern,
    /// Extra predicate over the bound captures.
    pub condition: Option<Expr>,
    /// Template for the superseding directive.
    pub replacement: Replacement,
}

/// Unique identifier for an applied mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkId(pub u32);

impl MarkId {
    /// Create a mark ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for MarkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mark({})", self.0)
    }
}

/// An active status effect owned by one battler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    /// Registry-allocated id.
    pub id: MarkId,
    /// Owning battler. Marks are never shared.
    pub owner: BattlerId,
    /// The rule itself.
    pub spec: MarkSpec,
    /// Remaining duration; the mark is expired at 0.
    pub remaining: u32,
}

impl Mark {
    /// Create a mark from a spec.
    #[must_use]
    pub fn new(id: MarkId, owner: BattlerId, spec: MarkSpec) -> Self {
        let remaining = spec.duration;
        Self {
            id,
            owner,
            spec,
            remaining,
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// An expired mark never matches again; it is swept before the
    /// next resolution pass.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Test pattern and condition against a directive aimed at this
    /// mark's owner. Returns the bound captures on a full match.
    ///
    /// A condition that fails to evaluate (text capture in
    /// arithmetic, division by zero) is treated as false.
    #[must_use]
    pub fn match_directive(
        &self,
        owner_name: &str,
        owner_stem: &str,
        verb: &str,
        magnitude: i64,
    ) -> Option<Captures> {
        if self.is_expired() {
            return None;
        }

        let captures = self
            .spec
            .pattern
            .match_directive(owner_name, owner_stem, verb, magnitude)?;

        if let Some(condition) = &self.spec.condition {
            match condition.eval_bool(&captures) {
                Ok(true) => {}
                Ok(false) => return None,
                Err(err) => {
                    debug!(mark = %self.spec.name, %err, "mark condition failed to evaluate");
                    return None;
                }
            }
        }

        Some(captures)
    }

    /// Consume one use after a successful rewrite. Only meaningful
    /// for uses-kind marks.
    pub fn consume_use(&mut self) {
        if self.spec.kind == DurationKind::Uses {
            self.remaining = self.remaining.saturating_sub(1);
        }
    }

    /// Count down one battle round. Only meaningful for turns-kind
    /// marks.
    pub fn tick_turn(&mut self) {
        if self.spec.kind == DurationKind::Turns {
            self.remaining = self.remaining.saturating_sub(1);
        }
    }
}
