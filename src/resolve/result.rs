//! What a resolution pass reports back.

use serde::{Deserialize, Serialize};

use crate::core::BattlerId;
use crate::error::EngineError;
use crate::marks::MarkNotice;

/// What kind of directive was committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveKind {
    Damage,
    Heal,
    ShieldDelta,
    MarkApply,
    MarkDestroy,
}

/// Which modifiers actually fired on a committed directive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiredModifiers {
    /// The critical roll succeeded and the magnitude was doubled.
    pub crit: bool,
    /// The damage ignored shield.
    pub pierce: bool,
    /// The source was healed by the dealt magnitude.
    pub drain: bool,
    /// The directive sat in the delay queue before firing.
    pub delayed: bool,
}

/// One committed (or missed) directive, in application order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationResult {
    /// Who the directive landed on.
    pub target: BattlerId,
    /// What it was.
    pub kind: DirectiveKind,
    /// Magnitude asked of the commit step, after rewrites and crit.
    pub requested: i64,
    /// Magnitude that actually changed state, after shield, caps,
    /// and floors.
    pub applied: i64,
    /// Modifiers that fired.
    pub fired: FiredModifiers,
    /// False only for an accuracy miss, which applies nothing.
    pub hit: bool,
}

impl ApplicationResult {
    /// An accuracy miss: nothing applied, nothing fired.
    #[must_use]
    pub fn miss(target: BattlerId, kind: DirectiveKind, requested: i64) -> Self {
        Self {
            target,
            kind,
            requested,
            applied: 0,
            fired: FiredModifiers::default(),
            hit: false,
        }
    }
}

/// Everything one resolution pass (or end-of-turn flush) produced.
#[derive(Clone, Debug, Default)]
pub struct PassOutcome {
    /// Committed and missed directives, in application order.
    pub results: Vec<ApplicationResult>,
    /// Mark lifecycle events, for status-icon display.
    pub notices: Vec<MarkNotice>,
    /// Spans that were recognizably directives but failed to parse.
    pub malformed: usize,
    /// Everything recovered from along the way: dropped spans,
    /// unknown targets, rewrite-loop bounds, collection refusals.
    pub errors: Vec<EngineError>,
}
