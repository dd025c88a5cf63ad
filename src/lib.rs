//! # warscript
//!
//! A directive-driven battle resolution engine for narrated card battles.
//!
//! Turn outcomes arrive as prose with bracket directives embedded in it:
//!
//! ```text
//! The slime lunges! [Ralph: damaged 5 | acc 0.8 | crit 0.2] It burrows
//! under his skin. [Ralph: +venom [3 turns] [ME: healed {:d}] -> [ME: healed {m[0] / 2}]]
//! ```
//!
//! The engine scans the spans, parses them into typed directives, runs
//! each through a fixed modifier pipeline (accuracy, delay, critical,
//! pierce, drain), lets the target's marks rewrite it through a bounded
//! interception loop, and commits the result against battler state.
//! Everything is deterministic from a seed, and every failure is
//! recovered at the directive boundary.
//!
//! ## Modules
//!
//! - `core`: Battlers, the roster, templates, RNG, battle state
//! - `parse`: The directive mini-language (scanner, directives,
//!   trigger patterns, capture expressions)
//! - `marks`: Status effects and their per-battler registry
//! - `cards`: Card-collection operations and the forwarding boundary
//! - `resolve`: The resolver, delay queue, and pass results
//! - `error`: The recoverable error taxonomy

pub mod cards;
pub mod core;
pub mod error;
pub mod marks;
pub mod parse;
pub mod resolve;

// Re-export commonly used types
pub use crate::core::{
    BattleRng, BattleRngState, BattleState, Battler, BattlerId, BattlerTemplate, DamageOutcome,
    Faction, Roster, StatBlock,
};

pub use crate::parse::{
    parse_mark_clause, parse_script, parse_span, CaptureValue, Directive, EntityAction,
    EntityDirective, Expr, GlobalDirective, ModifierSet, ParsedScript, Replacement,
    TriggerPattern,
};

pub use crate::marks::{DurationKind, Mark, MarkId, MarkNotice, MarkRegistry, MarkSpec};

pub use crate::cards::{CardCollection, CardFace, CardOp, DiscardRequest, NullCollection, Zone};

pub use crate::resolve::{
    ApplicationResult, DelayQueue, DelayedDirective, DelayedEffect, DirectiveKind, EffectResolver,
    FiredModifiers, PassOutcome, MAX_REWRITE_DEPTH,
};

pub use crate::error::{CollaboratorRejection, EngineError};
