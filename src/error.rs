//! Engine error taxonomy.
//!
//! Every error here is recoverable at the directive boundary: a bad
//! span, an unresolvable target, a runaway rewrite chain, or a card
//! collection refusing an operation all skip the offending directive
//! and let the rest of the pass proceed. Nothing in the engine
//! panics on malformed input.

use thiserror::Error;

use crate::core::BattlerId;

/// Errors surfaced while resolving a directive pass.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A span was recognizably a directive but failed to parse.
    #[error("cannot parse `{span}`: {reason}")]
    Parse {
        /// The offending span, brackets included.
        span: String,
        /// What went wrong.
        reason: String,
    },

    /// A target name resolved to no active battler.
    #[error("no active battler matches `{name}`")]
    UnknownEntity {
        /// The name as written in the directive.
        name: String,
    },

    /// A rewrite chain exceeded the depth bound without settling.
    #[error("rewrite chain on {target} exceeded depth {depth}")]
    RuleLoop {
        /// Battler whose marks kept rewriting.
        target: BattlerId,
        /// The bound that was hit.
        depth: u32,
    },

    /// The card collection refused a forwarded operation.
    #[error("card operation `{op}` rejected: {reason}")]
    Collaborator {
        /// Name of the refused operation.
        op: String,
        /// The collection's stated reason.
        reason: String,
    },
}

impl EngineError {
    /// Build a parse error for a span.
    #[must_use]
    pub fn parse(span: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Parse {
            span: span.into(),
            reason: reason.to_string(),
        }
    }

    /// Build an unknown-entity error.
    #[must_use]
    pub fn unknown_entity(name: impl Into<String>) -> Self {
        Self::UnknownEntity { name: name.into() }
    }
}

/// A card collection's refusal of one forwarded operation.
///
/// Collections own their zone bookkeeping; the engine treats any
/// refusal as final, records it, and moves on.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct CollaboratorRejection {
    /// The collection's stated reason.
    pub reason: String,
}

impl CollaboratorRejection {
    /// Create a rejection with a reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
