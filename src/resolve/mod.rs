//! Resolution: the modifier pipeline, the delay queue, and pass results.

mod queue;
mod resolver;
mod result;

pub use queue::{DelayQueue, DelayedDirective, DelayedEffect};
pub use resolver::{EffectResolver, MAX_REWRITE_DEPTH};
pub use result::{ApplicationResult, DirectiveKind, FiredModifiers, PassOutcome};
