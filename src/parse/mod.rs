//! The directive mini-language.
//!
//! Turn outcomes arrive as narrated prose with bracket directives
//! embedded in it. This module owns the whole surface syntax: span
//! extraction ([`scanner`]), typed directive production
//! ([`directive`]), trigger patterns and replacement templates for
//! marks ([`pattern`]), and the capture expression language
//! ([`expr`]).
//!
//! Parsing is forgiving at the stream level and strict at the span
//! level: prose and unknown modifiers are ignored, but a span that is
//! recognizably a directive must be fully well-formed or it is
//! dropped (and counted) without touching battle state.

mod directive;
mod expr;
mod pattern;
mod scanner;

pub use directive::{
    parse_mark_clause, parse_span, Directive, EntityAction, EntityDirective, GlobalDirective,
    ModifierSet,
};
pub use expr::{BinOp, CaptureValue, Expr, ExprError};
pub use pattern::{
    is_numeric_verb, Captures, MagnitudeTemplate, PatternError, Replacement, RewrittenDirective,
    SlotPattern, TargetSelector, TriggerPattern, VerbPattern, VerbTemplate,
};
pub use scanner::{split_run_on, top_level_spans};

use tracing::warn;

use crate::error::EngineError;

/// Everything one pass of text parsed into.
#[derive(Clone, Debug, Default)]
pub struct ParsedScript {
    /// Well-formed directives, in text order.
    pub directives: Vec<Directive>,
    /// One error per dropped span, in text order.
    pub errors: Vec<EngineError>,
}

impl ParsedScript {
    /// Number of spans that failed to parse.
    #[must_use]
    pub fn malformed(&self) -> usize {
        self.errors.len()
    }
}

/// Scan narrated text and parse every top-level bracket span.
///
/// Malformed spans are logged, recorded, and skipped; they never
/// abort the rest of the text.
#[must_use]
pub fn parse_script(text: &str) -> ParsedScript {
    let mut script = ParsedScript::default();

    for span in top_level_spans(text) {
        for segment in split_run_on(span) {
            match parse_span(&segment) {
                Ok(directive) => script.directives.push(directive),
                Err(err) => {
                    warn!(span = segment.as_str(), %err, "dropping malformed span");
                    script.errors.push(err);
                }
            }
        }
    }

    script
}
