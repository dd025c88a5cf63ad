//! Trigger patterns and replacement templates.
//!
//! A mark watches for a directive shape like `[ME: damaged {:d}]`:
//! a target selector, a verb (fixed or `{}` capture), and a magnitude
//! slot (literal, `{:d}` numeric capture, or `{}`). On a match the
//! slots bind `m[0]`, `m[1]`, ... in source order, and the
//! replacement template `[ME: damaged {m[0] / 2}]` is evaluated over
//! them to build the superseding directive.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use super::expr::{CaptureValue, Expr, ExprError};

/// Captures bound by one pattern match.
pub type Captures = SmallVec<[CaptureValue; 4]>;

/// Errors from parsing a pattern or replacement template.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("expected `target: verb magnitude`, got `{0}`")]
    BadShape(String),

    #[error("unknown verb `{0}`")]
    UnknownVerb(String),

    #[error("bad magnitude slot `{0}`")]
    BadSlot(String),

    #[error("bad template expression: {0}")]
    BadExpr(#[from] ExprError),
}

/// Who a pattern or template line refers to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSelector {
    /// `ME`: the mark's owner.
    Owner,
    /// A battler name, matched loosely against the owner (patterns)
    /// or resolved against the roster (replacements).
    Name(String),
}

impl TargetSelector {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("me") {
            Self::Owner
        } else {
            Self::Name(raw.to_string())
        }
    }
}

/// Verb position of a trigger pattern.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerbPattern {
    /// A fixed verb: `damaged`, `healed`, or `shield`.
    Exact(String),
    /// `{}`: any verb, bound as a text capture.
    Capture,
}

/// Magnitude position of a trigger pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotPattern {
    /// A fixed magnitude.
    Literal(i64),
    /// `{:d}` or `{}`: any magnitude, bound as a numeric capture.
    Capture,
}

/// The directive shape a mark watches for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerPattern {
    /// Which target the watched directive must have. Patterns are
    /// only tested against directives already aimed at the mark's
    /// owner, so anything but `Owner` or the owner's own name never
    /// matches.
    pub target: TargetSelector,
    /// Verb to match.
    pub verb: VerbPattern,
    /// Magnitude to match.
    pub slot: SlotPattern,
}

impl TriggerPattern {
    /// Parse the inside of a pattern bracket: `ME: damaged {:d}`.
    pub fn parse(src: &str) -> Result<Self, PatternError> {
        let (target_raw, rest) = src
            .split_once(':')
            .ok_or_else(|| PatternError::BadShape(src.to_string()))?;
        let mut words = rest.split_whitespace();
        let verb_raw = words
            .next()
            .ok_or_else(|| PatternError::BadShape(src.to_string()))?;
        let slot_raw = words
            .next()
            .ok_or_else(|| PatternError::BadShape(src.to_string()))?;
        if words.next().is_some() {
            return Err(PatternError::BadShape(src.to_string()));
        }

        let verb = match verb_raw {
            "{}" => VerbPattern::Capture,
            v if is_numeric_verb(v) => VerbPattern::Exact(v.to_string()),
            v => return Err(PatternError::UnknownVerb(v.to_string())),
        };

        let slot = match slot_raw {
            "{}" | "{:d}" => SlotPattern::Capture,
            raw => SlotPattern::Literal(
                raw.parse()
                    .map_err(|_| PatternError::BadSlot(raw.to_string()))?,
            ),
        };

        Ok(Self {
            target: TargetSelector::parse(target_raw),
            verb,
            slot,
        })
    }

    /// Test against a directive aimed at the pattern owner. Returns
    /// the bound captures on a match.
    ///
    /// `owner_name` and `owner_stem` let a pattern written with the
    /// owner's literal name (instead of `ME`) still match.
    #[must_use]
    pub fn match_directive(
        &self,
        owner_name: &str,
        owner_stem: &str,
        verb: &str,
        magnitude: i64,
    ) -> Option<Captures> {
        match &self.target {
            TargetSelector::Owner => {}
            TargetSelector::Name(name) => {
                if !name.eq_ignore_ascii_case(owner_name) && !name.eq_ignore_ascii_case(owner_stem)
                {
                    return None;
                }
            }
        }

        let mut captures = Captures::new();

        match &self.verb {
            VerbPattern::Exact(expected) => {
                if expected != verb {
                    return None;
                }
            }
            VerbPattern::Capture => captures.push(CaptureValue::Text(verb.to_string())),
        }

        match self.slot {
            SlotPattern::Literal(expected) => {
                if expected != magnitude {
                    return None;
                }
            }
            SlotPattern::Capture => captures.push(CaptureValue::Int(magnitude)),
        }

        Some(captures)
    }
}

/// Verb position of a replacement template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerbTemplate {
    /// A fixed verb.
    Exact(String),
    /// `{m[i]}`: substitute a text capture.
    Capture(usize),
}

/// Magnitude position of a replacement template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MagnitudeTemplate {
    /// A fixed magnitude.
    Literal(i64),
    /// `{expr}`: arithmetic over the bound captures.
    Expr(Expr),
}

/// The directive a matching mark produces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    /// Target of the superseding directive.
    pub target: TargetSelector,
    /// Verb of the superseding directive.
    pub verb: VerbTemplate,
    /// Magnitude of the superseding directive.
    pub magnitude: MagnitudeTemplate,
}

/// A fully evaluated replacement, ready to re-enter matching.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewrittenDirective {
    /// `None` keeps the current target (the mark's owner).
    pub target: Option<String>,
    /// Verb of the new directive.
    pub verb: String,
    /// Magnitude of the new directive.
    pub magnitude: i64,
}

impl Replacement {
    /// Parse the inside of a replacement bracket: `ME: damaged {m[0] + 2}`.
    pub fn parse(src: &str) -> Result<Self, PatternError> {
        let (target_raw, rest) = src
            .split_once(':')
            .ok_or_else(|| PatternError::BadShape(src.to_string()))?;
        let rest = rest.trim();

        // Verb is everything up to the magnitude token, which is
        // either a brace group or the final whitespace-separated word.
        let (verb_raw, magnitude_raw) = match rest.find('{') {
            Some(brace) => {
                let verb_part = rest[..brace].trim();
                if verb_part.is_empty() {
                    // The brace group is the verb substitution; the
                    // magnitude follows it.
                    let close = rest
                        .find('}')
                        .ok_or_else(|| PatternError::BadShape(src.to_string()))?;
                    (rest[..=close].trim(), rest[close + 1..].trim())
                } else {
                    (verb_part, rest[brace..].trim())
                }
            }
            None => rest
                .rsplit_once(char::is_whitespace)
                .map(|(v, m)| (v.trim(), m.trim()))
                .ok_or_else(|| PatternError::BadShape(src.to_string()))?,
        };
        if verb_raw.is_empty() || magnitude_raw.is_empty() {
            return Err(PatternError::BadShape(src.to_string()));
        }

        let verb = if let Some(inner) = brace_inner(verb_raw) {
            let expr = Expr::parse(inner)?;
            match expr {
                Expr::Capture(i) => VerbTemplate::Capture(i),
                _ => return Err(PatternError::BadShape(src.to_string())),
            }
        } else if is_numeric_verb(verb_raw) {
            VerbTemplate::Exact(verb_raw.to_string())
        } else {
            return Err(PatternError::UnknownVerb(verb_raw.to_string()));
        };

        let magnitude = if let Some(inner) = brace_inner(magnitude_raw) {
            MagnitudeTemplate::Expr(Expr::parse(inner)?)
        } else {
            MagnitudeTemplate::Literal(
                magnitude_raw
                    .parse()
                    .map_err(|_| PatternError::BadSlot(magnitude_raw.to_string()))?,
            )
        };

        Ok(Self {
            target: TargetSelector::parse(target_raw),
            verb,
            magnitude,
        })
    }

    /// Evaluate over the captures of a successful match.
    pub fn evaluate(&self, captures: &Captures) -> Result<RewrittenDirective, PatternError> {
        let verb = match &self.verb {
            VerbTemplate::Exact(v) => v.clone(),
            VerbTemplate::Capture(i) => match captures.get(*i) {
                Some(CaptureValue::Text(v)) => v.clone(),
                Some(CaptureValue::Int(n)) => return Err(PatternError::UnknownVerb(n.to_string())),
                None => return Err(PatternError::BadExpr(ExprError::CaptureUnbound(*i))),
            },
        };
        if !is_numeric_verb(&verb) {
            return Err(PatternError::UnknownVerb(verb));
        }

        let magnitude = match &self.magnitude {
            MagnitudeTemplate::Literal(n) => *n,
            MagnitudeTemplate::Expr(expr) => expr.eval(captures)?,
        };

        let target = match &self.target {
            TargetSelector::Owner => None,
            TargetSelector::Name(name) => Some(name.clone()),
        };

        Ok(RewrittenDirective {
            target,
            verb,
            magnitude,
        })
    }
}

/// The verbs a pattern may watch and a replacement may produce.
#[must_use]
pub fn is_numeric_verb(verb: &str) -> bool {
    matches!(verb, "damaged" | "healed" | "shield")
}

fn brace_inner(raw: &str) -> Option<&str> {
    raw.strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .map(str::trim)
}
