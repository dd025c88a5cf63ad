//! Typed directive production.
//!
//! One bracket span becomes one [`Directive`]: either entity-targeted
//! (`[Ralph: damaged 5 | crit 0.3 | pierce]`, mark apply/destroy) or
//! global (`[draw 2 | delay 1]`, card-collection operations). A span
//! that fails here fails alone; the caller logs it and moves on.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cards::{CardFace, CardOp, DiscardRequest, Zone};
use crate::error::EngineError;
use crate::marks::{DurationKind, MarkSpec};

use super::expr::Expr;
use super::pattern::{Replacement, TriggerPattern};

/// The numeric modifiers riding on an entity directive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModifierSet {
    /// Chance to land at all. Defaults to certain.
    pub accuracy: f64,
    /// Chance to double the magnitude. Defaults to never.
    pub crit: f64,
    /// End-of-turn boundaries to wait before firing.
    pub delay: u32,
    /// Ignore the target's shield.
    pub pierce: bool,
    /// Heal the source by the dealt magnitude.
    pub drain: bool,
}

impl Default for ModifierSet {
    fn default() -> Self {
        Self {
            accuracy: 1.0,
            crit: 0.0,
            delay: 0,
            pierce: false,
            drain: false,
        }
    }
}

/// What an entity directive does to its target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EntityAction {
    /// `damaged n`: lose hp, shield absorbing first.
    Damage(i64),
    /// `healed n`: regain hp up to mhp.
    Heal(i64),
    /// `shield ±n`: change shield points, floored at 0.
    ShieldDelta(i64),
    /// `+name[...]...`: attach a mark.
    MarkApply(MarkSpec),
    /// `-name`: detach a mark by name.
    MarkDestroy(String),
}

/// A parsed entity-targeted directive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityDirective {
    /// Target name as written; resolved fuzzily at application time.
    pub target: String,
    /// The effect.
    pub action: EntityAction,
    /// Modifier pipeline inputs.
    pub modifiers: ModifierSet,
}

/// A parsed global directive, forwarded to the card collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalDirective {
    /// The operation.
    pub op: CardOp,
    /// End-of-turn boundaries to wait before forwarding.
    pub delay: u32,
}

/// One bracket span, parsed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Directive {
    /// Targets one battler.
    Entity(EntityDirective),
    /// Operates on the card collection.
    Global(GlobalDirective),
}

const GLOBAL_KEYWORDS: [&str; 7] = [
    "draw",
    "discard",
    "duplicate",
    "create",
    "transform",
    "destroy",
    "destroy-rule",
];

/// Parse one bracket span, brackets included.
pub fn parse_span(span: &str) -> Result<Directive, EngineError> {
    let inner = span
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| EngineError::parse(span, "not a bracketed directive"))?
        .trim();
    if inner.is_empty() {
        return Err(EngineError::parse(span, "empty directive"));
    }

    let keyword = inner.split_whitespace().next().unwrap_or("");
    if GLOBAL_KEYWORDS.contains(&keyword) {
        parse_global(span, inner).map(Directive::Global)
    } else {
        parse_entity(span, inner).map(Directive::Entity)
    }
}

fn parse_entity(span: &str, inner: &str) -> Result<EntityDirective, EngineError> {
    let (target, rest) = inner
        .split_once(':')
        .ok_or_else(|| EngineError::parse(span, "expected `target: effect`"))?;
    let target = target.trim();
    if target.is_empty() {
        return Err(EngineError::parse(span, "missing target name"));
    }
    let rest = rest.trim();

    if rest.starts_with('+') {
        let spec = parse_mark_clause(rest)?;
        return Ok(EntityDirective {
            target: target.to_string(),
            action: EntityAction::MarkApply(spec),
            modifiers: ModifierSet::default(),
        });
    }

    if let Some(name) = rest.strip_prefix('-') {
        let name = name.trim().trim_end_matches(';').trim();
        if name.is_empty() {
            return Err(EngineError::parse(span, "missing mark name after `-`"));
        }
        return Ok(EntityDirective {
            target: target.to_string(),
            action: EntityAction::MarkDestroy(name.to_string()),
            modifiers: ModifierSet::default(),
        });
    }

    let segments = split_segments(rest);
    let head = segments.first().copied().unwrap_or("").trim();

    let mut words = head.split_whitespace();
    let verb = words
        .next()
        .ok_or_else(|| EngineError::parse(span, "missing verb"))?;
    let magnitude_raw = words
        .next()
        .ok_or_else(|| EngineError::parse(span, format!("`{verb}` needs a magnitude")))?;
    if let Some(extra) = words.next() {
        return Err(EngineError::parse(span, format!("unexpected `{extra}`")));
    }
    let magnitude: i64 = magnitude_raw
        .parse()
        .map_err(|_| EngineError::parse(span, format!("`{magnitude_raw}` is not a number")))?;

    let action = match verb {
        "damaged" | "healed" => {
            if magnitude < 0 {
                return Err(EngineError::parse(span, format!("`{verb}` magnitude must be non-negative")));
            }
            if verb == "damaged" {
                EntityAction::Damage(magnitude)
            } else {
                EntityAction::Heal(magnitude)
            }
        }
        "shield" => EntityAction::ShieldDelta(magnitude),
        other => {
            return Err(EngineError::parse(span, format!("unknown verb `{other}`")));
        }
    };

    let modifiers = parse_modifiers(span, &segments[1..])?;

    Ok(EntityDirective {
        target: target.to_string(),
        action,
        modifiers,
    })
}

fn parse_modifiers(span: &str, segments: &[&str]) -> Result<ModifierSet, EngineError> {
    let mut modifiers = ModifierSet::default();

    for segment in segments {
        let segment = segment.trim();
        let mut words = segment.split_whitespace();
        match words.next() {
            Some("pierce") => modifiers.pierce = true,
            Some("drain") => modifiers.drain = true,
            Some("acc") => modifiers.accuracy = chance_value(span, "acc", words.next())?,
            Some("crit") => modifiers.crit = chance_value(span, "crit", words.next())?,
            Some("delay") => modifiers.delay = count_value(span, "delay", words.next())?,
            Some(other) => {
                debug!(span, modifier = other, "ignoring unknown modifier");
            }
            None => {}
        }
    }

    Ok(modifiers)
}

fn chance_value(span: &str, keyword: &str, raw: Option<&str>) -> Result<f64, EngineError> {
    raw.and_then(|r| r.parse().ok())
        .ok_or_else(|| EngineError::parse(span, format!("`{keyword}` needs a probability")))
}

fn count_value(span: &str, keyword: &str, raw: Option<&str>) -> Result<u32, EngineError> {
    raw.and_then(|r| r.parse().ok())
        .ok_or_else(|| EngineError::parse(span, format!("`{keyword}` needs a whole number")))
}

/// Parse a mark clause: `+name [duration] [pattern] (if cond)? -> [replacement]`,
/// optionally `;`-terminated. Also the format battler templates carry
/// their innate marks in.
pub fn parse_mark_clause(clause: &str) -> Result<MarkSpec, EngineError> {
    let err = |reason: &str| EngineError::parse(clause, reason);

    let src = clause.trim().trim_end_matches(';').trim_end();
    let body = src
        .strip_prefix('+')
        .ok_or_else(|| err("mark clause must start with `+`"))?;

    let open = body.find('[').ok_or_else(|| err("missing duration"))?;
    let name = body[..open].trim();
    if name.is_empty() {
        return Err(err("missing mark name"));
    }

    let (duration_raw, rest) =
        bracket_group(&body[open..]).ok_or_else(|| err("unclosed duration"))?;
    let (duration, kind) = parse_duration(clause, duration_raw)?;

    let rest = rest.trim_start();
    if !rest.starts_with('[') {
        return Err(err("missing trigger pattern"));
    }
    let (pattern_raw, rest) = bracket_group(rest).ok_or_else(|| err("unclosed trigger pattern"))?;
    let pattern =
        TriggerPattern::parse(pattern_raw).map_err(|e| EngineError::parse(clause, e))?;

    let mut rest = rest.trim_start();
    let condition = if rest.starts_with('(') {
        let (cond_raw, after) = paren_group(rest).ok_or_else(|| err("unclosed condition"))?;
        rest = after.trim_start();
        let cond_src = cond_raw
            .trim_start()
            .strip_prefix("if")
            .filter(|s| s.starts_with(|c: char| c.is_whitespace() || c == '('))
            .ok_or_else(|| err("condition must start with `if`"))?;
        Some(Expr::parse(cond_src).map_err(|e| EngineError::parse(clause, e))?)
    } else {
        None
    };

    let rest = rest
        .strip_prefix("->")
        .ok_or_else(|| err("missing `->`"))?
        .trim_start();
    if !rest.starts_with('[') {
        return Err(err("missing replacement"));
    }
    let (replacement_raw, tail) =
        bracket_group(rest).ok_or_else(|| err("unclosed replacement"))?;
    let replacement =
        Replacement::parse(replacement_raw).map_err(|e| EngineError::parse(clause, e))?;

    let tail = tail.trim().trim_end_matches(';').trim();
    if !tail.is_empty() {
        return Err(err("trailing text after replacement"));
    }

    Ok(MarkSpec {
        name: name.to_string(),
        duration,
        kind,
        pattern,
        condition,
        replacement,
    })
}

fn parse_duration(clause: &str, raw: &str) -> Result<(u32, DurationKind), EngineError> {
    let mut words = raw.split_whitespace();
    let count_raw = words.next().unwrap_or("");
    let unit = words.next().unwrap_or("");
    if words.next().is_some() {
        return Err(EngineError::parse(clause, format!("bad duration `{raw}`")));
    }

    let duration: u32 = count_raw
        .parse()
        .map_err(|_| EngineError::parse(clause, format!("bad duration `{raw}`")))?;
    if duration == 0 {
        return Err(EngineError::parse(clause, "duration must be positive"));
    }

    let kind = match unit {
        "turn" | "turns" => DurationKind::Turns,
        "time" | "times" | "use" | "uses" => DurationKind::Uses,
        _ => return Err(EngineError::parse(clause, format!("bad duration `{raw}`"))),
    };

    Ok((duration, kind))
}

fn parse_global(span: &str, inner: &str) -> Result<GlobalDirective, EngineError> {
    let segments = split_segments(inner);
    let head = segments.first().copied().unwrap_or("").trim();

    let mut delay = 0;
    for segment in &segments[1..] {
        let segment = segment.trim();
        let mut words = segment.split_whitespace();
        match words.next() {
            Some("delay") => delay = count_value(span, "delay", words.next())?,
            Some(other) => {
                debug!(span, modifier = other, "ignoring unknown modifier");
            }
            None => {}
        }
    }

    let (keyword, args) = head
        .split_once(char::is_whitespace)
        .unwrap_or((head, ""));
    let args = args.trim();

    let op = match keyword {
        "draw" => CardOp::Draw {
            count: positive_count(span, "draw", args)?,
        },
        "discard" => {
            if args.is_empty() {
                return Err(EngineError::parse(span, "discard needs a count or cards"));
            }
            match args.parse::<u32>() {
                Ok(0) => return Err(EngineError::parse(span, "discard count must be positive")),
                Ok(n) => CardOp::Discard {
                    request: DiscardRequest::Count(n),
                },
                Err(_) => CardOp::Discard {
                    request: DiscardRequest::Cards(split_refs(args)),
                },
            }
        }
        "duplicate" => parse_duplicate(span, args)?,
        "create" => parse_create(span, args)?,
        "transform" => parse_transform(span, args)?,
        "destroy" => {
            let cards = split_refs(args);
            if cards.is_empty() {
                return Err(EngineError::parse(span, "destroy needs at least one card"));
            }
            CardOp::Destroy { cards }
        }
        "destroy-rule" => CardOp::DestroyRule {
            rule: args
                .parse()
                .map_err(|_| EngineError::parse(span, "destroy-rule needs a rule id"))?,
        },
        other => {
            return Err(EngineError::parse(span, format!("unknown operation `{other}`")));
        }
    };

    Ok(GlobalDirective { op, delay })
}

fn parse_duplicate(span: &str, args: &str) -> Result<CardOp, EngineError> {
    let mut rest = args.trim();
    let mut count = 1;
    let mut zone = Zone::Hand;

    if let Some((head, last)) = rest.rsplit_once(char::is_whitespace) {
        if let Ok(n) = last.parse::<u32>() {
            if n == 0 {
                return Err(EngineError::parse(span, "duplicate count must be positive"));
            }
            count = n;
            rest = head.trim_end();
        }
    }
    if let Some((head, last)) = rest.rsplit_once(char::is_whitespace) {
        if let Some(z) = Zone::parse(last) {
            zone = z;
            rest = head.trim_end();
        }
    }
    if rest.is_empty() {
        return Err(EngineError::parse(span, "duplicate needs a card"));
    }

    Ok(CardOp::Duplicate {
        card: rest.to_string(),
        zone,
        count,
    })
}

fn parse_create(span: &str, args: &str) -> Result<CardOp, EngineError> {
    if !args.starts_with('<') {
        return Err(EngineError::parse(span, "create needs a card literal"));
    }
    let close = args
        .rfind('>')
        .ok_or_else(|| EngineError::parse(span, "unclosed card literal"))?;
    let face = CardFace::parse(&args[..=close])
        .ok_or_else(|| EngineError::parse(span, "bad card literal"))?;

    let mut zone = Zone::Hand;
    let mut count = 1;
    for token in args[close + 1..].split_whitespace() {
        if let Some(z) = Zone::parse(token) {
            zone = z;
        } else if let Ok(n) = token.parse::<u32>() {
            if n == 0 {
                return Err(EngineError::parse(span, "create count must be positive"));
            }
            count = n;
        } else {
            return Err(EngineError::parse(span, format!("unexpected `{token}`")));
        }
    }

    Ok(CardOp::Create { face, zone, count })
}

fn parse_transform(span: &str, args: &str) -> Result<CardOp, EngineError> {
    let shape = || EngineError::parse(span, "expected `transform <card> to <name: description>`");

    let literal_start = args.find('<').ok_or_else(shape)?;
    let face = CardFace::parse(&args[literal_start..]).ok_or_else(shape)?;

    let head = args[..literal_start].trim_end();
    let card = head.strip_suffix("to").ok_or_else(shape)?;
    if !card.ends_with(char::is_whitespace) {
        return Err(shape());
    }
    let card = card.trim();
    if card.is_empty() {
        return Err(shape());
    }

    Ok(CardOp::Transform {
        card: card.to_string(),
        face,
    })
}

/// Split on `|` at top level, leaving `<...>` card literals intact.
fn split_segments(inner: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            '|' if depth <= 0 => {
                segments.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&inner[start..]);
    segments
}

fn split_refs(args: &str) -> Vec<String> {
    args.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

fn positive_count(span: &str, keyword: &str, args: &str) -> Result<u32, EngineError> {
    match args.parse::<u32>() {
        Ok(0) | Err(_) => Err(EngineError::parse(
            span,
            format!("{keyword} needs a positive count"),
        )),
        Ok(n) => Ok(n),
    }
}

fn bracket_group(src: &str) -> Option<(&str, &str)> {
    group(src, '[', ']')
}

fn paren_group(src: &str) -> Option<(&str, &str)> {
    group(src, '(', ')')
}

fn group(src: &str, open: char, close: char) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, c) in src.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some((&src[open.len_utf8()..i], &src[i + close.len_utf8()..]));
            }
        }
    }
    None
}
