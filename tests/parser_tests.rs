//! Directive parser surface tests.
//!
//! These exercise the whole text-to-directive path: span extraction
//! from prose, run-on recovery, entity and global directive shapes,
//! and the strict-span/forgiving-stream contract.

use warscript::cards::{CardFace, CardOp, DiscardRequest, Zone};
use warscript::marks::DurationKind;
use warscript::parse::{parse_script, Directive, EntityAction};

fn entity_actions(text: &str) -> Vec<EntityAction> {
    parse_script(text)
        .directives
        .into_iter()
        .filter_map(|d| match d {
            Directive::Entity(e) => Some(e.action),
            Directive::Global(_) => None,
        })
        .collect()
}

/// Prose around and between directives is ignored.
#[test]
fn test_directives_amid_prose() {
    let text = "Ralph swings his sword in a wide arc! The slime splits apart \
                [Slime A: damaged 7] while its twin recoils [Slime B: damaged 3 | acc 0.5]. \
                Ralph feels invigorated. [Ralph: healed 2]";

    let script = parse_script(text);
    assert_eq!(script.directives.len(), 3);
    assert_eq!(script.malformed(), 0);
}

#[test]
fn test_all_entity_verbs() {
    let actions = entity_actions(
        "[a: damaged 5] [b: healed 3] [c: shield 4] [d: shield -2] [e: -poison]",
    );
    assert_eq!(
        actions,
        vec![
            EntityAction::Damage(5),
            EntityAction::Heal(3),
            EntityAction::ShieldDelta(4),
            EntityAction::ShieldDelta(-2),
            EntityAction::MarkDestroy("poison".to_string()),
        ]
    );
}

#[test]
fn test_modifier_row() {
    let script = parse_script("[Slime A: damaged 4 | acc 0.75 | crit 0.5 | delay 1 | pierce | drain]");
    let Directive::Entity(directive) = &script.directives[0] else {
        panic!("expected entity directive");
    };
    assert_eq!(directive.modifiers.accuracy, 0.75);
    assert_eq!(directive.modifiers.crit, 0.5);
    assert_eq!(directive.modifiers.delay, 1);
    assert!(directive.modifiers.pierce);
    assert!(directive.modifiers.drain);
}

/// A missing or non-numeric magnitude fails the span; it never
/// defaults to zero.
#[test]
fn test_magnitude_is_mandatory() {
    for bad in ["[x: damaged]", "[x: damaged much]", "[x: healed ]"] {
        let script = parse_script(bad);
        assert!(script.directives.is_empty(), "{bad} should not parse");
        assert_eq!(script.malformed(), 1, "{bad} should be counted");
    }
}

#[test]
fn test_mark_clause_full() {
    let script = parse_script(
        "[Ralph: +diamond shield [2 times] [ME: damaged {:d}] (if m[0] <= 2) -> [ME: damaged 0];]",
    );
    let Directive::Entity(directive) = &script.directives[0] else {
        panic!("expected entity directive");
    };
    let EntityAction::MarkApply(spec) = &directive.action else {
        panic!("expected mark apply");
    };
    assert_eq!(spec.name, "diamond shield");
    assert_eq!(spec.duration, 2);
    assert_eq!(spec.kind, DurationKind::Uses);
    assert!(spec.condition.is_some());
}

#[test]
fn test_mark_clause_turns_no_condition() {
    let script = parse_script(
        "[Slime A: +enraged [3 turns] [ME: damaged {:d}] -> [ME: damaged {m[0] * 2}]]",
    );
    let Directive::Entity(directive) = &script.directives[0] else {
        panic!("expected entity directive");
    };
    let EntityAction::MarkApply(spec) = &directive.action else {
        panic!("expected mark apply");
    };
    assert_eq!(spec.kind, DurationKind::Turns);
    assert_eq!(spec.duration, 3);
    assert!(spec.condition.is_none());
}

/// A run-on span (several directives jammed into one bracket with
/// semicolons) is split and recovered.
#[test]
fn test_run_on_recovery() {
    let script = parse_script("[Ralph: damaged 1; Slime A: damaged 2; draw 1;]");
    assert_eq!(script.directives.len(), 3);
    assert_eq!(script.malformed(), 0);
}

/// A bad span drops alone; its neighbors still parse.
#[test]
fn test_bad_span_isolated() {
    let script = parse_script("[Ralph: damaged 1] [nonsense here] [Slime A: damaged 2]");
    assert_eq!(script.directives.len(), 2);
    assert_eq!(script.malformed(), 1);
}

#[test]
fn test_global_ops() {
    let expected = vec![
        CardOp::Draw { count: 2 },
        CardOp::Discard {
            request: DiscardRequest::Count(1),
        },
        CardOp::Discard {
            request: DiscardRequest::Cards(vec!["Fireball".to_string(), "Ember".to_string()]),
        },
        CardOp::Duplicate {
            card: "Fireball".to_string(),
            zone: Zone::DeckTop,
            count: 2,
        },
        CardOp::Create {
            face: CardFace {
                name: "Spark".to_string(),
                description: "deal 1 damage".to_string(),
            },
            zone: Zone::Hand,
            count: 1,
        },
        CardOp::Transform {
            card: "Fireball".to_string(),
            face: CardFace {
                name: "Ember".to_string(),
                description: "deal 1 damage".to_string(),
            },
        },
        CardOp::Destroy {
            cards: vec!["Ember".to_string()],
        },
        CardOp::DestroyRule { rule: 4 },
    ];

    let script = parse_script(
        "[draw 2] [discard 1] [discard Fireball, Ember] [duplicate Fireball deck_top 2] \
         [create <Spark: deal 1 damage>] [transform Fireball to <Ember: deal 1 damage>] \
         [destroy Ember] [destroy-rule 4]",
    );

    let ops: Vec<CardOp> = script
        .directives
        .into_iter()
        .map(|d| match d {
            Directive::Global(g) => g.op,
            Directive::Entity(_) => panic!("expected global directive"),
        })
        .collect();
    assert_eq!(ops, expected);
}

#[test]
fn test_global_delay_modifier() {
    let script = parse_script("[draw 2 | delay 1]");
    let Directive::Global(directive) = &script.directives[0] else {
        panic!("expected global directive");
    };
    assert_eq!(directive.delay, 1);
}

/// A condition containing a non-ASCII operator glyph fails its own
/// span; the rest of the stream still parses.
#[test]
fn test_multibyte_condition_drops_alone() {
    let script = parse_script(
        "[Ralph: +guard [2 times] [ME: damaged {:d}] (if m[0] <\u{2264} 2) -> [ME: damaged 0]] \
         [Slime A: damaged 2]",
    );
    assert_eq!(script.directives.len(), 1);
    assert_eq!(script.malformed(), 1);
}

/// Nested brackets inside a mark clause stay inside their span.
#[test]
fn test_nested_brackets_one_span() {
    let script = parse_script(
        "He hunkers down. [Ralph: +guard [2 turns] [ME: damaged {:d}] -> [ME: damaged {m[0] / 2}]] \
         The slime watches.",
    );
    assert_eq!(script.directives.len(), 1);
    assert_eq!(script.malformed(), 0);
}
