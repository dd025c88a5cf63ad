//! The effect resolver.
//!
//! One resolution pass takes narrated text and mutates battle state
//! through a fixed pipeline per entity directive: accuracy roll,
//! delay parking, critical doubling, mark interception (bounded),
//! commit, drain. Global directives are validated and forwarded to
//! the card collection. Every failure along the way is recovered at
//! the directive boundary: the rest of the pass always runs.

use tracing::{debug, warn};

use crate::cards::{forward, CardCollection};
use crate::core::{BattleState, BattlerId};
use crate::error::EngineError;
use crate::marks::MarkNotice;
use crate::parse::{parse_script, Directive, EntityAction, EntityDirective, GlobalDirective, ModifierSet};

use super::queue::{DelayedDirective, DelayedEffect};
use super::result::{ApplicationResult, DirectiveKind, FiredModifiers, PassOutcome};

/// Rewrite chains longer than this are cut off: the chain's last
/// directive commits and a [`EngineError::RuleLoop`] is recorded.
pub const MAX_REWRITE_DEPTH: u32 = 8;

/// Stateless resolver over a [`BattleState`].
pub struct EffectResolver;

impl EffectResolver {
    /// Resolve one pass of narrated text.
    ///
    /// `source` is the battler whose action produced the text (drain
    /// heals it; its defeat cancels directives it delayed). `None`
    /// for sourceless effects such as environment or card text.
    pub fn resolve_pass(
        state: &mut BattleState,
        text: &str,
        source: Option<BattlerId>,
        collection: &mut dyn CardCollection,
    ) -> PassOutcome {
        let script = parse_script(text);
        let mut outcome = PassOutcome {
            malformed: script.malformed(),
            errors: script.errors,
            ..PassOutcome::default()
        };

        for directive in script.directives {
            match directive {
                Directive::Entity(directive) => {
                    Self::apply_entity(state, source, directive, &mut outcome);
                }
                Directive::Global(directive) => {
                    Self::apply_global(state, directive, collection, &mut outcome);
                }
            }
        }

        outcome.notices.extend(state.marks.sweep_expired());
        outcome
    }

    /// Cross an end-of-turn boundary.
    ///
    /// Advances the turn counter, fires everything the delay queue
    /// holds for it (fire-time crit/pierce/drain, schedule-time
    /// accuracy already consumed), then counts down turns-kind marks.
    pub fn end_of_turn(state: &mut BattleState, collection: &mut dyn CardCollection) -> PassOutcome {
        let mut outcome = PassOutcome::default();

        state.turn += 1;
        debug!(turn = state.turn, "end-of-turn boundary");

        for effect in state.delayed.drain_due(state.turn) {
            match effect {
                DelayedEffect::Entity(delayed) => {
                    let gone = state
                        .roster
                        .get(delayed.target)
                        .map_or(true, |b| b.is_defeated());
                    if gone {
                        debug!(target = %delayed.target, "dropping delayed directive, target defeated");
                        continue;
                    }
                    Self::fire(
                        state,
                        delayed.source,
                        delayed.target,
                        delayed.action,
                        delayed.modifiers,
                        true,
                        &mut outcome,
                    );
                }
                DelayedEffect::Global(op) => {
                    if let Err(err) = forward(&op, collection) {
                        warn!(%err, "card operation rejected");
                        outcome.errors.push(err);
                    }
                }
            }
        }

        outcome.notices.extend(state.marks.tick_turns());
        outcome.notices.extend(state.marks.sweep_expired());
        outcome
    }

    fn apply_entity(
        state: &mut BattleState,
        source: Option<BattlerId>,
        directive: EntityDirective,
        outcome: &mut PassOutcome,
    ) {
        let target = match state.roster.resolve(&directive.target) {
            Ok(id) => id,
            Err(err) => {
                warn!(%err, "dropping directive");
                outcome.errors.push(err);
                return;
            }
        };

        match directive.action {
            EntityAction::MarkApply(spec) => {
                debug!(%target, mark = %spec.name, "applying mark");
                outcome.notices.push(state.marks.apply(target, spec));
                outcome.results.push(ApplicationResult {
                    target,
                    kind: DirectiveKind::MarkApply,
                    requested: 0,
                    applied: 0,
                    fired: FiredModifiers::default(),
                    hit: true,
                });
            }
            EntityAction::MarkDestroy(name) => {
                outcome.notices.extend(state.marks.remove_named(target, &name));
                outcome.results.push(ApplicationResult {
                    target,
                    kind: DirectiveKind::MarkDestroy,
                    requested: 0,
                    applied: 0,
                    fired: FiredModifiers::default(),
                    hit: true,
                });
            }
            action => {
                let modifiers = directive.modifiers;

                if !state.rng.roll(modifiers.accuracy) {
                    let (kind, requested) = describe(&action);
                    outcome
                        .results
                        .push(ApplicationResult::miss(target, kind, requested));
                    return;
                }

                if modifiers.delay > 0 {
                    let fire_at = state.turn.saturating_add(modifiers.delay);
                    debug!(%target, fire_at, "parking delayed directive");
                    state.delayed.push(
                        fire_at,
                        DelayedEffect::Entity(DelayedDirective {
                            source,
                            target,
                            action,
                            modifiers: ModifierSet {
                                accuracy: 1.0,
                                delay: 0,
                                ..modifiers
                            },
                        }),
                    );
                    return;
                }

                Self::fire(state, source, target, action, modifiers, false, outcome);
            }
        }
    }

    /// Steps 3-6 of the pipeline: crit, mark interception, commit,
    /// drain. Runs immediately for undelayed directives and at the
    /// boundary for delayed ones.
    fn fire(
        state: &mut BattleState,
        source: Option<BattlerId>,
        target: BattlerId,
        action: EntityAction,
        modifiers: ModifierSet,
        delayed: bool,
        outcome: &mut PassOutcome,
    ) {
        let (mut verb, mut magnitude) = match action {
            EntityAction::Damage(n) => ("damaged".to_string(), n),
            EntityAction::Heal(n) => ("healed".to_string(), n),
            EntityAction::ShieldDelta(n) => ("shield".to_string(), n),
            EntityAction::MarkApply(_) | EntityAction::MarkDestroy(_) => return,
        };
        let mut fired = FiredModifiers {
            delayed,
            ..FiredModifiers::default()
        };
        let mut target = target;

        if state.rng.roll(modifiers.crit) {
            magnitude = magnitude.saturating_mul(2);
            fired.crit = true;
        }

        let mut depth = 0;
        loop {
            let Some(battler) = state.roster.get(target) else {
                break;
            };
            let owner_name = battler.name.clone();
            let owner_stem = battler.name_stem().to_string();

            if depth == MAX_REWRITE_DEPTH {
                if state
                    .marks
                    .find_rewrite(target, &owner_name, &owner_stem, &verb, magnitude)
                    .is_some()
                {
                    warn!(%target, depth = MAX_REWRITE_DEPTH, "rewrite chain cut off");
                    outcome.errors.push(EngineError::RuleLoop {
                        target,
                        depth: MAX_REWRITE_DEPTH,
                    });
                }
                break;
            }

            let Some(rewrite) =
                state
                    .marks
                    .rewrite_once(target, &owner_name, &owner_stem, &verb, magnitude)
            else {
                break;
            };
            debug!(%target, mark = %rewrite.mark, verb = %rewrite.directive.verb,
                magnitude = rewrite.directive.magnitude, "mark rewrote directive");
            outcome.notices.push(MarkNotice::Triggered {
                owner: target,
                name: rewrite.mark,
            });

            verb = rewrite.directive.verb;
            magnitude = rewrite.directive.magnitude;
            if let Some(name) = rewrite.directive.target {
                if !name.eq_ignore_ascii_case(&owner_name)
                    && !name.eq_ignore_ascii_case(&owner_stem)
                {
                    match state.roster.resolve(&name) {
                        Ok(id) => target = id,
                        Err(err) => {
                            warn!(%err, "dropping retargeted directive");
                            outcome.errors.push(err);
                            return;
                        }
                    }
                }
            }
            depth += 1;
        }

        let Some(battler) = state.roster.get_mut(target) else {
            return;
        };
        let was_defeated = battler.is_defeated();
        let (kind, applied) = match verb.as_str() {
            "damaged" => {
                fired.pierce = modifiers.pierce;
                let result = battler.receive_damage(magnitude, modifiers.pierce);
                (DirectiveKind::Damage, result.applied())
            }
            "healed" => (DirectiveKind::Heal, battler.receive_heal(magnitude)),
            "shield" => (DirectiveKind::ShieldDelta, battler.shield_delta(magnitude)),
            // Replacement verbs are validated at parse time.
            _ => return,
        };
        let defeated = !was_defeated && battler.is_defeated();

        if modifiers.drain && kind == DirectiveKind::Damage {
            if let Some(source_id) = source {
                if let Some(source_battler) = state.roster.get_mut(source_id) {
                    if !source_battler.is_defeated() {
                        // Drain heals by the dealt (pre-shield) magnitude.
                        source_battler.receive_heal(magnitude.max(0));
                        fired.drain = true;
                    }
                }
            }
        }

        outcome.results.push(ApplicationResult {
            target,
            kind,
            requested: magnitude,
            applied,
            fired,
            hit: true,
        });

        if defeated {
            Self::handle_defeat(state, target, outcome);
        }
    }

    fn handle_defeat(state: &mut BattleState, target: BattlerId, outcome: &mut PassOutcome) {
        debug!(%target, "battler defeated");
        outcome.notices.extend(state.marks.remove_owner(target));
        let cancelled = state.delayed.cancel_source(target);
        if cancelled > 0 {
            debug!(%target, cancelled, "cancelled delayed directives from defeated source");
        }
    }

    fn apply_global(
        state: &mut BattleState,
        directive: GlobalDirective,
        collection: &mut dyn CardCollection,
        outcome: &mut PassOutcome,
    ) {
        if directive.delay > 0 {
            let fire_at = state.turn.saturating_add(directive.delay);
            debug!(op = %directive.op, fire_at, "parking delayed card operation");
            state.delayed.push(fire_at, DelayedEffect::Global(directive.op));
            return;
        }

        if let Err(err) = forward(&directive.op, collection) {
            warn!(%err, "card operation rejected");
            outcome.errors.push(err);
        }
    }
}

fn describe(action: &EntityAction) -> (DirectiveKind, i64) {
    match action {
        EntityAction::Damage(n) => (DirectiveKind::Damage, *n),
        EntityAction::Heal(n) => (DirectiveKind::Heal, *n),
        EntityAction::ShieldDelta(n) => (DirectiveKind::ShieldDelta, *n),
        EntityAction::MarkApply(_) => (DirectiveKind::MarkApply, 0),
        EntityAction::MarkDestroy(_) => (DirectiveKind::MarkDestroy, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::NullCollection;
    use crate::core::{BattlerTemplate, Faction};

    fn fresh() -> BattleState {
        let mut state = BattleState::new(42);
        state.spawn(&BattlerTemplate::new("Ralph", Faction::Ally, 30));
        state.spawn(&BattlerTemplate::new("Slime A", Faction::Enemy, 10));
        state
    }

    #[test]
    fn test_plain_damage() {
        let mut state = fresh();
        let outcome =
            EffectResolver::resolve_pass(&mut state, "[Ralph: damaged 10]", None, &mut NullCollection);

        assert_eq!(outcome.results.len(), 1);
        let result = &outcome.results[0];
        assert!(result.hit);
        assert_eq!(result.requested, 10);
        assert_eq!(result.applied, 10);
        assert_eq!(state.roster.get(result.target).unwrap().hp(), 20);
    }

    #[test]
    fn test_unknown_target_recovered() {
        let mut state = fresh();
        let outcome = EffectResolver::resolve_pass(
            &mut state,
            "[Dragon: damaged 5] [Ralph: damaged 5]",
            None,
            &mut NullCollection,
        );

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.errors, vec![EngineError::unknown_entity("Dragon")]);
    }

    #[test]
    fn test_mark_apply_and_destroy() {
        let mut state = fresh();
        let ralph = state.roster.resolve("Ralph").unwrap();

        let outcome = EffectResolver::resolve_pass(
            &mut state,
            "[Ralph: +guard [2 turns] [ME: damaged {:d}] -> [ME: damaged 0]]",
            None,
            &mut NullCollection,
        );
        assert_eq!(outcome.results[0].kind, DirectiveKind::MarkApply);
        assert_eq!(state.marks.marks_of(ralph).len(), 1);

        let outcome =
            EffectResolver::resolve_pass(&mut state, "[Ralph: -guard]", None, &mut NullCollection);
        assert_eq!(outcome.results[0].kind, DirectiveKind::MarkDestroy);
        assert!(state.marks.marks_of(ralph).is_empty());
    }

    #[test]
    fn test_defeat_cancels_delayed_from_source() {
        let mut state = fresh();
        let slime = state.roster.resolve("Slime A").unwrap();

        // The slime schedules damage, then dies before the boundary.
        EffectResolver::resolve_pass(
            &mut state,
            "[Ralph: damaged 5 | delay 1]",
            Some(slime),
            &mut NullCollection,
        );
        EffectResolver::resolve_pass(&mut state, "[Slime A: damaged 99]", None, &mut NullCollection);
        assert!(state.delayed.is_empty());

        let outcome = EffectResolver::end_of_turn(&mut state, &mut NullCollection);
        assert!(outcome.results.is_empty());
        assert_eq!(state.roster.get(BattlerId(0)).unwrap().hp(), 30);
    }
}
