//! Global-effect forwarding tests.
//!
//! The engine validates directive shapes and forwards typed
//! operations to the card collection; the collection's refusals are
//! recorded without stopping the pass.

use warscript::cards::{CardCollection, CardFace, CardOp, DiscardRequest, Zone};
use warscript::core::{BattleState, BattlerTemplate, Faction};
use warscript::error::{CollaboratorRejection, EngineError};
use warscript::resolve::EffectResolver;

/// Records every forwarded operation; optionally refuses draws.
#[derive(Default)]
struct Recorder {
    calls: Vec<CardOp>,
    refuse_draws: bool,
}

impl CardCollection for Recorder {
    fn draw(&mut self, count: u32) -> Result<(), CollaboratorRejection> {
        if self.refuse_draws {
            return Err(CollaboratorRejection::new("deck is empty"));
        }
        self.calls.push(CardOp::Draw { count });
        Ok(())
    }

    fn discard(&mut self, request: &DiscardRequest) -> Result<(), CollaboratorRejection> {
        self.calls.push(CardOp::Discard {
            request: request.clone(),
        });
        Ok(())
    }

    fn duplicate(
        &mut self,
        card: &str,
        zone: Zone,
        count: u32,
    ) -> Result<(), CollaboratorRejection> {
        self.calls.push(CardOp::Duplicate {
            card: card.to_string(),
            zone,
            count,
        });
        Ok(())
    }

    fn create(
        &mut self,
        face: &CardFace,
        zone: Zone,
        count: u32,
    ) -> Result<(), CollaboratorRejection> {
        self.calls.push(CardOp::Create {
            face: face.clone(),
            zone,
            count,
        });
        Ok(())
    }

    fn transform(&mut self, card: &str, face: &CardFace) -> Result<(), CollaboratorRejection> {
        self.calls.push(CardOp::Transform {
            card: card.to_string(),
            face: face.clone(),
        });
        Ok(())
    }

    fn destroy(&mut self, cards: &[String]) -> Result<(), CollaboratorRejection> {
        self.calls.push(CardOp::Destroy {
            cards: cards.to_vec(),
        });
        Ok(())
    }

    fn destroy_rule(&mut self, rule: u32) -> Result<(), CollaboratorRejection> {
        self.calls.push(CardOp::DestroyRule { rule });
        Ok(())
    }
}

fn fresh() -> BattleState {
    let mut state = BattleState::new(42);
    state.spawn(&BattlerTemplate::new("Ralph", Faction::Ally, 30));
    state
}

#[test]
fn test_operations_forwarded_in_order() {
    let mut state = fresh();
    let mut recorder = Recorder::default();

    let outcome = EffectResolver::resolve_pass(
        &mut state,
        "[draw 2] [discard 1] [duplicate Fireball deck 3] \
         [create <Spark: deal 1 damage> graveyard] [transform Fireball to <Ember: fizzle>] \
         [destroy Ember, Spark] [destroy-rule 7]",
        None,
        &mut recorder,
    );

    assert!(outcome.errors.is_empty());
    assert_eq!(
        recorder.calls,
        vec![
            CardOp::Draw { count: 2 },
            CardOp::Discard {
                request: DiscardRequest::Count(1)
            },
            CardOp::Duplicate {
                card: "Fireball".to_string(),
                zone: Zone::Deck,
                count: 3
            },
            CardOp::Create {
                face: CardFace {
                    name: "Spark".to_string(),
                    description: "deal 1 damage".to_string()
                },
                zone: Zone::Graveyard,
                count: 1
            },
            CardOp::Transform {
                card: "Fireball".to_string(),
                face: CardFace {
                    name: "Ember".to_string(),
                    description: "fizzle".to_string()
                }
            },
            CardOp::Destroy {
                cards: vec!["Ember".to_string(), "Spark".to_string()]
            },
            CardOp::DestroyRule { rule: 7 },
        ]
    );
}

/// A refusal is recorded and the rest of the pass still runs,
/// entity directives included.
#[test]
fn test_rejection_is_not_fatal() {
    let mut state = fresh();
    let mut recorder = Recorder {
        refuse_draws: true,
        ..Recorder::default()
    };

    let outcome = EffectResolver::resolve_pass(
        &mut state,
        "[draw 5] [discard 1] [Ralph: damaged 3]",
        None,
        &mut recorder,
    );

    assert_eq!(
        outcome.errors,
        vec![EngineError::Collaborator {
            op: "draw".to_string(),
            reason: "deck is empty".to_string()
        }]
    );
    assert_eq!(
        recorder.calls,
        vec![CardOp::Discard {
            request: DiscardRequest::Count(1)
        }]
    );
    assert_eq!(outcome.results.len(), 1);
}

/// Malformed global spans drop alone.
#[test]
fn test_malformed_globals_counted() {
    let mut state = fresh();
    let mut recorder = Recorder::default();

    let outcome = EffectResolver::resolve_pass(
        &mut state,
        "[draw 0] [draw two] [destroy] [draw 1]",
        None,
        &mut recorder,
    );

    assert_eq!(outcome.malformed, 3);
    assert_eq!(recorder.calls, vec![CardOp::Draw { count: 1 }]);
}

/// A global op with a delay near `u32::MAX` never wraps onto the
/// next boundary.
#[test]
fn test_extreme_global_delay_stays_parked() {
    let mut state = fresh();
    let mut recorder = Recorder::default();
    EffectResolver::end_of_turn(&mut state, &mut recorder);

    EffectResolver::resolve_pass(
        &mut state,
        "[draw 1 | delay 4294967295]",
        None,
        &mut recorder,
    );
    EffectResolver::end_of_turn(&mut state, &mut recorder);

    assert!(recorder.calls.is_empty());
}

/// A delayed global op waits in the queue and forwards at the
/// boundary.
#[test]
fn test_delayed_global_op() {
    let mut state = fresh();
    let mut recorder = Recorder::default();

    EffectResolver::resolve_pass(&mut state, "[draw 2 | delay 1]", None, &mut recorder);
    assert!(recorder.calls.is_empty());

    EffectResolver::end_of_turn(&mut state, &mut recorder);
    assert_eq!(recorder.calls, vec![CardOp::Draw { count: 2 }]);
}
