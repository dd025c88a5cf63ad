//! Forwarding global directives to the card collection.
//!
//! Deck, hand, and graveyard bookkeeping belongs to the embedding
//! game. The engine validates the operation's shape at parse time and
//! hands the typed [`CardOp`] to a [`CardCollection`]; a refusal is
//! reported back as an error the resolver records without aborting
//! the pass.

use tracing::debug;

use crate::error::{CollaboratorRejection, EngineError};

use super::ops::{CardFace, CardOp, DiscardRequest, Zone};

/// The external card collection the engine forwards global
/// operations to.
///
/// Implementations may refuse any operation (empty hand, unknown
/// card reference, full zone); the engine treats a refusal as final.
pub trait CardCollection {
    /// Draw cards into the hand.
    fn draw(&mut self, count: u32) -> Result<(), CollaboratorRejection>;

    /// Discard from the hand.
    fn discard(&mut self, request: &DiscardRequest) -> Result<(), CollaboratorRejection>;

    /// Copy an existing card into a zone.
    fn duplicate(&mut self, card: &str, zone: Zone, count: u32)
        -> Result<(), CollaboratorRejection>;

    /// Create new cards from a literal.
    fn create(&mut self, face: &CardFace, zone: Zone, count: u32)
        -> Result<(), CollaboratorRejection>;

    /// Rewrite an existing card into a new face.
    fn transform(&mut self, card: &str, face: &CardFace) -> Result<(), CollaboratorRejection>;

    /// Remove cards from the battle entirely.
    fn destroy(&mut self, cards: &[String]) -> Result<(), CollaboratorRejection>;

    /// Retire a standing rule.
    fn destroy_rule(&mut self, rule: u32) -> Result<(), CollaboratorRejection>;
}

/// A collection that accepts everything and does nothing. Useful for
/// battles without a deck and for tests of entity directives.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullCollection;

impl CardCollection for NullCollection {
    fn draw(&mut self, _count: u32) -> Result<(), CollaboratorRejection> {
        Ok(())
    }

    fn discard(&mut self, _request: &DiscardRequest) -> Result<(), CollaboratorRejection> {
        Ok(())
    }

    fn duplicate(
        &mut self,
        _card: &str,
        _zone: Zone,
        _count: u32,
    ) -> Result<(), CollaboratorRejection> {
        Ok(())
    }

    fn create(
        &mut self,
        _face: &CardFace,
        _zone: Zone,
        _count: u32,
    ) -> Result<(), CollaboratorRejection> {
        Ok(())
    }

    fn transform(&mut self, _card: &str, _face: &CardFace) -> Result<(), CollaboratorRejection> {
        Ok(())
    }

    fn destroy(&mut self, _cards: &[String]) -> Result<(), CollaboratorRejection> {
        Ok(())
    }

    fn destroy_rule(&mut self, _rule: u32) -> Result<(), CollaboratorRejection> {
        Ok(())
    }
}

/// Dispatch one validated operation to the collection.
pub fn forward(op: &CardOp, cards: &mut dyn CardCollection) -> Result<(), EngineError> {
    debug!(%op, "forwarding card operation");

    let outcome = match op {
        CardOp::Draw { count } => cards.draw(*count),
        CardOp::Discard { request } => cards.discard(request),
        CardOp::Duplicate { card, zone, count } => cards.duplicate(card, *zone, *count),
        CardOp::Create { face, zone, count } => cards.create(face, *zone, *count),
        CardOp::Transform { card, face } => cards.transform(card, face),
        CardOp::Destroy { cards: refs } => cards.destroy(refs),
        CardOp::DestroyRule { rule } => cards.destroy_rule(*rule),
    };

    outcome.map_err(|rejection| EngineError::Collaborator {
        op: op.name().to_string(),
        reason: rejection.reason,
    })
}
