//! Card-collection operations.
//!
//! The engine never owns the deck. Global directives describe what
//! should happen to the collection (`draw 2`, `create <Spark: deal 1
//! damage> hand`), and the resolver forwards the typed operation to
//! whatever implements [`CardCollection`](super::CardCollection).

use serde::{Deserialize, Serialize};

/// A card zone, in the collection's vocabulary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// Shuffled into the draw pile.
    Deck,
    /// On top of the draw pile.
    DeckTop,
    /// Straight into the hand.
    #[default]
    Hand,
    /// Into the graveyard.
    Graveyard,
}

impl Zone {
    /// Parse a zone keyword.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "deck" => Some(Self::Deck),
            "deck_top" => Some(Self::DeckTop),
            "hand" => Some(Self::Hand),
            "graveyard" => Some(Self::Graveyard),
            _ => None,
        }
    }
}

/// A card literal: the name and rules text of a card to be created,
/// written `<name: description>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFace {
    /// Card name.
    pub name: String,
    /// Rules text; itself directive syntax when the card is played.
    pub description: String,
}

impl CardFace {
    /// Parse a card literal, angle brackets included.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let inner = raw.trim().strip_prefix('<')?.strip_suffix('>')?;
        let (name, description) = inner.split_once(':')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            description: description.trim().to_string(),
        })
    }
}

/// What to discard: a count (collection picks) or specific cards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscardRequest {
    /// Discard this many cards of the collection's choosing.
    Count(u32),
    /// Discard these cards, by name or reference.
    Cards(Vec<String>),
}

/// A validated operation on the external card collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardOp {
    /// Draw cards into the hand.
    Draw {
        /// How many.
        count: u32,
    },
    /// Discard from the hand.
    Discard {
        /// What to discard.
        request: DiscardRequest,
    },
    /// Copy an existing card.
    Duplicate {
        /// The card to copy, by name or reference.
        card: String,
        /// Where the copies go.
        zone: Zone,
        /// How many copies.
        count: u32,
    },
    /// Create a brand-new card from a literal.
    Create {
        /// The card to create.
        face: CardFace,
        /// Where it goes.
        zone: Zone,
        /// How many copies.
        count: u32,
    },
    /// Rewrite an existing card into a new face.
    Transform {
        /// The card to transform, by name or reference.
        card: String,
        /// What it becomes.
        face: CardFace,
    },
    /// Remove cards from the battle entirely.
    Destroy {
        /// The cards to destroy, by name or reference.
        cards: Vec<String>,
    },
    /// Retire a standing rule held by the collection.
    DestroyRule {
        /// The rule's id.
        rule: u32,
    },
}

impl CardOp {
    /// The operation's surface keyword, for logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Draw { .. } => "draw",
            Self::Discard { .. } => "discard",
            Self::Duplicate { .. } => "duplicate",
            Self::Create { .. } => "create",
            Self::Transform { .. } => "transform",
            Self::Destroy { .. } => "destroy",
            Self::DestroyRule { .. } => "destroy-rule",
        }
    }
}

impl std::fmt::Display for CardOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_keywords() {
        assert_eq!(Zone::parse("deck"), Some(Zone::Deck));
        assert_eq!(Zone::parse("deck_top"), Some(Zone::DeckTop));
        assert_eq!(Zone::parse("hand"), Some(Zone::Hand));
        assert_eq!(Zone::parse("graveyard"), Some(Zone::Graveyard));
        assert_eq!(Zone::parse("pocket"), None);
    }

    #[test]
    fn test_card_literal() {
        let face = CardFace::parse("<Spark: deal 1 damage to a slime>").unwrap();
        assert_eq!(face.name, "Spark");
        assert_eq!(face.description, "deal 1 damage to a slime");
    }

    #[test]
    fn test_card_literal_rejects_bad_shape() {
        assert!(CardFace::parse("Spark: deal 1 damage").is_none());
        assert!(CardFace::parse("<no description>").is_none());
        assert!(CardFace::parse("<: empty name>").is_none());
    }
}
