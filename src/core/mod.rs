//! Battler state: combatants, the roster, and the battle container.

mod battler;
mod entity;
mod rng;
mod roster;
mod state;
mod template;

pub use battler::{Battler, DamageOutcome};
pub use entity::BattlerId;
pub use rng::{BattleRng, BattleRngState};
pub use roster::Roster;
pub use state::BattleState;
pub use template::{BattlerTemplate, Faction, StatBlock};
