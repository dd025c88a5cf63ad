//! Battler state and commit rules.
//!
//! A `Battler` owns the canonical numeric state for one combatant.
//! The commit methods here are the last step of the resolution
//! pipeline: they enforce the floors and caps (`0 <= hp <= mhp`,
//! `shield >= 0`) and report the actually-applied amount, which may
//! differ from the requested amount and feeds drain and the emitted
//! [`ApplicationResult`](crate::resolve::ApplicationResult).

use serde::{Deserialize, Serialize};

use super::entity::BattlerId;
use super::template::{BattlerTemplate, Faction, StatBlock};

/// Outcome of a damage commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageOutcome {
    /// Damage soaked by shield.
    pub absorbed: i64,
    /// Damage that reached hit points.
    pub hp_lost: i64,
}

impl DamageOutcome {
    /// Total damage that had an effect (shield + hp).
    #[must_use]
    pub const fn applied(self) -> i64 {
        self.absorbed + self.hp_lost
    }
}

/// Canonical numeric state for one combatant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battler {
    /// Roster-allocated id.
    pub id: BattlerId,
    /// Display name, fuzzy-matched by directive targeting.
    pub name: String,
    /// Side of the battle.
    pub faction: Faction,
    /// Current hit points, `0..=mhp`.
    hp: i64,
    /// Maximum hit points.
    pub mhp: i64,
    /// Current mind points, `0..=mmp`.
    mp: i64,
    /// Maximum mind points.
    pub mmp: i64,
    /// Secondary stats.
    pub stats: StatBlock,
    /// Shield points, always `>= 0`. Absorbs non-pierce damage.
    shield: i64,
    /// Set once hp reaches 0; never unset.
    defeated: bool,
}

impl Battler {
    /// Instantiate a battler from a template at full hp/mp.
    #[must_use]
    pub fn from_template(id: BattlerId, template: &BattlerTemplate) -> Self {
        let hp = template.hp.max(0);
        let mp = template.mp.max(0);
        Self {
            id,
            name: template.name.clone(),
            faction: template.faction,
            hp,
            mhp: hp,
            mp,
            mmp: mp,
            stats: template.stats,
            shield: 0,
            defeated: hp == 0,
        }
    }

    /// Current hit points.
    #[must_use]
    pub const fn hp(&self) -> i64 {
        self.hp
    }

    /// Current mind points.
    #[must_use]
    pub const fn mp(&self) -> i64 {
        self.mp
    }

    /// Current shield points.
    #[must_use]
    pub const fn shield(&self) -> i64 {
        self.shield
    }

    /// Has this battler been defeated?
    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.defeated
    }

    /// Name up to the first comma, used for loose matching and for
    /// `ME` substitution in mark templates.
    #[must_use]
    pub fn name_stem(&self) -> &str {
        match self.name.split_once(',') {
            Some((stem, _)) => stem.trim_end(),
            None => &self.name,
        }
    }

    /// Commit damage. Without pierce, shield absorbs first and only
    /// the excess reaches hp; with pierce, hp is reduced directly.
    /// Hp is floored at 0, which transitions the battler to defeated.
    ///
    /// Negative amounts are treated as 0.
    pub fn receive_damage(&mut self, amount: i64, pierce: bool) -> DamageOutcome {
        let amount = amount.max(0);

        let absorbed = if pierce { 0 } else { amount.min(self.shield) };
        self.shield -= absorbed;

        let hp_lost = (amount - absorbed).min(self.hp);
        self.hp -= hp_lost;

        if self.hp == 0 {
            self.defeated = true;
        }

        DamageOutcome { absorbed, hp_lost }
    }

    /// Commit healing, capped at mhp. Returns the applied amount.
    ///
    /// Negative amounts are treated as 0.
    pub fn receive_heal(&mut self, amount: i64) -> i64 {
        let applied = amount.max(0).min(self.mhp - self.hp);
        self.hp += applied;
        applied
    }

    /// Commit a signed shield change, floored at 0. Returns the
    /// actual delta applied (negative when shield was removed).
    pub fn shield_delta(&mut self, delta: i64) -> i64 {
        let before = self.shield;
        self.shield = (self.shield + delta).max(0);
        self.shield - before
    }

    /// Spend mind points, floored at 0. Returns the amount spent.
    pub fn spend_mp(&mut self, amount: i64) -> i64 {
        let spent = amount.max(0).min(self.mp);
        self.mp -= spent;
        spent
    }

    /// Restore mind points, capped at mmp. Returns the amount gained.
    pub fn restore_mp(&mut self, amount: i64) -> i64 {
        let gained = amount.max(0).min(self.mmp - self.mp);
        self.mp += gained;
        gained
    }
}
