//! The per-battler mark arena.
//!
//! Marks live here, grouped by owner in application order. That order
//! is observable: when several marks on one battler match the same
//! directive, the first-applied mark wins and later ones only see
//! whatever its rewrite produces.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::BattlerId;
use crate::parse::RewrittenDirective;

use super::mark::{Mark, MarkId, MarkSpec};

/// A mark lifecycle event, surfaced for display layers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkNotice {
    /// A mark was attached.
    Applied {
        /// Owner of the mark.
        owner: BattlerId,
        /// Mark name.
        name: String,
    },
    /// A mark rewrote a directive.
    Triggered {
        /// Owner of the mark.
        owner: BattlerId,
        /// Mark name.
        name: String,
    },
    /// A mark ran out of duration or was destroyed.
    Expired {
        /// Owner of the mark.
        owner: BattlerId,
        /// Mark name.
        name: String,
    },
}

/// A successful rewrite, with the mark that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkRewrite {
    /// Name of the mark that fired.
    pub mark: String,
    /// The superseding directive.
    pub directive: RewrittenDirective,
}

/// All marks in one battle, grouped by owner.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MarkRegistry {
    by_owner: FxHashMap<BattlerId, Vec<Mark>>,
    next_id: u32,
}

impl MarkRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a mark to a battler, after any marks it already has.
    pub fn apply(&mut self, owner: BattlerId, spec: MarkSpec) -> MarkNotice {
        let id = MarkId::new(self.next_id);
        self.next_id += 1;
        let name = spec.name.clone();
        self.by_owner
            .entry(owner)
            .or_default()
            .push(Mark::new(id, owner, spec));
        MarkNotice::Applied { owner, name }
    }

    /// Marks currently on a battler, in application order.
    #[must_use]
    pub fn marks_of(&self, owner: BattlerId) -> &[Mark] {
        self.by_owner.get(&owner).map_or(&[], Vec::as_slice)
    }

    /// Destroy every mark on a battler with the given name
    /// (case-insensitive). Returns one expired notice per removal.
    pub fn remove_named(&mut self, owner: BattlerId, name: &str) -> Vec<MarkNotice> {
        let Some(marks) = self.by_owner.get_mut(&owner) else {
            return Vec::new();
        };
        let mut notices = Vec::new();
        marks.retain(|mark| {
            if mark.name().eq_ignore_ascii_case(name) {
                notices.push(MarkNotice::Expired {
                    owner,
                    name: mark.name().to_string(),
                });
                false
            } else {
                true
            }
        });
        notices
    }

    /// Drop every mark a battler owns (defeat cleanup).
    pub fn remove_owner(&mut self, owner: BattlerId) -> Vec<MarkNotice> {
        self.by_owner
            .remove(&owner)
            .unwrap_or_default()
            .into_iter()
            .map(|mark| MarkNotice::Expired {
                owner,
                name: mark.name().to_string(),
            })
            .collect()
    }

    /// Find the first mark that would rewrite the directive, without
    /// consuming anything.
    ///
    /// A candidate whose rewrite reproduces the incoming directive
    /// exactly (same verb and magnitude, target staying on the owner)
    /// has reached a fixpoint: it is skipped as a non-match and later
    /// marks still get their chance.
    #[must_use]
    pub fn find_rewrite(
        &self,
        owner: BattlerId,
        owner_name: &str,
        owner_stem: &str,
        verb: &str,
        magnitude: i64,
    ) -> Option<(usize, MarkRewrite)> {
        let marks = self.by_owner.get(&owner)?;

        for (index, mark) in marks.iter().enumerate() {
            let Some(captures) = mark.match_directive(owner_name, owner_stem, verb, magnitude)
            else {
                continue;
            };

            let directive = match mark.spec.replacement.evaluate(&captures) {
                Ok(directive) => directive,
                Err(err) => {
                    debug!(mark = mark.name(), %err, "mark replacement failed to evaluate");
                    continue;
                }
            };

            let stays_on_owner = match &directive.target {
                None => true,
                Some(name) => {
                    name.eq_ignore_ascii_case(owner_name) || name.eq_ignore_ascii_case(owner_stem)
                }
            };
            if stays_on_owner && directive.verb == verb && directive.magnitude == magnitude {
                continue;
            }

            return Some((
                index,
                MarkRewrite {
                    mark: mark.name().to_string(),
                    directive,
                },
            ));
        }

        None
    }

    /// Apply the first matching rewrite, consuming a use on uses-kind
    /// marks.
    pub fn rewrite_once(
        &mut self,
        owner: BattlerId,
        owner_name: &str,
        owner_stem: &str,
        verb: &str,
        magnitude: i64,
    ) -> Option<MarkRewrite> {
        let (index, rewrite) = self.find_rewrite(owner, owner_name, owner_stem, verb, magnitude)?;
        if let Some(marks) = self.by_owner.get_mut(&owner) {
            if let Some(mark) = marks.get_mut(index) {
                mark.consume_use();
            }
        }
        Some(rewrite)
    }

    /// Count down turns-kind marks at an end-of-turn boundary and
    /// drop those that expire.
    pub fn tick_turns(&mut self) -> Vec<MarkNotice> {
        let mut notices = Vec::new();
        for (&owner, marks) in &mut self.by_owner {
            for mark in marks.iter_mut() {
                mark.tick_turn();
            }
            marks.retain(|mark| {
                if mark.is_expired() {
                    notices.push(MarkNotice::Expired {
                        owner,
                        name: mark.name().to_string(),
                    });
                    false
                } else {
                    true
                }
            });
        }
        notices
    }

    /// Drop marks whose uses ran out during a pass.
    pub fn sweep_expired(&mut self) -> Vec<MarkNotice> {
        let mut notices = Vec::new();
        for (&owner, marks) in &mut self.by_owner {
            marks.retain(|mark| {
                if mark.is_expired() {
                    notices.push(MarkNotice::Expired {
                        owner,
                        name: mark.name().to_string(),
                    });
                    false
                } else {
                    true
                }
            });
        }
        notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_mark_clause;

    fn spec(clause: &str) -> MarkSpec {
        parse_mark_clause(clause).unwrap()
    }

    #[test]
    fn test_insertion_order_wins() {
        let mut registry = MarkRegistry::new();
        let owner = BattlerId(0);
        registry.apply(
            owner,
            spec("+halve [3 turns] [ME: damaged {:d}] -> [ME: damaged {m[0] / 2}]"),
        );
        registry.apply(
            owner,
            spec("+nullify [3 turns] [ME: damaged {:d}] -> [ME: damaged 0]"),
        );

        let rewrite = registry
            .rewrite_once(owner, "Ralph", "Ralph", "damaged", 8)
            .unwrap();
        assert_eq!(rewrite.mark, "halve");
        assert_eq!(rewrite.directive.magnitude, 4);
    }

    #[test]
    fn test_fixpoint_is_not_a_match() {
        let mut registry = MarkRegistry::new();
        let owner = BattlerId(0);
        registry.apply(
            owner,
            spec("+echo [2 times] [ME: damaged {:d}] -> [ME: damaged {m[0]}]"),
        );

        assert!(registry
            .rewrite_once(owner, "Ralph", "Ralph", "damaged", 5)
            .is_none());
        // No use consumed.
        assert_eq!(registry.marks_of(owner)[0].remaining, 2);
    }

    #[test]
    fn test_uses_consumed_and_swept() {
        let mut registry = MarkRegistry::new();
        let owner = BattlerId(0);
        registry.apply(
            owner,
            spec("+guard [1 times] [ME: damaged {:d}] -> [ME: damaged 0]"),
        );

        assert!(registry
            .rewrite_once(owner, "Ralph", "Ralph", "damaged", 5)
            .is_some());
        assert!(registry
            .rewrite_once(owner, "Ralph", "Ralph", "damaged", 5)
            .is_none());

        let notices = registry.sweep_expired();
        assert_eq!(notices.len(), 1);
        assert!(registry.marks_of(owner).is_empty());
    }

    #[test]
    fn test_tick_turns_expires() {
        let mut registry = MarkRegistry::new();
        let owner = BattlerId(0);
        registry.apply(
            owner,
            spec("+haze [2 turns] [ME: damaged {:d}] -> [ME: damaged 0]"),
        );

        assert!(registry.tick_turns().is_empty());
        let notices = registry.tick_turns();
        assert_eq!(
            notices,
            vec![MarkNotice::Expired {
                owner,
                name: "haze".to_string()
            }]
        );
    }

    #[test]
    fn test_remove_named_case_insensitive() {
        let mut registry = MarkRegistry::new();
        let owner = BattlerId(0);
        registry.apply(
            owner,
            spec("+Thick Hide [3 turns] [ME: damaged {:d}] -> [ME: damaged {m[0] / 2}]"),
        );

        let notices = registry.remove_named(owner, "thick hide");
        assert_eq!(notices.len(), 1);
        assert!(registry.marks_of(owner).is_empty());
    }

    #[test]
    fn test_remove_owner() {
        let mut registry = MarkRegistry::new();
        let owner = BattlerId(0);
        registry.apply(
            owner,
            spec("+a [3 turns] [ME: damaged {:d}] -> [ME: damaged 0]"),
        );
        registry.apply(
            owner,
            spec("+b [3 turns] [ME: healed {:d}] -> [ME: healed 0]"),
        );

        assert_eq!(registry.remove_owner(owner).len(), 2);
        assert!(registry.marks_of(owner).is_empty());
    }
}
