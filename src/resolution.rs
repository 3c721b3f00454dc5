//! Hit, crit and effect resolution for a single (move, user, target) triple.

use crate::combatant::{Combatant, StatusKind};
use crate::error::{ArenaError, Result};
use crate::event::BattleEvent;
use crate::model::{Accuracy, Effect, Move, MoveTag};
use rand::Rng;
use tracing::debug;

/// Source of uniform 1..=100 draws for hit and crit rolls.
pub trait PercentRoll {
    fn roll_percent(&mut self) -> i32;
}

impl<R: Rng> PercentRoll for R {
    fn roll_percent(&mut self) -> i32 {
        self.gen_range(1..=100)
    }
}

/// What happened when a move was resolved against one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strike {
    pub landed: bool,
    pub critical: bool,
    pub eliminated: bool,
}

/// Hit chance after speed adjustments, or `None` for moves that never miss.
///
/// Clamped to at most 99; there is no lower clamp.
pub fn true_accuracy(mv: &Move, user: &Combatant, target: &Combatant) -> Option<i32> {
    let Accuracy::Percent(base) = mv.accuracy else {
        return None;
    };
    let base = f64::from(base);
    let chance = if user.id() == target.id() {
        base
    } else if mv.has_tag(MoveTag::Ranged) {
        base - target.true_speed() / 6.0
    } else {
        base - target.true_speed() / 3.0 + user.true_speed() / 3.0
    };
    Some((chance.round_ties_even() as i32).min(99))
}

/// Crit chance in percent, or `None` when the move cannot crit.
pub fn crit_chance(mv: &Move, user: &Combatant) -> Option<i32> {
    let profile = mv.crit?;
    let mut chance = f64::from(profile.chance_percent);
    if !mv.has_tag(MoveTag::Ranged) && !mv.is_self_targeted() {
        chance += user.true_speed() / 10.0;
    }
    Some(chance.round_ties_even() as i32)
}

pub fn roll_hit(
    mv: &Move,
    user: &Combatant,
    target: &Combatant,
    rng: &mut impl PercentRoll,
) -> bool {
    let Some(accuracy) = true_accuracy(mv, user, target) else {
        return true;
    };
    let draw = rng.roll_percent();
    let hit = draw < accuracy;
    debug!(mv = %mv.name, draw, accuracy, hit, "hit roll");
    hit
}

pub fn roll_crit(
    mv: &Move,
    user: &Combatant,
    _target: &Combatant,
    rng: &mut impl PercentRoll,
) -> bool {
    let Some(chance) = crit_chance(mv, user) else {
        return false;
    };
    let draw = rng.roll_percent();
    let crit = draw <= chance;
    debug!(mv = %mv.name, draw, chance, crit, "crit roll");
    crit
}

/// Applies every declared effect of `mv` to `target`, in catalog order.
pub fn apply_effects_once(
    mv: &Move,
    user: &Combatant,
    target: &mut Combatant,
    is_crit: bool,
) -> Vec<BattleEvent> {
    if mv.effects.is_empty() {
        return vec![BattleEvent::Idle];
    }

    let crit_multiplier = match (is_crit, mv.crit) {
        (true, Some(profile)) => Some(profile.multiplier),
        _ => None,
    };
    let critical = crit_multiplier.is_some();
    let user_name = user.name().to_string();
    let target_label = if user.id() == target.id() {
        "themself".to_string()
    } else {
        target.name().to_string()
    };

    let mut events = Vec::with_capacity(mv.effects.len());
    for effect in &mv.effects {
        match *effect {
            Effect::Damage { value } => {
                let mut raw = f64::from(value) * user.attack_multiplier();
                if let Some(m) = crit_multiplier {
                    raw = (raw * m).round_ties_even();
                }
                let damage = target.apply_damage(raw);
                events.push(BattleEvent::Hit {
                    user: user_name.clone(),
                    target: target_label.clone(),
                    mv: mv.name.clone(),
                    damage,
                    critical,
                });
            }
            Effect::Heal { value } => {
                let amount = match crit_multiplier {
                    Some(m) => (f64::from(value) * m).round_ties_even() as i32,
                    None => value,
                };
                target.apply_heal(amount);
                events.push(BattleEvent::Healed {
                    user: user_name.clone(),
                    target: target_label.clone(),
                    amount,
                    critical,
                });
            }
            Effect::AttackMod {
                percentage,
                duration,
            } => {
                let mut multiplier = 1.0 + f64::from(percentage) / 100.0;
                if let Some(m) = crit_multiplier {
                    multiplier *= m;
                }
                let kind = if multiplier - 1.0 < 0.0 {
                    StatusKind::AttackDown
                } else {
                    StatusKind::AttackUp
                };
                target.add_status_effect(kind, multiplier, duration);
                events.push(BattleEvent::StatusApplied {
                    user: user_name.clone(),
                    target: target_label.clone(),
                    kind,
                    magnitude: multiplier,
                    critical,
                });
            }
            Effect::SpeedMod { delta, duration } => {
                let mut change = f64::from(delta);
                if let Some(m) = crit_multiplier {
                    change = (change * m).round_ties_even();
                }
                let kind = if change < 0.0 {
                    StatusKind::SpeedDown
                } else {
                    StatusKind::SpeedUp
                };
                let magnitude = change.abs();
                target.add_status_effect(kind, magnitude, duration);
                events.push(BattleEvent::StatusApplied {
                    user: user_name.clone(),
                    target: target_label.clone(),
                    kind,
                    magnitude,
                    critical,
                });
            }
            Effect::Protection { value, duration } | Effect::Weakness { value, duration } => {
                let (kind, mut multiplier) = match effect {
                    Effect::Weakness { .. } => {
                        (StatusKind::Weakness, f64::from(value + 100) / 100.0)
                    }
                    _ => (StatusKind::Protection, f64::from(value) / 100.0),
                };
                if let Some(m) = crit_multiplier {
                    multiplier *= m;
                }
                target.add_status_effect(kind, multiplier, duration);
                events.push(BattleEvent::DamageScaling {
                    target: target.name().to_string(),
                    multiplier,
                    critical,
                });
            }
            Effect::Burning { value, duration } => {
                let mut magnitude = f64::from(value);
                if let Some(m) = crit_multiplier {
                    magnitude *= m;
                }
                target.add_status_effect(StatusKind::Burning, magnitude, duration);
                events.push(BattleEvent::StatusApplied {
                    user: user_name.clone(),
                    target: target_label.clone(),
                    kind: StatusKind::Burning,
                    magnitude,
                    critical,
                });
            }
        }
    }
    events
}

/// Rolls to hit, then to crit, then applies the move's effects.
///
/// A target already at or below zero health is rejected; the caller owns the
/// living set and must drop eliminated combatants before resolving.
pub fn resolve_move_on_target(
    mv: &Move,
    user: &Combatant,
    target: &mut Combatant,
    rng: &mut impl PercentRoll,
    events: &mut Vec<BattleEvent>,
) -> Result<Strike> {
    if target.is_eliminated() {
        return Err(ArenaError::EliminatedTarget(target.name().to_string()));
    }
    if !roll_hit(mv, user, target, rng) {
        events.push(BattleEvent::Missed {
            user: user.name().to_string(),
            target: target.name().to_string(),
            mv: mv.name.clone(),
        });
        return Ok(Strike {
            landed: false,
            critical: false,
            eliminated: false,
        });
    }

    let critical = roll_crit(mv, user, target, rng);
    events.extend(apply_effects_once(mv, user, target, critical));

    let eliminated = target.is_eliminated();
    if eliminated {
        events.push(BattleEvent::Down {
            combatant: target.name().to_string(),
        });
    }
    Ok(Strike {
        landed: true,
        critical,
        eliminated,
    })
}
