use crate::event::BattleEvent;
use crate::model::{normalize_id, ClassTemplate, Move};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Index of a combatant inside its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(pub usize);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "combatant #{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    AttackUp,
    AttackDown,
    SpeedUp,
    SpeedDown,
    Protection,
    Weakness,
    Burning,
}

impl StatusKind {
    /// Whether the magnitude is a multiplier (as opposed to a flat value).
    pub fn is_multiplier(self) -> bool {
        matches!(
            self,
            StatusKind::AttackUp
                | StatusKind::AttackDown
                | StatusKind::Protection
                | StatusKind::Weakness
        )
    }

    pub fn scales_incoming_damage(self) -> bool {
        matches!(self, StatusKind::Protection | StatusKind::Weakness)
    }

    pub fn scales_outgoing_damage(self) -> bool {
        matches!(self, StatusKind::AttackUp | StatusKind::AttackDown)
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatusKind::AttackUp => "+Attack",
            StatusKind::AttackDown => "-Attack",
            StatusKind::SpeedUp => "+Speed",
            StatusKind::SpeedDown => "-Speed",
            StatusKind::Protection => "Protection",
            StatusKind::Weakness => "Weakness",
            StatusKind::Burning => "Burning",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub magnitude: f64,
    pub remaining_turns: u32,
}

/// A move waiting for its charge-up to finish.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargedMove {
    #[serde(rename = "move")]
    pub mv: Move,
    pub user: CombatantId,
    pub targets: Vec<CombatantId>,
    pub remaining_turns: i32,
    pub blocks_selection: bool,
}

#[derive(Debug, Clone)]
pub struct Combatant {
    id: CombatantId,
    name: String,
    class_name: String,
    base_speed: i32,
    base_health: i32,
    health: i32,
    moves: Vec<Move>,
    status: Vec<StatusEffect>,
    charging: Vec<ChargedMove>,
}

impl Combatant {
    pub fn new(id: CombatantId, name: impl Into<String>, class: &ClassTemplate) -> Self {
        Self {
            id,
            name: name.into(),
            class_name: class.name.clone(),
            base_speed: class.speed,
            base_health: class.health,
            health: class.health,
            moves: class.moves.clone(),
            status: Vec::new(),
            charging: Vec::new(),
        }
    }

    pub fn id(&self) -> CombatantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn base_speed(&self) -> i32 {
        self.base_speed
    }

    pub fn base_health(&self) -> i32 {
        self.base_health
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn is_eliminated(&self) -> bool {
        self.health < 1
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn move_named(&self, name: &str) -> Option<&Move> {
        let id = normalize_id(name);
        self.moves.iter().find(|m| normalize_id(&m.name) == id)
    }

    pub fn status_effects(&self) -> &[StatusEffect] {
        &self.status
    }

    pub fn charged_moves(&self) -> &[ChargedMove] {
        &self.charging
    }

    /// Scales `raw` by every active Protection/Weakness entry, rounds half to
    /// even and subtracts the result. Returns the amount actually taken.
    pub fn apply_damage(&mut self, raw: f64) -> i32 {
        let mut damage = raw;
        for effect in &self.status {
            if effect.kind.scales_incoming_damage() {
                damage *= effect.magnitude;
            }
        }
        let applied = damage.round_ties_even() as i32;
        self.health -= applied;
        applied
    }

    /// Healing has no upper cap.
    pub fn apply_heal(&mut self, amount: i32) {
        self.health += amount;
    }

    pub fn true_speed(&self) -> f64 {
        let mut speed = f64::from(self.base_speed);
        for effect in &self.status {
            match effect.kind {
                StatusKind::SpeedUp => speed += effect.magnitude,
                StatusKind::SpeedDown => speed -= effect.magnitude,
                _ => {}
            }
        }
        speed
    }

    /// Product of every active +Attack/-Attack multiplier.
    pub fn attack_multiplier(&self) -> f64 {
        self.status
            .iter()
            .filter(|e| e.kind.scales_outgoing_damage())
            .map(|e| e.magnitude)
            .product()
    }

    pub fn add_status_effect(&mut self, kind: StatusKind, magnitude: f64, duration: u32) {
        self.status.push(StatusEffect {
            kind,
            magnitude,
            remaining_turns: duration,
        });
    }

    pub fn add_charged_move(
        &mut self,
        mv: Move,
        user: CombatantId,
        targets: Vec<CombatantId>,
        delay_turns: i32,
        blocks_selection: bool,
    ) {
        self.charging.push(ChargedMove {
            mv,
            user,
            targets,
            remaining_turns: delay_turns,
            blocks_selection,
        });
    }

    /// Start-of-turn bookkeeping: age the status ledger, age every charged
    /// move, then apply one burn tick per active Burning effect.
    pub fn advance_turn(&mut self) -> Vec<BattleEvent> {
        let before = self.status.len();
        self.status.retain_mut(|effect| {
            if effect.remaining_turns == 0 {
                false
            } else {
                effect.remaining_turns -= 1;
                true
            }
        });
        trace!(
            combatant = %self.name,
            expired = before - self.status.len(),
            active = self.status.len(),
            "aged status ledger"
        );

        for charge in &mut self.charging {
            charge.remaining_turns -= 1;
        }

        let burns: Vec<f64> = self
            .status
            .iter()
            .filter(|e| e.kind == StatusKind::Burning)
            .map(|e| e.magnitude)
            .collect();
        let mut events = Vec::with_capacity(burns.len());
        for magnitude in burns {
            let damage = self.apply_damage(magnitude);
            events.push(BattleEvent::Burned {
                combatant: self.name.clone(),
                damage,
            });
        }
        events
    }

    pub(crate) fn take_charged_moves(&mut self) -> Vec<ChargedMove> {
        std::mem::take(&mut self.charging)
    }

    pub(crate) fn requeue_charged_moves(&mut self, pending: Vec<ChargedMove>) {
        let added = std::mem::replace(&mut self.charging, pending);
        self.charging.extend(added);
    }

    /// One-line state summary used between turns.
    pub fn summary(&self) -> String {
        let status = if self.status.is_empty() {
            "No status effects".to_string()
        } else {
            let parts: Vec<String> = self
                .status
                .iter()
                .map(|e| {
                    let power = if e.kind.is_multiplier() {
                        format!("x{}", e.magnitude)
                    } else {
                        e.magnitude.to_string()
                    };
                    format!("{}: {} ({} turns)", e.kind, power, e.remaining_turns)
                })
                .collect();
            format!("Status FX- {}", parts.join(", "))
        };
        let charging = if self.charging.is_empty() {
            "No charged moves".to_string()
        } else {
            self.charging
                .iter()
                .map(|c| format!("{}: {} turns", c.mv.name, c.remaining_turns))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "{}: {} HP --- {} Speed --- {} --- {}",
            self.name,
            self.health,
            self.true_speed(),
            status,
            charging
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn warrior(name: &str) -> Combatant {
        let catalog = Catalog::standard();
        let class = catalog.class("Warrior").expect("warrior exists");
        Combatant::new(CombatantId(0), name, class)
    }

    #[test]
    fn new_combatant_copies_class_template() {
        let c = warrior("Dave");
        assert_eq!(c.health(), 100);
        assert_eq!(c.base_speed(), 50);
        assert_eq!(c.class_name(), "Warrior");
        assert_eq!(c.moves().len(), 4);
        assert!(c.move_named("sword SLASH").is_some());
        assert!(c.move_named("Fireball").is_none());
    }

    #[test]
    fn protection_and_weakness_multiply_in_ledger_order() {
        let mut c = warrior("Dave");
        c.add_status_effect(StatusKind::Protection, 0.5, 1);
        c.add_status_effect(StatusKind::Weakness, 1.3, 1);
        let applied = c.apply_damage(20.0);
        assert_eq!(applied, 13);
        assert_eq!(c.health(), 87);
    }

    #[test]
    fn damage_rounds_half_to_even() {
        let mut c = warrior("Dave");
        c.add_status_effect(StatusKind::Protection, 0.5, 0);
        assert_eq!(c.apply_damage(25.0), 12);
        assert_eq!(c.apply_damage(27.0), 14);
        assert_eq!(c.health(), 74);
    }

    #[test]
    fn attack_modifiers_do_not_touch_incoming_damage() {
        let mut c = warrior("Dave");
        c.add_status_effect(StatusKind::AttackUp, 1.5, 2);
        assert_eq!(c.apply_damage(20.0), 20);
        assert_eq!(c.attack_multiplier(), 1.5);
    }

    #[test]
    fn heal_has_no_cap() {
        let mut c = warrior("Dave");
        c.apply_heal(25);
        assert_eq!(c.health(), 125);
    }

    #[test]
    fn true_speed_sums_speed_modifiers() {
        let mut c = warrior("Dave");
        c.add_status_effect(StatusKind::SpeedUp, 30.0, 1);
        c.add_status_effect(StatusKind::SpeedDown, 15.0, 2);
        c.add_status_effect(StatusKind::SpeedDown, 20.0, 3);
        assert_eq!(c.true_speed(), 45.0);
    }

    #[test]
    fn duplicate_kinds_stack_as_separate_entries() {
        let mut c = warrior("Dave");
        c.add_status_effect(StatusKind::AttackUp, 1.5, 2);
        c.add_status_effect(StatusKind::AttackUp, 1.5, 2);
        assert_eq!(c.status_effects().len(), 2);
        assert_eq!(c.attack_multiplier(), 2.25);
    }

    #[test]
    fn effect_with_duration_d_survives_d_plus_one_turns() {
        let mut c = warrior("Dave");
        c.add_status_effect(StatusKind::SpeedDown, 15.0, 2);
        // Creation turn, then two more owner turns.
        assert_eq!(c.true_speed(), 35.0);
        for _ in 0..2 {
            c.advance_turn();
            assert_eq!(c.true_speed(), 35.0);
        }
        c.advance_turn();
        assert_eq!(c.true_speed(), 50.0);
        assert!(c.status_effects().is_empty());
    }

    #[test]
    fn zero_duration_effect_is_gone_after_the_next_turn() {
        let mut c = warrior("Dave");
        c.add_status_effect(StatusKind::Protection, 0.5, 0);
        assert_eq!(c.status_effects()[0].remaining_turns, 0);
        c.advance_turn();
        assert!(c.status_effects().is_empty());
    }

    #[test]
    fn burning_ticks_once_per_turn_after_aging() {
        let mut c = warrior("Dave");
        c.add_status_effect(StatusKind::Burning, 5.0, 3);
        let mut ticks = 0;
        for _ in 0..5 {
            ticks += c.advance_turn().len();
        }
        assert_eq!(ticks, 3);
        assert_eq!(c.health(), 85);
    }

    #[test]
    fn burn_tick_is_scaled_by_protection() {
        let mut c = warrior("Dave");
        c.add_status_effect(StatusKind::Burning, 5.0, 3);
        c.add_status_effect(StatusKind::Protection, 0.5, 3);
        let events = c.advance_turn();
        assert_eq!(
            events,
            vec![BattleEvent::Burned {
                combatant: "Dave".into(),
                damage: 2
            }]
        );
    }

    #[test]
    fn charged_moves_age_unconditionally() {
        let mut c = warrior("Dave");
        let mv = c.moves()[0].clone();
        c.add_charged_move(mv, CombatantId(0), vec![CombatantId(1)], 1, true);
        c.advance_turn();
        c.advance_turn();
        assert_eq!(c.charged_moves()[0].remaining_turns, -1);
    }

    #[test]
    fn summary_lists_health_speed_and_effects() {
        let mut c = warrior("Dave");
        c.add_status_effect(StatusKind::AttackUp, 1.5, 2);
        assert_eq!(
            c.summary(),
            "Dave: 100 HP --- 50 Speed --- Status FX- +Attack: x1.5 (2 turns) --- No charged moves"
        );
    }
}
