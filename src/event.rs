//! Outcome events emitted while a battle runs.

use crate::combatant::{Combatant, StatusKind};
use serde::Serialize;
use serde_json::json;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BattleEvent {
    RoundStarted {
        round: u32,
    },
    TurnStarted {
        combatant: String,
    },
    Hit {
        user: String,
        target: String,
        #[serde(rename = "move")]
        mv: String,
        damage: i32,
        critical: bool,
    },
    Healed {
        user: String,
        target: String,
        amount: i32,
        critical: bool,
    },
    /// Attack, speed and burning modifiers.
    StatusApplied {
        user: String,
        target: String,
        kind: StatusKind,
        magnitude: f64,
        critical: bool,
    },
    /// Protection and weakness: the target's incoming damage multiplier.
    DamageScaling {
        target: String,
        multiplier: f64,
        critical: bool,
    },
    Burned {
        combatant: String,
        damage: i32,
    },
    ChargeStarted {
        combatant: String,
        #[serde(rename = "move")]
        mv: String,
        turns: i32,
    },
    Charging {
        combatant: String,
        #[serde(rename = "move")]
        mv: String,
    },
    Missed {
        user: String,
        target: String,
        #[serde(rename = "move")]
        mv: String,
    },
    /// A charged move's stored target fell before the move fired.
    TargetGone {
        user: String,
        target: String,
        #[serde(rename = "move")]
        mv: String,
    },
    Idle,
    Down {
        combatant: String,
    },
    Victory {
        winner: String,
    },
    Stalemate {
        rounds: u32,
    },
    NoSurvivors,
}

impl fmt::Display for BattleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattleEvent::RoundStarted { round } => write!(f, "Round {round}"),
            BattleEvent::TurnStarted { combatant } => write!(f, "{combatant}'s turn"),
            BattleEvent::Hit {
                user,
                target,
                mv,
                damage,
                critical: true,
            } => write!(
                f,
                "*** {user} landed a critical hit on {target} with {mv}, \
                 causing {damage} damage! ***"
            ),
            BattleEvent::Hit {
                user,
                target,
                mv,
                damage,
                critical: false,
            } => write!(f, "{user} hit {target} with {mv}, causing {damage} damage!"),
            BattleEvent::Healed {
                user,
                target,
                amount,
                critical,
            } => with_crit_banner(
                f,
                *critical,
                format_args!("{user} healed {target} for {amount} HP"),
            ),
            BattleEvent::StatusApplied {
                user,
                target,
                kind: StatusKind::Burning,
                magnitude,
                critical,
            } => with_crit_banner(
                f,
                *critical,
                format_args!("{user} inflicted {target} with Burning ({magnitude})"),
            ),
            BattleEvent::StatusApplied {
                user,
                target,
                kind,
                magnitude,
                critical,
            } if kind.is_multiplier() => with_crit_banner(
                f,
                *critical,
                format_args!("{user} gave {target} {kind}(x{magnitude})"),
            ),
            BattleEvent::StatusApplied {
                user,
                target,
                kind,
                magnitude,
                critical,
            } => with_crit_banner(
                f,
                *critical,
                format_args!("{user} gave {target} {kind}({magnitude})"),
            ),
            BattleEvent::DamageScaling {
                target,
                multiplier,
                critical,
            } => with_crit_banner(
                f,
                *critical,
                format_args!("{target} will now take {multiplier}x damage!"),
            ),
            BattleEvent::Burned { combatant, damage } => {
                write!(f, "{combatant} was burned for {damage} damage")
            }
            BattleEvent::ChargeStarted {
                combatant,
                mv,
                turns,
            } => write!(f, "{combatant} starts charging a {mv} ({turns} turns)"),
            BattleEvent::Charging { combatant, mv } => {
                write!(f, "{combatant} is charging a {mv}")
            }
            BattleEvent::Missed { user, target, mv } => {
                write!(f, "{user} missed {target} with {mv}")
            }
            BattleEvent::TargetGone { user, target, mv } => {
                write!(f, "{user}'s {mv} finds no trace of {target}")
            }
            BattleEvent::Idle => f.write_str("He's just standing there... MENACINGLY"),
            BattleEvent::Down { combatant } => write!(f, "{combatant} is down!"),
            BattleEvent::Victory { winner } => write!(f, "{winner} wins!"),
            BattleEvent::Stalemate { rounds } => {
                write!(f, "No winner after {rounds} rounds")
            }
            BattleEvent::NoSurvivors => f.write_str("Nobody is left standing"),
        }
    }
}

fn with_crit_banner(
    f: &mut fmt::Formatter<'_>,
    critical: bool,
    body: fmt::Arguments<'_>,
) -> fmt::Result {
    if critical {
        write!(f, "*** {body} ***")
    } else {
        write!(f, "{body}")
    }
}

/// Append-only record of every event in a battle.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<BattleEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(|e| e.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "events": self.events,
            "log": self.lines(),
        })
    }
}

/// Receives each event the moment the engine emits it.
pub trait EventSink {
    fn emit(&mut self, event: &BattleEvent);

    /// Called once per turn, after the actor's timers have aged, with every
    /// combatant still in the battle.
    fn observe_field(&mut self, _actor: &Combatant, _field: &[&Combatant]) {}
}

impl EventSink for () {
    fn emit(&mut self, _event: &BattleEvent) {}
}

impl EventSink for Vec<BattleEvent> {
    fn emit(&mut self, event: &BattleEvent) {
        self.push(event.clone());
    }
}
