use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveTag {
    Melee,
    Ranged,
    Spell,
    Fire,
    Electric,
}

impl fmt::Display for MoveTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MoveTag::Melee => "Melee",
            MoveTag::Ranged => "Ranged",
            MoveTag::Spell => "Spell",
            MoveTag::Fire => "Fire",
            MoveTag::Electric => "Electric",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accuracy {
    /// Base hit chance in percent, before speed adjustments.
    Percent(u8),
    NeverMiss,
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accuracy::Percent(value) => write!(f, "{value}%"),
            Accuracy::NeverMiss => f.write_str("Cannot miss"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CritProfile {
    pub chance_percent: u32,
    /// Scales every effect on a critical hit. Negative values backfire.
    pub multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRule {
    /// Exactly `n` distinct living opponents chosen by the player.
    Opponents(usize),
    SelfOnly,
    AllOthers,
    All,
}

impl fmt::Display for TargetRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetRule::Opponents(n) => write!(f, "{n}"),
            TargetRule::SelfOnly => f.write_str("Self"),
            TargetRule::AllOthers => f.write_str("All others"),
            TargetRule::All => f.write_str("All"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeSpec {
    pub delay_turns: i32,
    pub blocks_selection: bool,
}

/// One entry of a move's payload. Effects resolve in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    Damage { value: i32 },
    Heal { value: i32 },
    /// Signed percentage: `50` is +50% outgoing damage, `-30` is -30%.
    AttackMod { percentage: i32, duration: u32 },
    /// Signed speed delta.
    SpeedMod { delta: i32, duration: u32 },
    Protection { value: i32, duration: u32 },
    Weakness { value: i32, duration: u32 },
    Burning { value: i32, duration: u32 },
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Damage { value } => write!(f, "Damage: {value}"),
            Effect::Heal { value } => write!(f, "Heal: {value}"),
            Effect::AttackMod {
                percentage,
                duration,
            } => {
                let sign = if *percentage < 0 { '-' } else { '+' };
                write!(f, "{sign}Attack: {}% ({duration} turns)", percentage.abs())
            }
            Effect::SpeedMod { delta, duration } => {
                let sign = if *delta < 0 { '-' } else { '+' };
                write!(f, "{sign}Speed: {} ({duration} turns)", delta.abs())
            }
            Effect::Protection { value, duration } => {
                write!(f, "Protection: {value} ({duration} turns)")
            }
            Effect::Weakness { value, duration } => {
                write!(f, "Weakness: {value} ({duration} turns)")
            }
            Effect::Burning { value, duration } => {
                write!(f, "Burning: {value} ({duration} turns)")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<MoveTag>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    pub accuracy: Accuracy,
    #[serde(default)]
    pub crit: Option<CritProfile>,
    pub target: TargetRule,
    #[serde(default)]
    pub charge: Option<ChargeSpec>,
    #[serde(default)]
    pub description: String,
}

impl Move {
    pub fn has_tag(&self, tag: MoveTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn is_self_targeted(&self) -> bool {
        matches!(self.target, TargetRule::SelfOnly)
    }

    /// Multi-line move info shown when a player asks for `INFO <move>`.
    pub fn summary(&self) -> String {
        let tags = self
            .tags
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let effects = if self.effects.is_empty() {
            "None".to_string()
        } else {
            self.effects
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let crit = match self.crit {
            Some(profile) => format!(
                "Chance = {}%, Effect = x{}",
                profile.chance_percent, profile.multiplier
            ),
            None => "None".to_string(),
        };
        let mut out = format!(
            "-- {} info --\nType: {}\nEffect: {}\nAccuracy: {}\nCritical hit: {}\nTargets: {}",
            self.name, tags, effects, self.accuracy, crit, self.target
        );
        if let Some(charge) = self.charge {
            out.push_str(&format!("\nCharge: {} turns", charge.delay_turns));
        }
        out
    }
}

/// Stats and move set shared by every combatant of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassTemplate {
    pub name: String,
    pub moves: Vec<Move>,
    pub speed: i32,
    pub health: i32,
}

pub(crate) fn normalize_id(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fireball() -> Move {
        Move {
            name: "Fireball".to_string(),
            tags: vec![MoveTag::Spell, MoveTag::Ranged, MoveTag::Fire],
            effects: vec![
                Effect::Damage { value: 25 },
                Effect::Burning {
                    value: 5,
                    duration: 3,
                },
            ],
            accuracy: Accuracy::Percent(70),
            crit: None,
            target: TargetRule::Opponents(1),
            charge: None,
            description: String::new(),
        }
    }

    #[test]
    fn summary_lists_effects_and_accuracy() {
        let text = fireball().summary();
        assert!(text.contains("Type: Spell, Ranged, Fire"));
        assert!(text.contains("Effect: Damage: 25, Burning: 5 (3 turns)"));
        assert!(text.contains("Accuracy: 70%"));
        assert!(text.contains("Critical hit: None"));
        assert!(text.contains("Targets: 1"));
    }

    #[test]
    fn never_miss_reads_as_cannot_miss() {
        assert_eq!(Accuracy::NeverMiss.to_string(), "Cannot miss");
    }

    #[test]
    fn move_deserializes_from_tagged_json() {
        let raw = r#"{
            "name": "Ember",
            "tags": ["ranged", "fire"],
            "effects": [{"kind": "burning", "value": 2, "duration": 1}],
            "accuracy": {"percent": 80},
            "target": {"opponents": 1}
        }"#;
        let mv: Move = serde_json::from_str(raw).expect("valid move json");
        assert!(mv.has_tag(MoveTag::Ranged));
        assert_eq!(mv.accuracy, Accuracy::Percent(80));
        assert_eq!(mv.target, TargetRule::Opponents(1));
        assert!(mv.crit.is_none());
    }
}
