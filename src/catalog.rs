//! Built-in moves and classes.
//!
//! The static tables are compiled in; [`Catalog`] is the owned, immutable view
//! that gets handed to an [`crate::arena::Arena`] at construction.

use crate::model::{
    normalize_id, Accuracy, ChargeSpec, ClassTemplate, CritProfile, Effect, Move, MoveTag,
    TargetRule,
};
use phf::phf_ordered_map;

pub struct MoveDef {
    pub name: &'static str,
    pub tags: &'static [MoveTag],
    pub effects: &'static [Effect],
    pub accuracy: Accuracy,
    pub crit: Option<CritProfile>,
    pub target: TargetRule,
    pub charge: Option<ChargeSpec>,
    pub description: &'static str,
}

pub struct ClassDef {
    pub name: &'static str,
    pub moves: &'static [&'static str],
    pub speed: i32,
    pub health: i32,
}

impl From<&MoveDef> for Move {
    fn from(def: &MoveDef) -> Self {
        Move {
            name: def.name.to_string(),
            tags: def.tags.to_vec(),
            effects: def.effects.to_vec(),
            accuracy: def.accuracy,
            crit: def.crit,
            target: def.target,
            charge: def.charge,
            description: def.description.to_string(),
        }
    }
}

pub static MOVES: phf::OrderedMap<&'static str, MoveDef> = phf_ordered_map! {
    "sword slash" => MoveDef {
        name: "Sword slash",
        tags: &[MoveTag::Melee],
        effects: &[Effect::Damage { value: 20 }],
        accuracy: Accuracy::Percent(90),
        crit: Some(CritProfile { chance_percent: 20, multiplier: 1.5 }),
        target: TargetRule::Opponents(1),
        charge: None,
        description: "Deals moderate damage to 1 opponent",
    },
    "whirlwind slash" => MoveDef {
        name: "Whirlwind slash",
        tags: &[MoveTag::Melee],
        effects: &[Effect::Damage { value: 10 }],
        accuracy: Accuracy::Percent(75),
        crit: Some(CritProfile { chance_percent: 20, multiplier: 1.5 }),
        target: TargetRule::Opponents(2),
        charge: None,
        description: "Deals weak damage to 2 opponents",
    },
    "hamstring slash" => MoveDef {
        name: "Hamstring slash",
        tags: &[MoveTag::Melee],
        effects: &[
            Effect::Damage { value: 10 },
            Effect::SpeedMod { delta: -15, duration: 2 },
        ],
        accuracy: Accuracy::Percent(85),
        crit: Some(CritProfile { chance_percent: 10, multiplier: 1.5 }),
        target: TargetRule::Opponents(1),
        charge: None,
        description: "Deals weak damage to 1 opponent and moderately slows them down for the next \
            2 turns",
    },
    "fireball" => MoveDef {
        name: "Fireball",
        tags: &[MoveTag::Spell, MoveTag::Ranged, MoveTag::Fire],
        effects: &[
            Effect::Damage { value: 25 },
            Effect::Burning { value: 5, duration: 3 },
        ],
        accuracy: Accuracy::Percent(70),
        crit: None,
        target: TargetRule::Opponents(1),
        charge: None,
        description: "Deals heavy ranged damage and inflicts burning (5) for 3 turns but has a \
            high chance to miss",
    },
    "lightning bolt" => MoveDef {
        name: "Lightning bolt",
        tags: &[MoveTag::Spell, MoveTag::Ranged, MoveTag::Electric],
        effects: &[
            Effect::Damage { value: 40 },
            Effect::SpeedMod { delta: -20, duration: 3 },
        ],
        accuracy: Accuracy::Percent(95),
        crit: Some(CritProfile { chance_percent: 15, multiplier: 1.3 }),
        target: TargetRule::Opponents(1),
        charge: Some(ChargeSpec { delay_turns: 2, blocks_selection: true }),
        description: "Takes 2 turns to charge but deals 40 damage and gives the target -Speed (20) \
            for 3 turns",
    },
    "flying kick" => MoveDef {
        name: "Flying kick",
        tags: &[MoveTag::Melee],
        effects: &[Effect::Damage { value: 15 }],
        accuracy: Accuracy::Percent(99),
        crit: Some(CritProfile { chance_percent: 15, multiplier: 1.2 }),
        target: TargetRule::Opponents(1),
        charge: None,
        description: "Performs a single flighty kick against an opponent. Deals weak damage but \
            almost guaranteed to hit its target",
    },
    "pressure points" => MoveDef {
        name: "Pressure points",
        tags: &[MoveTag::Melee],
        effects: &[
            Effect::Damage { value: 15 },
            Effect::Weakness { value: 30, duration: 2 },
        ],
        accuracy: Accuracy::Percent(70),
        crit: None,
        target: TargetRule::Opponents(1),
        charge: None,
        description: "Presses on specific points on the opponent's body to make them take more \
            damage for 2 turns",
    },
    "rallying cry" => MoveDef {
        name: "Rallying cry",
        tags: &[MoveTag::Spell],
        effects: &[Effect::AttackMod { percentage: 50, duration: 2 }],
        accuracy: Accuracy::NeverMiss,
        crit: None,
        target: TargetRule::SelfOnly,
        charge: None,
        description: "Increases your own attack damage by 50% for the next 2 turns",
    },
    "healing chi" => MoveDef {
        name: "Healing chi",
        tags: &[MoveTag::Spell],
        effects: &[Effect::Heal { value: 5 }],
        accuracy: Accuracy::NeverMiss,
        crit: Some(CritProfile { chance_percent: 30, multiplier: 5.0 }),
        target: TargetRule::SelfOnly,
        charge: None,
        description: "Heals you for 5 HP. Has a 30% chance to heal you for 5x the normal amount",
    },
    "time warp" => MoveDef {
        name: "Time warp",
        tags: &[MoveTag::Spell],
        effects: &[Effect::SpeedMod { delta: 30, duration: 1 }],
        accuracy: Accuracy::NeverMiss,
        crit: Some(CritProfile { chance_percent: 50, multiplier: -0.5 }),
        target: TargetRule::SelfOnly,
        charge: None,
        description: "Slows down time for the mage, increasing their speed by 30. Small chance to \
            mess up and reduce their speed instead",
    },
    "mana shield" => MoveDef {
        name: "Mana shield",
        tags: &[MoveTag::Spell],
        effects: &[Effect::Protection { value: 50, duration: 0 }],
        accuracy: Accuracy::NeverMiss,
        crit: None,
        target: TargetRule::SelfOnly,
        charge: None,
        description: "Forms a protective shield to block 50% of all damage for 1 turn",
    },
    "literally nothing" => MoveDef {
        name: "Literally nothing",
        tags: &[MoveTag::Melee],
        effects: &[],
        accuracy: Accuracy::NeverMiss,
        crit: None,
        target: TargetRule::SelfOnly,
        charge: None,
        description: "Does nothing",
    },
};

pub static CLASSES: phf::OrderedMap<&'static str, ClassDef> = phf_ordered_map! {
    "warrior" => ClassDef {
        name: "Warrior",
        moves: &["sword slash", "whirlwind slash", "hamstring slash", "rallying cry"],
        speed: 50,
        health: 100,
    },
    "mage" => ClassDef {
        name: "Mage",
        moves: &["fireball", "lightning bolt", "mana shield", "time warp"],
        speed: 50,
        health: 80,
    },
    "monk" => ClassDef {
        name: "Monk",
        moves: &["flying kick", "pressure points", "healing chi"],
        speed: 60,
        health: 100,
    },
};

/// Immutable set of moves and classes a battle is built from.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    moves: Vec<Move>,
    classes: Vec<ClassTemplate>,
}

impl Catalog {
    /// The built-in Warrior/Mage/Monk catalog.
    pub fn standard() -> Self {
        let moves: Vec<Move> = MOVES.values().map(Move::from).collect();
        let classes = CLASSES
            .values()
            .map(|def| ClassTemplate {
                name: def.name.to_string(),
                moves: def
                    .moves
                    .iter()
                    .filter_map(|id| MOVES.get(*id))
                    .map(Move::from)
                    .collect(),
                speed: def.speed,
                health: def.health,
            })
            .collect();
        Catalog { moves, classes }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_move(mut self, mv: Move) -> Self {
        self.moves.push(mv);
        self
    }

    pub fn with_class(mut self, class: ClassTemplate) -> Self {
        self.classes.push(class);
        self
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn classes(&self) -> &[ClassTemplate] {
        &self.classes
    }

    pub fn move_def(&self, name: &str) -> Option<&Move> {
        let id = normalize_id(name);
        self.moves.iter().find(|m| normalize_id(&m.name) == id)
    }

    pub fn class(&self, name: &str) -> Option<&ClassTemplate> {
        let id = normalize_id(name);
        self.classes.iter().find(|c| normalize_id(&c.name) == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_class_move_exists_in_the_move_table() {
        for class in CLASSES.values() {
            for id in class.moves {
                assert!(MOVES.contains_key(*id), "{} lists unknown move {id}", class.name);
            }
        }
    }

    #[test]
    fn move_keys_match_display_names() {
        for (key, def) in MOVES.entries() {
            assert_eq!(*key, normalize_id(def.name));
        }
    }

    #[test]
    fn standard_classes_keep_declaration_order() {
        let catalog = Catalog::standard();
        let names: Vec<&str> = catalog.classes().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Warrior", "Mage", "Monk"]);
        let mage = catalog.class("mage").expect("mage exists");
        let moves: Vec<&str> = mage.moves.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            moves,
            ["Fireball", "Lightning bolt", "Mana shield", "Time warp"]
        );
        assert_eq!(mage.health, 80);
    }

    #[test]
    fn lookups_ignore_case() {
        let catalog = Catalog::standard();
        let bolt = catalog.move_def("LIGHTNING BOLT").expect("move exists");
        assert_eq!(
            bolt.charge,
            Some(ChargeSpec {
                delay_turns: 2,
                blocks_selection: true
            })
        );
        assert!(catalog.class("Monk").is_some());
        assert!(catalog.class("Necromancer").is_none());
    }

    #[test]
    fn sword_slash_deals_twenty_at_ninety_percent() {
        let catalog = Catalog::standard();
        let slash = catalog.move_def("Sword slash").expect("move exists");
        assert_eq!(slash.accuracy, Accuracy::Percent(90));
        assert_eq!(
            slash.crit,
            Some(CritProfile {
                chance_percent: 20,
                multiplier: 1.5
            })
        );
        assert_eq!(slash.effects, vec![Effect::Damage { value: 20 }]);
    }
}
