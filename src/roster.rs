use crate::catalog::Catalog;
use crate::error::{ArenaError, Result};
use crate::model::normalize_id;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    pub class: String,
}

/// Ordered list of combatants entering a battle. Turn order follows entry order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub combatants: Vec<RosterEntry>,
    #[serde(flatten, default)]
    pub extras: HashMap<String, serde_json::Value>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, class: impl Into<String>) -> Self {
        self.push(name, class);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, class: impl Into<String>) {
        self.combatants.push(RosterEntry {
            name: name.into(),
            class: class.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    /// Case-insensitive name check, matching how players type names back in.
    pub fn contains_name(&self, name: &str) -> bool {
        let id = normalize_id(name);
        self.combatants.iter().any(|e| normalize_id(&e.name) == id)
    }
}

pub fn validate_roster(roster: &Roster, catalog: &Catalog) -> Result<()> {
    if roster.len() < 2 {
        return Err(ArenaError::NotEnoughCombatants(roster.len()));
    }
    let mut seen = HashSet::new();
    for entry in &roster.combatants {
        let name = entry.name.trim();
        if name.is_empty() {
            return Err(ArenaError::EmptyName);
        }
        if !seen.insert(normalize_id(name)) {
            return Err(ArenaError::DuplicateName(name.to_string()));
        }
        if catalog.class(&entry.class).is_none() {
            return Err(ArenaError::UnknownClass(entry.class.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_well_formed_roster() {
        let roster = Roster::new().with("Dave", "Warrior").with("Ford", "mage");
        assert!(validate_roster(&roster, &Catalog::standard()).is_ok());
    }

    #[test]
    fn rejects_short_rosters() {
        let roster = Roster::new().with("Dave", "Warrior");
        let err = validate_roster(&roster, &Catalog::standard()).unwrap_err();
        assert!(matches!(err, ArenaError::NotEnoughCombatants(1)));
    }

    #[test]
    fn rejects_duplicate_and_blank_names() {
        let catalog = Catalog::standard();
        let dupes = Roster::new().with("Dave", "Warrior").with("dave", "Monk");
        assert!(matches!(
            validate_roster(&dupes, &catalog),
            Err(ArenaError::DuplicateName(_))
        ));
        let blank = Roster::new().with("Dave", "Warrior").with("   ", "Monk");
        assert!(matches!(
            validate_roster(&blank, &catalog),
            Err(ArenaError::EmptyName)
        ));
    }

    #[test]
    fn rejects_unknown_classes() {
        let roster = Roster::new().with("Dave", "Warrior").with("Ford", "Bard");
        let err = validate_roster(&roster, &Catalog::standard()).unwrap_err();
        assert_eq!(err.to_string(), "unknown class 'Bard'");
    }

    #[test]
    fn parses_json_with_unknown_fields() {
        let raw = r#"{
            "combatants": [
                {"name": "Kyran", "class": "Monk"},
                {"name": "Briff", "class": "Mage"}
            ],
            "arena": "colosseum"
        }"#;
        let roster: Roster = serde_json::from_str(raw).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.combatants[1].class, "Mage");
        assert!(roster.extras.contains_key("arena"));
        assert!(roster.contains_name("KYRAN"));
    }
}
