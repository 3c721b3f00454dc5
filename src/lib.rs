pub mod arena;
pub mod catalog;
pub mod combatant;
pub mod error;
pub mod event;
pub mod model;
pub mod resolution;
pub mod roster;
pub mod testing;

pub use crate::arena::{check_move, check_targets, Arena, ArenaOptions, Outcome, Selector};
pub use crate::catalog::Catalog;
pub use crate::combatant::{Combatant, CombatantId, StatusKind};
pub use crate::error::ArenaError;
pub use crate::event::{BattleEvent, EventLog, EventSink};
pub use crate::model::{Move, MoveTag, TargetRule};
pub use crate::roster::{validate_roster, Roster, RosterEntry};

use anyhow::Context;
use std::path::Path;

pub fn load_roster(path: &Path, catalog: &Catalog) -> anyhow::Result<Roster> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read roster file at {}", path.display()))?;
    let parsed: Roster = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
    validate_roster(&parsed, catalog)
        .with_context(|| format!("Invalid roster in {}", path.display()))?;
    Ok(parsed)
}

/// Writes the full event log as pretty-printed JSON.
pub fn write_log(log: &EventLog, path: &Path) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(&log.to_json())?;
    std::fs::write(path, body)
        .with_context(|| format!("Failed to write battle log to {}", path.display()))?;
    Ok(())
}
