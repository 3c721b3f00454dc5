use crate::combatant::CombatantId;
use thiserror::Error;

/// Errors raised by the engine when a collaborator breaks its contract or
/// a battle is configured inconsistently.
#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("{combatant} does not know the move '{name}'")]
    UnknownMove { combatant: String, name: String },
    #[error("unknown class '{0}'")]
    UnknownClass(String),
    #[error("{mv} needs exactly {expected} target(s), got {got}")]
    InvalidTargetCount {
        mv: String,
        expected: usize,
        got: usize,
    },
    #[error("{0} is not a valid target")]
    TargetNotInPool(CombatantId),
    #[error("{0} was chosen as a target more than once")]
    DuplicateTarget(CombatantId),
    #[error("{0} has already been eliminated")]
    EliminatedTarget(String),
    #[error("the name '{0}' is already taken")]
    DuplicateName(String),
    #[error("combatant names must not be empty")]
    EmptyName,
    #[error("a battle needs at least two combatants, got {0}")]
    NotEnoughCombatants(usize),
    #[error("input error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ArenaError>;
