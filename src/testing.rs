//! Deterministic stand-ins for the random source and the selection
//! collaborator, for tests that need exact control over a battle.

use crate::arena::Selector;
use crate::combatant::{Combatant, CombatantId};
use crate::error::{ArenaError, Result};
use crate::model::{Accuracy, Move, TargetRule};
use crate::resolution::PercentRoll;
use std::collections::VecDeque;

/// Replays a fixed sequence of 1..=100 draws.
///
/// Panics when the script runs dry so a test never silently reads past it.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRolls {
    draws: VecDeque<i32>,
}

impl ScriptedRolls {
    pub fn new(draws: impl IntoIterator<Item = i32>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl PercentRoll for ScriptedRolls {
    fn roll_percent(&mut self) -> i32 {
        match self.draws.pop_front() {
            Some(draw) => draw,
            None => panic!("scripted rolls exhausted"),
        }
    }
}

#[derive(Debug, Clone)]
struct Pick {
    mv: String,
    targets: Vec<CombatantId>,
}

/// Plays queued picks in order, then falls back to each actor's first move
/// aimed at the first eligible targets.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSelector {
    script: VecDeque<Pick>,
    pending_targets: Option<Vec<CombatantId>>,
    pub move_requests: usize,
    pub target_requests: usize,
}

impl ScriptedSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, mv: &str, targets: impl IntoIterator<Item = usize>) -> Self {
        self.script.push_back(Pick {
            mv: mv.to_string(),
            targets: targets.into_iter().map(CombatantId).collect(),
        });
        self
    }

    pub fn is_exhausted(&self) -> bool {
        self.script.is_empty()
    }
}

impl Selector for ScriptedSelector {
    fn select_move(&mut self, actor: &Combatant, _field: &[&Combatant]) -> Result<Move> {
        self.move_requests += 1;
        match self.script.pop_front() {
            Some(pick) => {
                self.pending_targets = Some(pick.targets);
                // Unknown names are handed back as-is so the engine gets to reject them.
                Ok(actor.move_named(&pick.mv).cloned().unwrap_or_else(|| Move {
                    name: pick.mv,
                    tags: Vec::new(),
                    effects: Vec::new(),
                    accuracy: Accuracy::NeverMiss,
                    crit: None,
                    target: TargetRule::SelfOnly,
                    charge: None,
                    description: String::new(),
                }))
            }
            None => {
                self.pending_targets = None;
                actor
                    .moves()
                    .first()
                    .cloned()
                    .ok_or_else(|| ArenaError::UnknownMove {
                        combatant: actor.name().to_string(),
                        name: String::new(),
                    })
            }
        }
    }

    fn select_targets(
        &mut self,
        _mv: &Move,
        _actor: &Combatant,
        pool: &[&Combatant],
        count: usize,
    ) -> Result<Vec<CombatantId>> {
        self.target_requests += 1;
        match self.pending_targets.take() {
            Some(targets) => Ok(targets),
            None => Ok(pool.iter().take(count).map(|c| c.id()).collect()),
        }
    }
}
