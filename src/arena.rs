//! Round loop over the living combatants.

use crate::catalog::Catalog;
use crate::combatant::{ChargedMove, Combatant, CombatantId};
use crate::error::{ArenaError, Result};
use crate::event::{BattleEvent, EventLog, EventSink};
use crate::model::{Move, TargetRule};
use crate::resolution::{resolve_move_on_target, PercentRoll};
use crate::roster::{validate_roster, Roster};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// External decision maker for every combatant (usually a human at a prompt).
pub trait Selector {
    /// Must return a move from `actor`'s own move set.
    fn select_move(&mut self, actor: &Combatant, field: &[&Combatant]) -> Result<Move>;

    /// Must return exactly `count` distinct members of `pool`.
    fn select_targets(
        &mut self,
        mv: &Move,
        actor: &Combatant,
        pool: &[&Combatant],
        count: usize,
    ) -> Result<Vec<CombatantId>>;
}

/// Resolves a selected move against the actor's own move set, returning the
/// canonical definition.
pub fn check_move(actor: &Combatant, mv: &Move) -> Result<Move> {
    actor
        .move_named(&mv.name)
        .cloned()
        .ok_or_else(|| ArenaError::UnknownMove {
            combatant: actor.name().to_string(),
            name: mv.name.clone(),
        })
}

pub fn check_targets(
    mv: &Move,
    chosen: &[CombatantId],
    pool: &[CombatantId],
    count: usize,
) -> Result<()> {
    if chosen.len() != count {
        return Err(ArenaError::InvalidTargetCount {
            mv: mv.name.clone(),
            expected: count,
            got: chosen.len(),
        });
    }
    let mut seen = HashSet::with_capacity(chosen.len());
    for id in chosen {
        if !pool.contains(id) {
            return Err(ArenaError::TargetNotInPool(*id));
        }
        if !seen.insert(*id) {
            return Err(ArenaError::DuplicateTarget(*id));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaOptions {
    /// Stop with a stalemate after this many rounds.
    pub max_rounds: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Victory(CombatantId),
    Stalemate,
    /// The last combatants went down on the same turn.
    Wipeout,
}

pub struct Arena<R = SmallRng> {
    combatants: Vec<Combatant>,
    living: Vec<CombatantId>,
    options: ArenaOptions,
    rng: R,
    round: u32,
    log: EventLog,
    outcome: Option<Outcome>,
}

impl Arena<SmallRng> {
    pub fn new(
        catalog: Catalog,
        roster: &Roster,
        options: ArenaOptions,
        seed: u64,
    ) -> Result<Self> {
        Self::with_roller(catalog, roster, options, SmallRng::seed_from_u64(seed))
    }
}

impl<R: PercentRoll> Arena<R> {
    pub fn with_roller(
        catalog: Catalog,
        roster: &Roster,
        options: ArenaOptions,
        rng: R,
    ) -> Result<Self> {
        validate_roster(roster, &catalog)?;
        let mut combatants = Vec::with_capacity(roster.len());
        for (idx, entry) in roster.combatants.iter().enumerate() {
            let class = catalog
                .class(&entry.class)
                .ok_or_else(|| ArenaError::UnknownClass(entry.class.clone()))?;
            combatants.push(Combatant::new(CombatantId(idx), entry.name.trim(), class));
        }
        let living = combatants.iter().map(Combatant::id).collect();
        Ok(Self {
            combatants,
            living,
            options,
            rng,
            round: 0,
            log: EventLog::new(),
            outcome: None,
        })
    }

    /// Every combatant that entered, eliminated or not, indexed by id.
    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(id.0)
    }

    pub fn living(&self) -> &[CombatantId] {
        &self.living
    }

    pub fn is_living(&self, id: CombatantId) -> bool {
        self.living.contains(&id)
    }

    pub fn living_combatants(&self) -> impl Iterator<Item = &Combatant> + '_ {
        self.living.iter().map(move |id| &self.combatants[id.0])
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Plays rounds until a single combatant is left, or the round cap hits.
    pub fn run(
        &mut self,
        selector: &mut dyn Selector,
        sink: &mut dyn EventSink,
    ) -> Result<Outcome> {
        loop {
            if let Some(outcome) = self.play_round(selector, sink)? {
                return Ok(outcome);
            }
        }
    }

    /// Plays one full round. Returns the outcome once the battle is decided.
    pub fn play_round(
        &mut self,
        selector: &mut dyn Selector,
        sink: &mut dyn EventSink,
    ) -> Result<Option<Outcome>> {
        if let Some(outcome) = self.outcome {
            return Ok(Some(outcome));
        }
        if let Some(outcome) = self.check_finished(sink) {
            return Ok(Some(outcome));
        }
        if let Some(cap) = self.options.max_rounds {
            if self.round >= cap {
                info!(rounds = self.round, "round cap reached");
                self.emit(sink, BattleEvent::Stalemate { rounds: self.round });
                self.outcome = Some(Outcome::Stalemate);
                return Ok(self.outcome);
            }
        }

        self.round += 1;
        info!(round = self.round, living = self.living.len(), "round started");
        self.emit(sink, BattleEvent::RoundStarted { round: self.round });

        let order = self.living.clone();
        for id in order {
            if !self.is_living(id) {
                continue;
            }
            self.take_turn(id, selector, sink)?;
            if let Some(outcome) = self.check_finished(sink) {
                return Ok(Some(outcome));
            }
        }
        Ok(None)
    }

    /// One combatant's turn: timers, charged moves, then a fresh move unless
    /// a pending charge blocks it.
    pub fn take_turn(
        &mut self,
        id: CombatantId,
        selector: &mut dyn Selector,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        let name = self.combatants[id.0].name().to_string();
        self.emit(sink, BattleEvent::TurnStarted { combatant: name.clone() });

        let ticks = self.combatants[id.0].advance_turn();
        self.emit_all(sink, ticks);
        let field: Vec<&Combatant> = self.living_combatants().collect();
        sink.observe_field(&self.combatants[id.0], &field);
        if self.combatants[id.0].is_eliminated() {
            self.eliminate(id, sink);
            return Ok(());
        }

        let blocked = self.fire_charged_moves(id, sink)?;
        if blocked || !self.is_living(id) || self.living.len() <= 1 {
            return Ok(());
        }

        let (mv, targets) = self.solicit_move(id, selector)?;
        match mv.charge {
            Some(charge) => {
                debug!(
                    combatant = %name,
                    mv = %mv.name,
                    delay = charge.delay_turns,
                    "charge queued"
                );
                self.emit(
                    sink,
                    BattleEvent::ChargeStarted {
                        combatant: name,
                        mv: mv.name.clone(),
                        turns: charge.delay_turns,
                    },
                );
                self.combatants[id.0].add_charged_move(
                    mv,
                    id,
                    targets,
                    charge.delay_turns,
                    charge.blocks_selection,
                );
            }
            None => {
                for target in targets {
                    if self.is_living(target) {
                        self.resolve_move(&mv, id, target, sink)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolves `mv` from `user` against one living `target`.
    pub fn resolve_move(
        &mut self,
        mv: &Move,
        user: CombatantId,
        target: CombatantId,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        if !self.is_living(target) {
            let name = self.name_of(target);
            return Err(ArenaError::EliminatedTarget(name));
        }
        let mut events = Vec::new();
        let strike = if user == target {
            let snapshot = self.combatants[user.0].clone();
            resolve_move_on_target(
                mv,
                &snapshot,
                &mut self.combatants[target.0],
                &mut self.rng,
                &mut events,
            )?
        } else {
            let (attacker, defender) = pair_mut(&mut self.combatants, user.0, target.0);
            resolve_move_on_target(mv, attacker, defender, &mut self.rng, &mut events)?
        };
        self.emit_all(sink, events);
        if strike.eliminated {
            self.living.retain(|id| *id != target);
            let name = self.name_of(target);
            info!(combatant = %name, "eliminated");
        }
        Ok(())
    }

    /// Fires every expired charge and reports the rest. Returns whether a
    /// pending charge blocks move selection this turn.
    fn fire_charged_moves(&mut self, id: CombatantId, sink: &mut dyn EventSink) -> Result<bool> {
        let mut charges = self.combatants[id.0].take_charged_moves().into_iter();
        let mut pending: Vec<ChargedMove> = Vec::with_capacity(charges.len());
        let mut blocked = false;
        while let Some(charge) = charges.next() {
            if charge.remaining_turns <= 0 {
                if let Err(err) = self.release_charge(&charge, sink) {
                    // Keep whatever has not fired yet.
                    pending.extend(charges);
                    self.combatants[id.0].requeue_charged_moves(pending);
                    return Err(err);
                }
            } else {
                self.emit(
                    sink,
                    BattleEvent::Charging {
                        combatant: self.name_of(id),
                        mv: charge.mv.name.clone(),
                    },
                );
                blocked |= charge.blocks_selection;
                pending.push(charge);
            }
        }
        self.combatants[id.0].requeue_charged_moves(pending);
        Ok(blocked)
    }

    fn release_charge(&mut self, charge: &ChargedMove, sink: &mut dyn EventSink) -> Result<()> {
        debug!(mv = %charge.mv.name, targets = charge.targets.len(), "charge released");
        for target in &charge.targets {
            if !self.is_living(*target) {
                let event = BattleEvent::TargetGone {
                    user: self.name_of(charge.user),
                    target: self.name_of(*target),
                    mv: charge.mv.name.clone(),
                };
                self.emit(sink, event);
                continue;
            }
            self.resolve_move(&charge.mv, charge.user, *target, sink)?;
        }
        Ok(())
    }

    fn solicit_move(
        &self,
        id: CombatantId,
        selector: &mut dyn Selector,
    ) -> Result<(Move, Vec<CombatantId>)> {
        let actor = &self.combatants[id.0];
        let field: Vec<&Combatant> = self.living_combatants().collect();
        let choice = selector.select_move(actor, &field)?;
        let mv = check_move(actor, &choice)?;

        let targets = match mv.target {
            TargetRule::SelfOnly => vec![id],
            TargetRule::All => self.living.clone(),
            TargetRule::AllOthers => self.opponents_of(id),
            TargetRule::Opponents(n) => {
                let pool = self.opponents_of(id);
                let count = n.min(pool.len());
                if count == 0 {
                    Vec::new()
                } else {
                    let pool_refs: Vec<&Combatant> =
                        pool.iter().map(|t| &self.combatants[t.0]).collect();
                    let chosen = selector.select_targets(&mv, actor, &pool_refs, count)?;
                    check_targets(&mv, &chosen, &pool, count)?;
                    chosen
                }
            }
        };
        debug!(combatant = %actor.name(), mv = %mv.name, targets = targets.len(), "move selected");
        Ok((mv, targets))
    }

    fn opponents_of(&self, id: CombatantId) -> Vec<CombatantId> {
        self.living.iter().copied().filter(|t| *t != id).collect()
    }

    fn check_finished(&mut self, sink: &mut dyn EventSink) -> Option<Outcome> {
        if self.outcome.is_some() {
            return self.outcome;
        }
        let outcome = match self.living.as_slice() {
            [winner] => {
                let winner = *winner;
                let name = self.name_of(winner);
                info!(winner = %name, rounds = self.round, "battle won");
                self.emit(sink, BattleEvent::Victory { winner: name });
                Outcome::Victory(winner)
            }
            [] => {
                info!(rounds = self.round, "no survivors");
                self.emit(sink, BattleEvent::NoSurvivors);
                Outcome::Wipeout
            }
            _ => return None,
        };
        self.outcome = Some(outcome);
        self.outcome
    }

    fn eliminate(&mut self, id: CombatantId, sink: &mut dyn EventSink) {
        self.living.retain(|t| *t != id);
        let name = self.name_of(id);
        info!(combatant = %name, "eliminated");
        self.emit(sink, BattleEvent::Down { combatant: name });
    }

    fn name_of(&self, id: CombatantId) -> String {
        self.combatants
            .get(id.0)
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| id.to_string())
    }

    fn emit(&mut self, sink: &mut dyn EventSink, event: BattleEvent) {
        sink.emit(&event);
        self.log.push(event);
    }

    fn emit_all(&mut self, sink: &mut dyn EventSink, events: Vec<BattleEvent>) {
        for event in events {
            self.emit(sink, event);
        }
    }
}

fn pair_mut(items: &mut [Combatant], a: usize, b: usize) -> (&Combatant, &mut Combatant) {
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&right[0], &mut left[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::StatusKind;
    use crate::testing::{ScriptedRolls, ScriptedSelector};

    fn arena(roster: Roster, rolls: impl IntoIterator<Item = i32>) -> Arena<ScriptedRolls> {
        Arena::with_roller(
            Catalog::standard(),
            &roster,
            ArenaOptions::default(),
            ScriptedRolls::new(rolls),
        )
        .unwrap()
    }

    #[test]
    fn check_targets_enforces_the_contract() {
        let mv = Catalog::standard().move_def("Whirlwind slash").cloned().unwrap();
        let pool = [CombatantId(1), CombatantId(2), CombatantId(3)];
        assert!(check_targets(&mv, &[CombatantId(1), CombatantId(3)], &pool, 2).is_ok());
        assert!(matches!(
            check_targets(&mv, &[CombatantId(1)], &pool, 2),
            Err(ArenaError::InvalidTargetCount { expected: 2, got: 1, .. })
        ));
        assert!(matches!(
            check_targets(&mv, &[CombatantId(1), CombatantId(0)], &pool, 2),
            Err(ArenaError::TargetNotInPool(CombatantId(0)))
        ));
        assert!(matches!(
            check_targets(&mv, &[CombatantId(2), CombatantId(2)], &pool, 2),
            Err(ArenaError::DuplicateTarget(CombatantId(2)))
        ));
    }

    #[test]
    fn foreign_moves_are_rejected() {
        let roster = Roster::new().with("Dave", "Warrior").with("Ford", "Mage");
        let mut arena = arena(roster, []);
        let mut selector = ScriptedSelector::new().then("Fireball", [1]);
        let err = arena.take_turn(CombatantId(0), &mut selector, &mut ()).unwrap_err();
        assert!(matches!(err, ArenaError::UnknownMove { .. }));
    }

    #[test]
    fn the_actor_is_never_offered_as_a_target() {
        let roster = Roster::new().with("Dave", "Warrior").with("Ford", "Mage");
        let mut arena = arena(roster, []);
        let mut selector = ScriptedSelector::new().then("Sword slash", [0]);
        let err = arena.take_turn(CombatantId(0), &mut selector, &mut ()).unwrap_err();
        assert!(matches!(err, ArenaError::TargetNotInPool(CombatantId(0))));
    }

    #[test]
    fn target_count_is_capped_by_the_pool() {
        let roster = Roster::new().with("Dave", "Warrior").with("Ford", "Mage");
        // Whirlwind wants two opponents but only Ford is available.
        let mut arena = arena(roster, [1, 100]);
        let mut selector = ScriptedSelector::new().then("Whirlwind slash", [1]);
        arena.take_turn(CombatantId(0), &mut selector, &mut ()).unwrap();
        assert_eq!(arena.combatant(CombatantId(1)).unwrap().health(), 70);
    }

    #[test]
    fn self_moves_skip_target_selection() {
        let roster = Roster::new().with("Dave", "Warrior").with("Ford", "Mage");
        let mut arena = arena(roster, []);
        let mut selector = ScriptedSelector::new().then("Rallying cry", []);
        arena.take_turn(CombatantId(0), &mut selector, &mut ()).unwrap();
        assert_eq!(selector.target_requests, 0);
        let dave = arena.combatant(CombatantId(0)).unwrap();
        assert_eq!(dave.status_effects()[0].kind, StatusKind::AttackUp);
    }

    #[test]
    fn burn_can_finish_a_combatant_before_it_acts() {
        let roster = Roster::new()
            .with("Dave", "Warrior")
            .with("Ford", "Mage")
            .with("Alex", "Monk");
        let mut arena = arena(roster, []);
        arena.combatants[1].apply_damage(78.0);
        arena.combatants[1].add_status_effect(StatusKind::Burning, 5.0, 3);
        let mut selector = ScriptedSelector::new();
        let mut seen = Vec::new();
        arena.take_turn(CombatantId(1), &mut selector, &mut seen).unwrap();
        assert_eq!(selector.move_requests, 0);
        assert!(!arena.is_living(CombatantId(1)));
        assert_eq!(
            seen.last(),
            Some(&BattleEvent::Down {
                combatant: "Ford".into()
            })
        );
    }

    #[derive(Default)]
    struct FieldWatcher {
        turns: Vec<(String, usize)>,
    }

    impl EventSink for FieldWatcher {
        fn emit(&mut self, _event: &BattleEvent) {}

        fn observe_field(&mut self, actor: &Combatant, field: &[&Combatant]) {
            self.turns.push((actor.name().to_string(), field.len()));
        }
    }

    #[test]
    fn field_is_shown_even_when_a_charge_blocks_selection() {
        let roster = Roster::new()
            .with("Ford", "Mage")
            .with("Dave", "Warrior")
            .with("Alex", "Monk");
        let mut arena = arena(roster, []);
        let mut selector = ScriptedSelector::new().then("Lightning bolt", [1]);
        let mut watcher = FieldWatcher::default();

        arena.take_turn(CombatantId(0), &mut selector, &mut watcher).unwrap();
        arena.take_turn(CombatantId(0), &mut selector, &mut watcher).unwrap();

        assert_eq!(selector.move_requests, 1);
        assert_eq!(
            watcher.turns,
            vec![("Ford".to_string(), 3), ("Ford".to_string(), 3)]
        );
    }

    #[test]
    fn failed_charge_keeps_the_rest_of_the_queue() {
        let roster = Roster::new()
            .with("Ford", "Mage")
            .with("Dave", "Warrior")
            .with("Alex", "Monk");
        let mut arena = arena(roster, []);
        let bolt = arena.combatants[0].move_named("Lightning bolt").cloned().unwrap();
        // Dave is still listed as living, so releasing at him breaks the contract.
        arena.combatants[1].apply_damage(200.0);
        let ford = &mut arena.combatants[0];
        ford.add_charged_move(bolt.clone(), CombatantId(0), vec![CombatantId(2)], 3, true);
        ford.add_charged_move(bolt.clone(), CombatantId(0), vec![CombatantId(1)], 0, true);
        ford.add_charged_move(bolt, CombatantId(0), vec![CombatantId(2)], 3, true);

        let mut selector = ScriptedSelector::new();
        let err = arena.take_turn(CombatantId(0), &mut selector, &mut ()).unwrap_err();

        assert!(matches!(err, ArenaError::EliminatedTarget(name) if name == "Dave"));
        let queue = arena.combatant(CombatantId(0)).unwrap().charged_moves();
        assert_eq!(queue.len(), 2);
        assert!(queue.iter().all(|c| c.targets == vec![CombatantId(2)]));
        assert_eq!(selector.move_requests, 0);
    }

    #[test]
    fn round_cap_ends_in_stalemate() {
        let roster = Roster::new().with("Dave", "Warrior").with("Ford", "Warrior");
        let mut arena = Arena::with_roller(
            Catalog::standard(),
            &roster,
            ArenaOptions {
                max_rounds: Some(2),
            },
            ScriptedRolls::new([]),
        )
        .unwrap();
        let mut selector = ScriptedSelector::new()
            .then("Rallying cry", [])
            .then("Rallying cry", [])
            .then("Rallying cry", [])
            .then("Rallying cry", []);
        let outcome = arena.run(&mut selector, &mut ()).unwrap();
        assert_eq!(outcome, Outcome::Stalemate);
        assert_eq!(arena.round(), 2);
        assert_eq!(
            arena.log().events().last(),
            Some(&BattleEvent::Stalemate { rounds: 2 })
        );
    }
}
