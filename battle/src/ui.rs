use anyhow::Result;
use battle_arena::combatant::{Combatant, CombatantId};
use battle_arena::error::Result as ArenaResult;
use battle_arena::resolution::true_accuracy;
use battle_arena::{BattleEvent, Catalog, EventSink, Move, Roster, Selector};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

const DEFAULT_NAMES: [&str; 7] = [
    "Mitchell", "Dave", "Kyran", "Chuckles", "Ford", "Alex", "Briff",
];
const DEFAULT_CLASSES: [&str; 2] = ["Warrior", "Mage"];
const DEFAULT_TRIGGER: &str = "default";

/// Scales every pause by the `--speed` factor.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    speed: f64,
}

impl Pacing {
    pub fn new(speed: f64) -> Self {
        Self { speed }
    }

    pub fn pause(&self, secs: f64) {
        thread::sleep(Duration::from_secs_f64(secs / self.speed));
    }
}

/// Adds up to `count` generated players, skipping names already taken.
/// Returns how many were added.
pub fn add_default_players(roster: &mut Roster, count: usize, rng: &mut SmallRng) -> usize {
    let mut names = DEFAULT_NAMES.to_vec();
    names.shuffle(rng);
    let mut added = 0;
    for name in names {
        if added == count {
            break;
        }
        if roster.contains_name(name) {
            continue;
        }
        let class = DEFAULT_CLASSES.choose(rng).copied().unwrap_or("Warrior");
        roster.push(name, class);
        added += 1;
    }
    added
}

pub fn prompt_roster(catalog: &Catalog, rng: &mut SmallRng, pacing: &Pacing) -> Result<Roster> {
    println!("Enter each player's name below.");
    println!("Once each name is entered, leave the input blank and press Enter.");
    println!("To use default players, type 'default<number of players>'.");

    let mut roster = Roster::new();
    loop {
        print!("Enter a name: ");
        let input = read_line()?;
        let name = input.trim();

        if name.is_empty() {
            if roster.len() >= 2 {
                return Ok(roster);
            }
            error_message("INVALID PLAYER COUNT", "You must enter 2 or more players", pacing)?;
            continue;
        }

        if let Some(rest) = name.strip_prefix(DEFAULT_TRIGGER) {
            let Ok(count) = rest.trim().parse::<usize>() else {
                error_message("INVALID INPUT", "Type 'default' followed by a number", pacing)?;
                continue;
            };
            let before = roster.len();
            let added = add_default_players(&mut roster, count, rng);
            for entry in &roster.combatants[before..] {
                println!("{} is joining the battle as a {}!", entry.name, entry.class);
                pacing.pause(0.25);
            }
            if added < count {
                error_message("NO MORE DEFAULTS", "No more default players can be added", pacing)?;
            }
            continue;
        }

        if roster.contains_name(name) {
            error_message(
                "INVALID PLAYER NAME",
                "You cannot enter the same name more than once",
                pacing,
            )?;
            continue;
        }

        let class = prompt_class(name, catalog, pacing)?;
        println!("{name} is joining the battle as a {class}!");
        roster.push(name, class);
    }
}

fn prompt_class(name: &str, catalog: &Catalog, pacing: &Pacing) -> Result<String> {
    let classes = catalog.classes();
    loop {
        for (idx, class) in classes.iter().enumerate() {
            println!("{}: {}", idx + 1, class.name);
        }
        print!("Which class is {name}? ");
        let input = read_line()?;
        let choice = input.trim();
        if let Some(class) = catalog.class(choice) {
            return Ok(class.name.clone());
        }
        match choice.parse::<usize>() {
            Ok(n) if (1..=classes.len()).contains(&n) => return Ok(classes[n - 1].name.clone()),
            Ok(_) => error_message(
                "INVALID CLASS",
                &format!(
                    "You must enter either a class name or a number from 1 to {}",
                    classes.len()
                ),
                pacing,
            )?,
            Err(_) => {
                let names: Vec<&str> = classes.iter().map(|c| c.name.as_str()).collect();
                error_message(
                    "INVALID CLASS",
                    &format!("You must enter one of the following: {}", names.join("/ ")),
                    pacing,
                )?
            }
        }
    }
}

/// Move and target prompts for whoever is sitting at the terminal.
pub struct ConsoleSelector {
    pacing: Pacing,
}

impl ConsoleSelector {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }
}

impl Selector for ConsoleSelector {
    fn select_move(&mut self, actor: &Combatant, _field: &[&Combatant]) -> ArenaResult<Move> {
        let moves = actor.moves();
        loop {
            println!("CHOOSE YOUR MOVE");
            self.pacing.pause(0.25);
            for (idx, mv) in moves.iter().enumerate() {
                println!("{}: {} --- {}", idx + 1, mv.name, mv.description);
                self.pacing.pause(0.1);
            }
            print!(
                "Which move would you like to use? \
                 Type 'INFO <choice>' to get information about that move. "
            );
            let input = read_line()?;
            let (is_info, choice) = split_info_request(input.trim());

            if choice.is_empty() {
                error_message("NOTHING ENTERED", "You must enter a move to use", &self.pacing)?;
                continue;
            }
            let picked = match choice.parse::<usize>() {
                Ok(n) if (1..=moves.len()).contains(&n) => Some(&moves[n - 1]),
                Ok(_) => {
                    error_message(
                        "INVALID NUMBER",
                        &format!(
                            "You must either enter the move name or a number from 1 to {}",
                            moves.len()
                        ),
                        &self.pacing,
                    )?;
                    continue;
                }
                Err(_) => actor.move_named(choice),
            };
            let Some(mv) = picked else {
                error_message(
                    "INVALID INPUT",
                    &format!("{choice} is not in your move set"),
                    &self.pacing,
                )?;
                continue;
            };

            if is_info {
                println!("\n{}\n", mv.summary());
                wait_for_enter()?;
                continue;
            }
            return Ok(mv.clone());
        }
    }

    fn select_targets(
        &mut self,
        mv: &Move,
        actor: &Combatant,
        pool: &[&Combatant],
        count: usize,
    ) -> ArenaResult<Vec<CombatantId>> {
        let mut remaining: Vec<&Combatant> = pool.to_vec();
        let mut chosen = Vec::with_capacity(count);

        while chosen.len() < count {
            println!("CHOOSE YOUR TARGET");
            self.pacing.pause(0.25);
            for (idx, target) in remaining.iter().enumerate() {
                println!("{}: {}", idx + 1, target.name());
            }
            print!(
                "Who would you like to target? \
                 Type 'INFO <choice>' to see how accurate the move will be on them. "
            );
            let input = read_line()?;
            let (is_info, choice) = split_info_request(input.trim());

            let picked = match choice.parse::<usize>() {
                Ok(n) if (1..=remaining.len()).contains(&n) => Some(n - 1),
                Ok(_) => {
                    error_message(
                        "INVALID NUMBER",
                        &format!(
                            "You must only enter a number between 1 and {} (inclusive)",
                            remaining.len()
                        ),
                        &self.pacing,
                    )?;
                    continue;
                }
                Err(_) => remaining
                    .iter()
                    .position(|t| t.name().eq_ignore_ascii_case(choice)),
            };
            let Some(idx) = picked else {
                error_message(
                    "INVALID TARGET",
                    "You must enter a player name or corresponding number",
                    &self.pacing,
                )?;
                continue;
            };

            if is_info {
                let target = remaining[idx];
                println!("\n{}\n", target.summary());
                let actual = match true_accuracy(mv, actor, target) {
                    Some(chance) => format!("{chance}%"),
                    None => "Cannot miss".to_string(),
                };
                println!("Baseline chance of hitting: {}", mv.accuracy);
                println!("Actual chance of hitting: {actual}\n");
                wait_for_enter()?;
                continue;
            }
            chosen.push(remaining.remove(idx).id());
        }
        println!();
        Ok(chosen)
    }
}

/// Prints events as they happen, with pauses between them.
pub struct Printer {
    pacing: Pacing,
}

impl Printer {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }
}

impl EventSink for Printer {
    fn emit(&mut self, event: &BattleEvent) {
        match event {
            BattleEvent::RoundStarted { .. } => {
                println!("\n========== {event} ==========");
                self.pacing.pause(0.5);
            }
            BattleEvent::TurnStarted { .. } => {
                println!("\n------ {event} ------");
            }
            BattleEvent::Victory { .. }
            | BattleEvent::Stalemate { .. }
            | BattleEvent::NoSurvivors => {
                println!("\n=======================================");
                println!("{event}\n");
            }
            _ => {
                println!("{event}");
                self.pacing.pause(1.0);
            }
        }
    }

    fn observe_field(&mut self, actor: &Combatant, field: &[&Combatant]) {
        println!();
        for combatant in field {
            let marker = if combatant.id() == actor.id() { ">" } else { " " };
            println!("{marker} {}", combatant.summary());
            self.pacing.pause(0.25);
        }
        println!();
    }
}

fn split_info_request(input: &str) -> (bool, &str) {
    match input.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("info ") => (true, input[5..].trim()),
        _ => (false, input),
    }
}

fn error_message(header: &str, message: &str, pacing: &Pacing) -> io::Result<()> {
    let top = format!("\n/ / / / / / {header} / / / / / /");
    println!("{top}");
    pacing.pause(0.25);
    print!("{message}. Press Enter to continue: ");
    read_line()?;
    println!("{}\n", "/ ".repeat(top.len() / 2));
    Ok(())
}

fn wait_for_enter() -> io::Result<()> {
    print!("Press Enter to continue: ");
    read_line().map(|_| ())
}

fn read_line() -> io::Result<String> {
    io::stdout().flush()?;
    read_line_from(&mut io::stdin().lock())
}

/// A closed input is an error rather than an endless stream of blank lines.
fn read_line_from(input: &mut impl BufRead) -> io::Result<String> {
    let mut buf = String::new();
    if input.read_line(&mut buf)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed",
        ));
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn info_prefix_is_case_insensitive() {
        assert_eq!(split_info_request("INFO Fireball"), (true, "Fireball"));
        assert_eq!(split_info_request("info 2"), (true, "2"));
        assert_eq!(split_info_request("Fireball"), (false, "Fireball"));
        assert_eq!(split_info_request("inf"), (false, "inf"));
    }

    #[test]
    fn closed_input_stops_prompting() {
        let mut closed = io::empty();
        let err = read_line_from(&mut closed).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let arena_err = battle_arena::ArenaError::from(err);
        assert!(arena_err.to_string().starts_with("input error"));
    }

    #[test]
    fn blank_line_is_still_input() {
        let mut input = io::Cursor::new("\nFireball\n");
        assert_eq!(read_line_from(&mut input).unwrap(), "\n");
        assert_eq!(read_line_from(&mut input).unwrap(), "Fireball\n");
        assert!(read_line_from(&mut input).is_err());
    }

    #[test]
    fn default_players_skip_taken_names() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut roster = Roster::new().with("Dave", "Monk");
        let added = add_default_players(&mut roster, 10, &mut rng);
        assert_eq!(added, 6);
        assert_eq!(roster.len(), 7);
        assert!(roster
            .combatants
            .iter()
            .all(|e| e.class == "Warrior" || e.class == "Mage" || e.name == "Dave"));
    }
}
