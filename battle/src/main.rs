mod ui;

use anyhow::Context;
use battle_arena::{load_roster, write_log, Arena, ArenaOptions, Catalog, Outcome, Roster};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

struct CliOptions {
    roster_path: Option<PathBuf>,
    defaults: Option<usize>,
    seed: Option<u64>,
    speed: f64,
    log_path: Option<PathBuf>,
    max_rounds: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("battle_arena=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = parse_args()?;
    run_game(opts)
}

fn parse_args() -> anyhow::Result<CliOptions> {
    let mut roster_path = None;
    let mut defaults = None;
    let mut seed = None;
    let mut speed = 1.0f64;
    let mut log_path = None;
    let mut max_rounds = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--roster" => {
                roster_path = Some(
                    args.next()
                        .map(PathBuf::from)
                        .ok_or_else(|| anyhow::anyhow!("--roster needs a path"))?,
                );
            }
            "--defaults" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--defaults needs a player count"))?;
                defaults = Some(val.parse().context("--defaults must be a whole number")?);
            }
            "--seed" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--seed needs a number"))?;
                seed = Some(val.parse()?);
            }
            "--speed" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--speed needs a number"))?;
                speed = val.parse()?;
                if !(speed > 0.0) {
                    anyhow::bail!("--speed must be greater than 0 (got {speed})");
                }
            }
            "--log-json" => {
                log_path = Some(
                    args.next()
                        .map(PathBuf::from)
                        .ok_or_else(|| anyhow::anyhow!("--log-json needs a path"))?,
                );
            }
            "--max-rounds" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--max-rounds needs a number"))?;
                max_rounds = Some(val.parse()?);
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                print_usage();
                anyhow::bail!("unknown argument: {}", other);
            }
        }
    }

    if roster_path.is_some() && defaults.is_some() {
        anyhow::bail!("--roster and --defaults cannot be combined");
    }

    Ok(CliOptions {
        roster_path,
        defaults,
        seed,
        speed,
        log_path,
        max_rounds,
    })
}

fn run_game(opts: CliOptions) -> anyhow::Result<()> {
    let seed = opts.seed.unwrap_or_else(rand::random);
    tracing::debug!(seed, "battle seed");
    let pacing = ui::Pacing::new(opts.speed);
    let catalog = Catalog::standard();
    let mut name_rng = SmallRng::seed_from_u64(seed ^ 0xD1B5_C0DE);

    let roster = match (&opts.roster_path, opts.defaults) {
        (Some(path), _) => load_roster(path, &catalog)?,
        (None, Some(count)) => {
            let mut roster = Roster::new();
            let added = ui::add_default_players(&mut roster, count, &mut name_rng);
            if added < count {
                anyhow::bail!("only {added} default players are available");
            }
            roster
        }
        (None, None) => ui::prompt_roster(&catalog, &mut name_rng, &pacing)?,
    };
    for entry in &roster.combatants {
        println!("{} is joining the battle as a {}!", entry.name, entry.class);
    }

    let options = ArenaOptions {
        max_rounds: opts.max_rounds,
    };
    let mut arena =
        Arena::new(catalog, &roster, options, seed).context("could not set up the battle")?;
    let mut selector = ui::ConsoleSelector::new(pacing);
    let mut printer = ui::Printer::new(pacing);

    let outcome = arena.run(&mut selector, &mut printer)?;
    if let Outcome::Victory(id) = outcome {
        if let Some(winner) = arena.combatant(id) {
            println!("{}", winner.summary());
        }
    }

    if let Some(path) = &opts.log_path {
        write_log(arena.log(), path)?;
        println!("Wrote battle log to {}", path.display());
    }
    Ok(())
}

fn print_usage() {
    eprintln!(
        "Usage: cargo run -p battle-arena-cli -- [--roster roster.json | --defaults N] [--seed N] \
[--speed F] [--log-json PATH] [--max-rounds N]"
    );
}
