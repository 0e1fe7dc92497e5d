use std::io::{self, BufRead, Write};

use anyhow::{Context, bail};
use chainsweeper_core::{
    Coord2, Difficulty, GameSession, LedgerIntent, RandomMineGenerator, RevealOutcome,
    SessionController,
};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use futures_channel::mpsc::UnboundedSender;

use crate::ledger::SimulatedLedger;

mod ledger;
mod render;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum Preset {
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

impl From<Preset> for Difficulty {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Beginner => Difficulty::Beginner,
            Preset::Intermediate => Difficulty::Intermediate,
            Preset::Expert => Difficulty::Expert,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    #[arg(short, long, value_enum, default_value_t)]
    difficulty: Preset,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Moves before the simulated ledger answers
    #[arg(short, long, default_value_t = 2)]
    latency: u64,

    /// Make the simulated ledger reject every reveal batch
    #[arg(long)]
    reject_batches: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Command {
    Reveal(Coord2),
    Flag(Coord2),
    Chord(Coord2),
    NewGame(Option<Difficulty>),
    Quit,
}

fn parse_coords<'a>(words: &mut impl Iterator<Item = &'a str>) -> anyhow::Result<Coord2> {
    let x = words.next().context("missing x")?.parse()?;
    let y = words.next().context("missing y")?.parse()?;
    Ok((x, y))
}

fn parse_command(line: &str) -> anyhow::Result<Command> {
    let mut words = line.split_whitespace();
    let verb = words.next().context("empty command")?;
    let command = match verb {
        "r" | "reveal" => Command::Reveal(parse_coords(&mut words)?),
        "f" | "flag" => Command::Flag(parse_coords(&mut words)?),
        "c" | "chord" => Command::Chord(parse_coords(&mut words)?),
        "n" | "new" => match words.next() {
            None => Command::NewGame(None),
            Some(name) => {
                let preset = Preset::from_str(name, true).map_err(anyhow::Error::msg)?;
                Command::NewGame(Some(preset.into()))
            }
        },
        "q" | "quit" => Command::Quit,
        other => bail!("unknown command {:?}", other),
    };
    Ok(command)
}

type Controller = SessionController<RandomMineGenerator, UnboundedSender<LedgerIntent>>;

/// Runs one command, returns whether the board needs to be drawn again.
fn apply(
    controller: &mut Controller,
    session: &mut GameSession,
    command: Command,
) -> anyhow::Result<bool> {
    let now = Utc::now();
    let changed = match command {
        Command::Reveal(coords) => announce(controller.reveal(session, coords, now)?),
        Command::Chord(coords) => announce(controller.chord(session, coords, now)?),
        Command::Flag(coords) => controller.toggle_flag(session, coords)?.has_update(),
        Command::NewGame(difficulty) => {
            let difficulty = difficulty.unwrap_or(session.difficulty());
            controller.new_game(session, difficulty)?;
            true
        }
        Command::Quit => false,
    };
    Ok(changed)
}

fn announce(outcome: RevealOutcome) -> bool {
    match outcome {
        RevealOutcome::HitMine => println!("Boom."),
        RevealOutcome::Won => println!("Cleared!"),
        RevealOutcome::NoChange | RevealOutcome::Revealed => {}
    }
    outcome.has_update()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let seed = args
        .seed
        .unwrap_or_else(|| Utc::now().timestamp_micros() as u64);
    log::info!("seed: {}", seed);

    let (sender, receiver) = futures_channel::mpsc::unbounded();
    let mut ledger = SimulatedLedger::new(receiver, args.latency, args.reject_batches);
    let mut controller = SessionController::new(RandomMineGenerator::from_seed(seed), sender);
    let mut session = controller.start(args.difficulty.into())?;

    println!("commands: r x y | f x y | c x y | n [difficulty] | q");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut redraw = true;
    loop {
        for notice in ledger.tick()? {
            controller.handle_notice(&mut session, notice);
        }
        if redraw {
            print!("{}", render::board(&session));
        }
        println!("{}", render::status_line(&session, Utc::now()));
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        redraw = false;
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => match apply(&mut controller, &mut session, command) {
                Ok(changed) => redraw = changed,
                Err(err) => println!("{}", err),
            },
            Err(err) => println!("{}", err),
        }
    }

    if ledger.pending() > 0 {
        log::info!("{} ledger answers never arrived", ledger.pending());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("r 3 4").unwrap(), Command::Reveal((3, 4)));
        assert_eq!(parse_command("flag 0 8").unwrap(), Command::Flag((0, 8)));
        assert_eq!(parse_command("c 1 1").unwrap(), Command::Chord((1, 1)));
        assert_eq!(parse_command("n").unwrap(), Command::NewGame(None));
        assert_eq!(
            parse_command("n expert").unwrap(),
            Command::NewGame(Some(Difficulty::Expert))
        );
        assert_eq!(parse_command("q").unwrap(), Command::Quit);
        assert!(parse_command("r 3").is_err());
        assert!(parse_command("r 300 1").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn only_changing_commands_ask_for_a_redraw() {
        let (sender, _receiver) = futures_channel::mpsc::unbounded();
        let mut controller = SessionController::new(RandomMineGenerator::from_seed(1), sender);
        let mut session = controller.start(Difficulty::Beginner).unwrap();

        assert!(apply(&mut controller, &mut session, Command::Reveal((4, 4))).unwrap());
        assert!(!apply(&mut controller, &mut session, Command::Reveal((4, 4))).unwrap());
        assert!(!apply(&mut controller, &mut session, Command::Flag((4, 4))).unwrap());
        assert!(apply(&mut controller, &mut session, Command::NewGame(None)).unwrap());
        assert!(apply(&mut controller, &mut session, Command::Flag((0, 0))).unwrap());
        assert!(apply(&mut controller, &mut session, Command::Reveal((9, 9))).is_err());
    }
}
