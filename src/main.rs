use std::{fs, path::PathBuf};

use anyhow::{bail, Context};
use clap::Parser;

use engine::{prelude::*, BuildingKind, Gameboard, ItemKind, Msg, NightStatus, Settings};
use util::Logos;

pub const GAME_NAME: &str = "henhouse";

/// Starting farm, woods on the edges and a fenced yard in the middle.
const FARM: &str = "
    %%%%%%%%%%%%%%%%%%
    %................%
    %.##############.%
    %.#............#.%
    %.#............#.%
    %.#............#.%
    %.#............#.%
    %.##############.%
    %................%
    %%%%%%%%%%%%%%%%%%";

#[derive(Parser, Debug)]
#[command(version, about = "Play out nights of foxes raiding a chicken farm")]
struct Args {
    #[arg(long, value_parser = |e: &str| Ok::<Logos, &str>(Logos::new(e)), help = "Game world seed")]
    seed: Option<Logos>,

    #[arg(long, default_value_t = 3, help = "Number of days to play")]
    days: u32,

    #[arg(long, help = "IDM file with level settings")]
    settings: Option<PathBuf>,

    #[arg(long, help = "Continue from a save file")]
    load: Option<PathBuf>,

    #[arg(long, help = "Write the board to a save file at the end")]
    save: Option<PathBuf>,

    #[arg(short, long, help = "Log every tick")]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .init();

    let mut board = match &args.load {
        Some(path) => {
            if args.settings.is_some() {
                bail!("--settings can't be used with a loaded game");
            }
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Gameboard::load(&text)
                .with_context(|| format!("loading {}", path.display()))?
        }
        None => {
            let settings = match &args.settings {
                Some(path) => {
                    let text = fs::read_to_string(path).with_context(|| {
                        format!("reading {}", path.display())
                    })?;
                    Settings::from_idm(&text).with_context(|| {
                        format!("parsing {}", path.display())
                    })?
                }
                None => Default::default(),
            };
            let seed = args.seed.clone().unwrap_or_else(|| {
                Logos::sample(&mut util::srng(&std::time::SystemTime::now()), 10)
            });
            log::info!("seed: {seed}");
            new_farm(settings, seed.seed())?
        }
    };

    for _ in 0..args.days {
        let day = board.day();
        board.start_night();
        while board.night_step() == NightStatus::Ongoing {}
        let ticks = board.night_ticks();
        board.start_day();

        for msg in board.drain_messages() {
            if let Msg::Breach { at, explosion } = msg {
                let how = if explosion { "blown up" } else { "dug through" };
                log::info!("fence {how} at {at}");
            }
        }
        println!(
            "night {day}: {ticks} ticks, {} chickens, {} eggs, {} foxes killed, \
             cash {}, wood {}",
            board.chickens().count(),
            board.eggs(),
            board.killed_foxes(),
            board.cash(),
            board.wood(),
        );

        if board.chickens().next().is_none() {
            println!("The foxes got every chicken.");
            break;
        }
    }

    if let Some(path) = &args.save {
        let text = board.save()?;
        fs::write(path, text)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("saved to {}", path.display());
    }

    Ok(())
}

fn new_farm(settings: Settings, seed: u64) -> anyhow::Result<Gameboard> {
    let mut board = Gameboard::from_ascii(FARM, settings, seed)?;

    let henhouse = board.add_building(BuildingKind::Henhouse, pos(4, 3))?;
    let tower = board.add_building(BuildingKind::Guardtower, pos(11, 3))?;
    board.add_building(BuildingKind::Hendominium, pos(8, 5))?;

    for x in 3..7 {
        let id = board.add_chicken(pos(x, 6))?;
        board.house_chicken(id, henhouse)?;
    }
    for x in 11..13 {
        let id = board.add_chicken(pos(x, 6))?;
        board.house_chicken(id, tower)?;
        board.equip(id, ItemKind::Rifle)?;
        board.equip(id, ItemKind::Helmet)?;
    }

    let guard = board.add_chicken(pos(7, 4))?;
    board.equip(guard, ItemKind::Knife)?;
    board.equip(guard, ItemKind::Kevlar)?;

    let woodcutter = board.add_chicken(pos(1, 1))?;
    board.equip(woodcutter, ItemKind::Axe)?;

    Ok(board)
}
