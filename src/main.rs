//! Crowd Runner entry point
//!
//! Runs one headless game on autopilot and prints a summary.
//!
//! Usage: `crowd-runner [--seed N] [--seconds S] [--settings PATH]`

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use crowd_runner::sim::{GameEvent, GameManager, TickInput};
use crowd_runner::{GamePhase, Settings};

const FRAME_DT: f32 = 1.0 / 60.0;

#[derive(Parser, Debug)]
#[command(name = "crowd-runner")]
#[command(about = "Headless crowd runner driven by the autopilot")]
struct Args {
    /// Run seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Seconds of play to simulate at 60 fps
    #[arg(long, default_value_t = 180.0)]
    seconds: f32,
    /// Settings JSON file (defaults apply when omitted)
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn main() -> ExitCode {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };

    log::info!("Crowd Runner (headless) starting, seed {}", args.seed);
    let mut game = GameManager::new(settings, args.seed);
    game.start_new_game();

    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    let frames = (args.seconds / FRAME_DT).ceil() as u32;
    let mut gates = 0u32;
    let mut hits = 0u32;
    let mut crits = 0u32;
    let mut world_events = Vec::new();

    for _ in 0..frames {
        game.tick(FRAME_DT, &input);
        for event in game.drain_events() {
            match event {
                GameEvent::GateCollected { .. } => gates += 1,
                GameEvent::EnemyContact { .. } => hits += 1,
                GameEvent::CriticalHit { .. } => crits += 1,
                GameEvent::WorldEventStarted { kind, .. } => world_events.push(kind),
                _ => {}
            }
        }
        if game.phase() == GamePhase::GameOver {
            break;
        }
    }

    let state = game.state();
    println!("phase:        {:?}", state.phase);
    println!("time:         {:.1}s", state.elapsed);
    println!("distance:     {:.0}", state.distance);
    println!("level:        {}", game.progression().level());
    println!("crowd:        {}", state.crowd);
    println!("score:        {}", state.score);
    println!("gates:        {gates}");
    println!("enemy hits:   {hits}");
    println!("crits:        {crits}");
    println!("best combo:   {}", game.combo().session_max());
    println!("near misses:  {}", game.near_miss().total());
    println!("world events: {world_events:?}");
    println!("trend:        {:?}", game.adaptive().trend());

    match game.snapshot_json() {
        Ok(json) => log::debug!("Final snapshot: {json}"),
        Err(e) => log::warn!("Snapshot failed: {e}"),
    }
    ExitCode::SUCCESS
}
