//! Babel Tower entry point
//!
//! Runs a headless session with the built-in autopilot standing in for the
//! player, then reports the result against the stored records.
//!
//! Usage: `babel-tower [SEED] [--config FILE] [--records FILE] [--frames N]`

use std::path::PathBuf;
use std::sync::Arc;

use babel_tower::audio::{AudioManager, AudioSettings, LogAudioSink};
use babel_tower::consts::FRAME_MS;
use babel_tower::sim::{GameState, StageState, autopilot, tick};
use babel_tower::{GameConfig, Records};

/// Ten minutes of play at the nominal frame rate
const DEFAULT_FRAMES: u64 = 36_000;

struct Options {
    seed: u64,
    config: Option<PathBuf>,
    records: Option<PathBuf>,
    frames: u64,
}

impl Options {
    fn from_args() -> Self {
        let mut options = Options {
            seed: 0,
            config: None,
            records: None,
            frames: DEFAULT_FRAMES,
        };

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => options.config = args.next().map(PathBuf::from),
                "--records" => options.records = args.next().map(PathBuf::from),
                "--frames" => match args.next().map(|n| n.parse()) {
                    Some(Ok(n)) => options.frames = n,
                    _ => log::warn!("--frames needs a number; using {DEFAULT_FRAMES}"),
                },
                other => match other.parse() {
                    Ok(seed) => options.seed = seed,
                    Err(_) => log::warn!("Ignoring unknown argument '{other}'"),
                },
            }
        }
        options
    }
}

fn load_records(path: Option<&PathBuf>) -> Records {
    let Some(path) = path else {
        return Records::new();
    };
    match std::fs::read_to_string(path) {
        Ok(json) => Records::from_json_or_default(&json),
        Err(_) => {
            log::info!("No records at {}, starting fresh", path.display());
            Records::new()
        }
    }
}

fn save_records(path: Option<&PathBuf>, records: &Records) {
    let Some(path) = path else {
        return;
    };
    let written = records
        .to_json()
        .map_err(|e| e.to_string())
        .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
    match written {
        Ok(()) => log::info!("Records saved to {}", path.display()),
        Err(e) => log::warn!("Failed to save records: {e}"),
    }
}

fn main() {
    env_logger::init();
    let options = Options::from_args();
    log::info!("Babel Tower (headless) starting with seed {}", options.seed);

    let config = match &options.config {
        Some(path) => GameConfig::load_or_default(path),
        None => GameConfig::default(),
    };
    let mut state = GameState::with_config(options.seed, Arc::new(config));
    let mut audio = AudioManager::new(LogAudioSink, AudioSettings::default());

    let mut now = 0;
    for _ in 0..options.frames {
        now += FRAME_MS;
        let input = autopilot(&state);
        tick(&mut state, &input, now);

        let events = state.drain_events();
        audio.process(&events, &state.config.stages);

        if state.stage_state.is_finished() {
            break;
        }
    }

    let summary = state.summary();
    let outcome = match state.stage_state {
        StageState::GameWon => "won",
        StageState::GameOver => "lost",
        StageState::Playing | StageState::Clearing => "unfinished",
    };
    log::info!(
        "Run {outcome} after {:.1}s on stage {}",
        now as f64 / 1000.0,
        state.stage_manager.current_stage
    );
    println!(
        "score {} | max combo {} | tower {} | {outcome}",
        summary.score, summary.max_combo, summary.tower_height
    );

    let mut records = load_records(options.records.as_ref());
    if records.merge(&summary) {
        println!("New record!");
        save_records(options.records.as_ref(), &records);
    }
}
