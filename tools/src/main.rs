//! session-runner: headless Fortune Fountain session on a simulated clock.
//!
//! Usage:
//!   session-runner --nickname alice --seconds 600 --seed 12345
//!   session-runner --nickname alice --save-dir /tmp/saves --data-dir ./data

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use fountain_core::{
    catalog::{ValuableCatalog, ValuableType},
    clock::{Clock, ManualClock, SystemClock},
    config::FountainConfig,
    error::FountainError,
    generation::{generated_of, GenerationEngine},
    session::{AutosaveSchedule, SaveSession},
    store::SaveStore,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::collections::BTreeMap;
use std::env;
use std::path::Path;

/// Chance per frame that the player grabs an item by hand.
const GRAB_CHANCE: f64 = 0.002;
/// Chance per frame that the player throws the hand.
const THROW_CHANCE: f64 = 0.003;
/// Chance per frame that the game is suspended for a while.
const IDLE_CHANCE: f64 = 0.001;

#[derive(serde::Serialize)]
struct RunSummary {
    nickname:          String,
    seed:              u64,
    simulated_seconds: i64,
    frames:            u64,
    generated:         BTreeMap<String, u64>,
    grabs:             u64,
    throws:            u64,
    karma:             f64,
    karma_in_hand:     f64,
    items_in_hand:     usize,
    saves_written:     u64,
    saves_throttled:   u64,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let seconds = parse_arg(&args, "--seconds", 600i64);
    let autosave_secs = parse_arg(&args, "--autosave-secs", 30i64);
    let nickname = str_arg(&args, "--nickname").unwrap_or("player");
    let data_dir = str_arg(&args, "--data-dir").unwrap_or("./data");

    let config_path = format!("{data_dir}/fountain.json");
    let mut config = if Path::new(&config_path).exists() {
        FountainConfig::load(&config_path)?
    } else {
        log::info!("runner: no {config_path}, using defaults");
        FountainConfig::default()
    };
    if let Some(save_dir) = str_arg(&args, "--save-dir") {
        config.save.save_dir = save_dir.to_string();
    }

    let catalog = if Path::new(&format!("{data_dir}/valuables.json")).exists() {
        ValuableCatalog::load(data_dir)?
    } else {
        ValuableCatalog::standard()
    };
    let valuable_types: Vec<ValuableType> = catalog.all_types().collect();

    println!("Fortune Fountain: session-runner");
    println!("  nickname:  {nickname}");
    println!("  seed:      {seed}");
    println!("  seconds:   {seconds}");
    println!("  save_dir:  {}", config.save.save_dir);
    println!("  data_dir:  {data_dir}");
    println!();

    let store = SaveStore::open(&config, catalog.clone())?;
    // A previous simulated run may have saved ahead of the wall clock.
    let mut start_at = SystemClock.now();
    if let Some(latest) = store.latest_save(nickname)? {
        let saved_at = i64::try_from(latest.stamp)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_micros);
        if let Some(saved_at) = saved_at {
            start_at = start_at.max(saved_at);
        }
    }
    let clock = ManualClock::new(start_at);
    let mut session = SaveSession::load_or_create(store, GenerationEngine::new(catalog.clone()), clock, nickname)?;

    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    let start = session.now();
    let end = start + TimeDelta::seconds(seconds);
    let mut autosave = AutosaveSchedule::new(TimeDelta::seconds(autosave_secs.max(1)), start);

    let mut summary = RunSummary {
        nickname: nickname.to_string(),
        seed,
        simulated_seconds: seconds,
        frames: 0,
        generated: BTreeMap::new(),
        grabs: 0,
        throws: 0,
        karma: 0.0,
        karma_in_hand: 0.0,
        items_in_hand: 0,
        saves_written: 0,
        saves_throttled: 0,
    };

    while session.now() < end {
        let frame = if rng.gen_bool(IDLE_CHANCE) {
            TimeDelta::seconds(rng.gen_range(5..120))
        } else {
            TimeDelta::milliseconds(rng.gen_range(16..250))
        };
        let now = session.clock().advance(frame).min(end);
        session.clock().set(now);
        summary.frames += 1;

        let events = session.check_generate()?;
        for valuable_type in &valuable_types {
            let amount = generated_of(&events, *valuable_type);
            if amount > 0 {
                *summary.generated.entry(valuable_type.name().to_string()).or_default() += amount;
            }
        }

        if !valuable_types.is_empty() && rng.gen_bool(GRAB_CHANCE) {
            let valuable_type = valuable_types[rng.gen_range(0..valuable_types.len())];
            session.grab(valuable_type)?;
            summary.grabs += 1;
        }
        if rng.gen_bool(THROW_CHANCE) {
            session.throw();
            summary.throws += 1;
        }

        if autosave.poll(now) > 0 {
            match session.save() {
                Ok(_) => summary.saves_written += 1,
                Err(FountainError::ReSaveThrottled { .. }) => summary.saves_throttled += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    session.save_now()?;
    summary.saves_written += 1;

    let data = session.data();
    summary.karma = data.karma();
    summary.karma_in_hand = data.hand().karma_in_hand();
    summary.items_in_hand = data.hand().len();

    println!("=== SESSION SUMMARY ===");
    for (valuable_type, count) in data.hand().valuable_type_counts() {
        let noun = &catalog.lookup(valuable_type)?.display_name;
        println!("  in hand: {count} {}", noun.for_count(count as u64));
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}
