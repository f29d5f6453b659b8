//! Coin Drop headless runner
//!
//! Plays one session with an autopilot in place of a touch screen and prints
//! every engine event to stdout as a JSON line.
//!
//! Usage: `coin-drop [classic|challenge|fun] [seconds]`
//!
//! Environment:
//! - `COIN_DROP_TUNING`: path to a tuning JSON file
//! - `COIN_DROP_SCORES`: path to a high score file (in-memory otherwise)
//! - `RUST_LOG`: log filter for env_logger (logs go to stderr)

use std::collections::HashMap;
use std::time::Duration;

use coin_drop::highscores::{HighScoreStore, HighScores};
use coin_drop::persistence::{JsonFileStore, SCORES_ENV_VAR};
use coin_drop::sim::{GameEvent, ItemFamily, ItemId, ItemKind, ModeVariant, SessionParams};
use coin_drop::{Tuning, spawn_session};

const TRACK_WIDTH: f32 = 1080.0;
const TRACK_HEIGHT: f32 = 1920.0;
const DEFAULT_SECONDS: u64 = 90;
/// How often the autopilot picks a new target
const STEER_INTERVAL_MS: u64 = 50;

/// Last known box of a live item, rebuilt from events
#[derive(Debug, Clone, Copy)]
struct Tracked {
    kind: ItemKind,
    x: f32,
    y: f32,
    size: f32,
}

/// Chase the lowest collectible, step aside from hazards about to land
#[derive(Debug, Default)]
struct Autopilot {
    items: HashMap<ItemId, Tracked>,
    actor_x: f32,
}

impl Autopilot {
    fn observe(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::ItemSpawned {
                id, kind, x, y, width, ..
            } => {
                self.items.insert(
                    id,
                    Tracked {
                        kind,
                        x,
                        y,
                        size: width,
                    },
                );
            }
            GameEvent::ItemMoved { id, x, y } => {
                if let Some(item) = self.items.get_mut(&id) {
                    item.x = x;
                    item.y = y;
                }
            }
            GameEvent::ItemResized { id, width, .. } => {
                if let Some(item) = self.items.get_mut(&id) {
                    item.size = width;
                }
            }
            GameEvent::ItemRemoved { id, .. } => {
                self.items.remove(&id);
            }
            GameEvent::ActorMoved { x } => self.actor_x = x,
            _ => {}
        }
    }

    /// Target x for the actor's left edge
    fn steer(&self, actor_width: f32) -> Option<f32> {
        let actor_center = self.actor_x + actor_width / 2.0;

        let danger = self.items.values().find(|item| {
            item.kind.family() == ItemFamily::Hazard
                && item.y > TRACK_HEIGHT * 0.5
                && (item.x + item.size / 2.0 - actor_center).abs() < actor_width
        });
        if let Some(hazard) = danger {
            let hazard_center = hazard.x + hazard.size / 2.0;
            let away = if hazard_center > TRACK_WIDTH / 2.0 {
                hazard.x - actor_width * 1.5
            } else {
                hazard.x + hazard.size + actor_width * 0.5
            };
            return Some(away);
        }

        self.items
            .values()
            .filter(|item| item.kind.family() != ItemFamily::Hazard)
            .max_by(|a, b| a.y.total_cmp(&b.y))
            .map(|target| target.x + target.size / 2.0 - actor_width / 2.0)
    }
}

fn parse_args() -> (ModeVariant, u64) {
    let mut args = std::env::args().skip(1);
    let mode = match args.next() {
        Some(arg) => ModeVariant::from_str(&arg).unwrap_or_else(|| {
            log::warn!("Unknown mode '{arg}', playing classic");
            ModeVariant::Classic
        }),
        None => ModeVariant::Classic,
    };
    let seconds = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_SECONDS);
    (mode, seconds)
}

fn open_store() -> Box<dyn HighScoreStore + Send> {
    match std::env::var_os(SCORES_ENV_VAR) {
        Some(path) => match JsonFileStore::open(path) {
            Ok(store) => {
                log::info!("High scores: {}", store.path().display());
                Box::new(store)
            }
            Err(err) => {
                log::warn!("{err}; keeping high scores in memory");
                Box::new(HighScores::new())
            }
        },
        None => Box::new(HighScores::new()),
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let (mode, seconds) = parse_args();
    let tuning = Tuning::from_env();
    let actor_width = tuning.actor_width;
    log::info!("Coin Drop starting: mode={}, limit={}s", mode.as_str(), seconds);

    let mut handle = match spawn_session(
        SessionParams::new(mode, TRACK_WIDTH, TRACK_HEIGHT),
        tuning,
        open_store(),
    ) {
        Ok(handle) => handle,
        Err(err) => {
            log::error!("Cannot start session: {err}");
            std::process::exit(1);
        }
    };

    let mut autopilot = Autopilot::default();
    let mut steer = tokio::time::interval(Duration::from_millis(STEER_INTERVAL_MS));
    let limit = tokio::time::sleep(Duration::from_secs(seconds));
    tokio::pin!(limit);
    let mut stopping = false;

    loop {
        tokio::select! {
            event = handle.next_event() => {
                let Some(event) = event else { break };
                autopilot.observe(&event);
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(err) => log::error!("Failed to encode event: {err}"),
                }
            }
            _ = steer.tick() => {
                if let Some(x) = autopilot.steer(actor_width) {
                    handle.move_actor(x);
                }
            }
            _ = &mut limit, if !stopping => {
                stopping = true;
                log::info!("Time limit reached, shutting down");
                handle.shutdown();
            }
        }
    }

    match handle.join().await {
        Some(result) => log::info!(
            "Final score {} (best {})",
            result.final_score,
            result.highest_score
        ),
        None => log::info!("Session stopped"),
    }
}
