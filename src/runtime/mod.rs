//! Tokio runtime for one session
//!
//! One owner task holds the [`Session`] and is the only code that mutates it.
//! It runs the tick loop and applies [`Command`]s in arrival order. Each
//! active item family gets a producer task that asks the owner for a spawn
//! once per period. The owner publishes the current periods and phase on a
//! watch channel so producers pick up difficulty changes and pauses.
//!
//! ```text
//! producers --Spawn--> commands --> owner --GameEvent--> handle
//!     ^                              |
//!     +---------- schedule ----------+
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, sleep, sleep_until};

use crate::error::SettingsError;
use crate::highscores::HighScoreStore;
use crate::settings::Tuning;
use crate::sim::{
    GameEvent, ItemFamily, Session, SessionParams, SessionPhase, SessionResult, SessionSnapshot,
    SpawnOutcome, TickInput, apply_input, tick,
};

/// Requests handled by the owner task, in arrival order
#[derive(Debug)]
pub enum Command {
    Input(TickInput),
    Spawn(ItemFamily),
    Pause,
    Resume,
    TogglePause,
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

/// What producers need to know about the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    /// Spawn period per active family
    pub periods: BTreeMap<ItemFamily, u64>,
    pub paused: bool,
    pub ended: bool,
}

impl Schedule {
    fn of(session: &Session) -> Self {
        let periods = ItemFamily::ALL
            .iter()
            .filter_map(|&family| {
                session
                    .spawners()
                    .period_ms(family)
                    .map(|period| (family, period))
            })
            .collect();
        Self {
            periods,
            paused: session.phase() == SessionPhase::Paused,
            ended: session.phase() == SessionPhase::Ended,
        }
    }
}

/// Client side of a running session. Dropping it shuts the session down.
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedReceiver<GameEvent>,
    schedule: watch::Receiver<Schedule>,
    owner: Option<JoinHandle<Option<SessionResult>>>,
}

/// Start a session on the current tokio runtime
pub fn spawn_session(
    params: SessionParams,
    tuning: Tuning,
    store: Box<dyn HighScoreStore + Send>,
) -> Result<SessionHandle, SettingsError> {
    tuning.validate()?;
    let tick_interval = tuning.tick_interval();
    let pause_poll = tuning.pause_poll();
    let start = Instant::now();
    let session = Session::new(params, tuning, store, 0);

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (schedule_tx, schedule_rx) = watch::channel(Schedule::of(&session));

    let families: Vec<ItemFamily> = schedule_rx.borrow().periods.keys().copied().collect();
    let producers: Vec<JoinHandle<()>> = families
        .into_iter()
        .map(|family| {
            tokio::spawn(run_producer(
                family,
                command_tx.clone(),
                schedule_rx.clone(),
                pause_poll,
            ))
        })
        .collect();

    let owner = tokio::spawn(async move {
        let result = run_owner(
            session,
            start,
            tick_interval,
            command_rx,
            event_tx,
            &schedule_tx,
        )
        .await;
        // Producers exit once the schedule channel closes
        drop(schedule_tx);
        for producer in producers {
            if let Err(err) = producer.await {
                log::warn!("Producer task failed: {err}");
            }
        }
        result
    });

    Ok(SessionHandle {
        commands: command_tx,
        events: event_rx,
        schedule: schedule_rx,
        owner: Some(owner),
    })
}

impl SessionHandle {
    /// Drag the actor toward `x`
    pub fn move_actor(&self, x: f32) {
        self.send(Command::Input(TickInput {
            actor_target: Some(x),
            pause: false,
        }));
    }

    pub fn toggle_pause(&self) {
        self.send(Command::TogglePause);
    }

    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    pub fn resume(&self) {
        self.send(Command::Resume);
    }

    /// Stop the session without a result
    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    /// Current state, or None once the session has finished
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        let (reply, response) = oneshot::channel();
        self.commands.send(Command::Snapshot(reply)).ok()?;
        response.await.ok()
    }

    /// Last published schedule
    pub fn schedule(&self) -> Schedule {
        self.schedule.borrow().clone()
    }

    /// Next event; None after the session finished and every event was read
    pub async fn next_event(&mut self) -> Option<GameEvent> {
        self.events.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<GameEvent> {
        self.events.try_recv().ok()
    }

    /// Wait for the owner task. Returns the result if the session ended normally.
    pub async fn join(mut self) -> Option<SessionResult> {
        let owner = self.owner.take()?;
        match owner.await {
            Ok(result) => result,
            Err(err) => {
                log::error!("Session task failed: {err}");
                None
            }
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            log::debug!("Session already finished");
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        // Already joined: the owner has exited
        if self.owner.is_some() {
            let _ = self.commands.send(Command::Shutdown);
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

async fn run_owner(
    mut session: Session,
    start: Instant,
    tick_interval: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<GameEvent>,
    schedule: &watch::Sender<Schedule>,
) -> Option<SessionResult> {
    let mut ticker = interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let idle = TickInput::default();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Shutdown) | None => session.teardown(),
                Some(command) => handle_command(&mut session, command, elapsed_ms(start)),
            },
            _ = ticker.tick() => tick(&mut session, &idle, elapsed_ms(start)),
        }

        let mut listening = true;
        for event in session.drain_events() {
            listening &= events.send(event).is_ok();
        }
        if !listening {
            log::debug!("Event receiver gone, tearing session down");
            session.teardown();
        }

        let next = Schedule::of(&session);
        schedule.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });

        if session.state().is_ended() {
            break;
        }
    }

    session.result()
}

fn handle_command(session: &mut Session, command: Command, now: u64) {
    let outcome = match command {
        Command::Input(input) => {
            apply_input(session, &input, now);
            Ok(())
        }
        Command::Spawn(family) => {
            if let SpawnOutcome::Spawned(id) = session.spawn(family, now) {
                log::trace!("Spawned {} #{id}", family.as_str());
            }
            Ok(())
        }
        Command::Pause => session.pause(now),
        Command::Resume => session.resume(now),
        Command::TogglePause => session.toggle_pause(now),
        Command::Snapshot(reply) => {
            let _ = reply.send(session.snapshot(now));
            Ok(())
        }
        Command::Shutdown => {
            session.teardown();
            Ok(())
        }
    };
    if let Err(err) = outcome {
        log::debug!("Ignoring command: {err}");
    }
}

/// Fire `Spawn(family)` once per period while the session runs. The first
/// firing is immediate; after a pause the producer waits a full period.
async fn run_producer(
    family: ItemFamily,
    commands: mpsc::UnboundedSender<Command>,
    mut schedule: watch::Receiver<Schedule>,
    pause_poll: Duration,
) {
    let mut due = true;

    loop {
        let (period, paused) = {
            let current = schedule.borrow_and_update();
            if current.ended {
                break;
            }
            let Some(&period) = current.periods.get(&family) else {
                break;
            };
            (period, current.paused)
        };

        if paused {
            due = false;
            tokio::select! {
                _ = sleep(pause_poll) => {}
                changed = schedule.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
            continue;
        }

        if due && commands.send(Command::Spawn(family)).is_err() {
            break;
        }
        due = true;

        let deadline = Instant::now() + Duration::from_millis(period);
        loop {
            tokio::select! {
                _ = sleep_until(deadline) => break,
                changed = schedule.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    let stopped = {
                        let current = schedule.borrow_and_update();
                        current.paused || current.ended
                    };
                    if stopped {
                        due = false;
                        break;
                    }
                }
            }
        }
    }

    log::debug!("{} producer stopped", family.as_str());
}
