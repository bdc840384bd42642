//! Session actor: owns the engine and drives its clock
//!
//! One task owns the [`Engine`]; everything else talks to it through a
//! [`SessionHandle`]. Commands and ticks are processed one at a time on that
//! task, which is what serializes writes to the world.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::engine::Engine;
use crate::game::snapshot::{SnapshotBuilder, WorldSnapshot};
use crate::util::random::RandomSource;
use crate::util::time::{game_millis, physics_tick_duration};

use super::protocol::{Command, CommandOutcome, SessionMsg};

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session has shut down")]
    Closed,
}

enum Inbound {
    Command {
        command: Command,
        reply: oneshot::Sender<CommandOutcome>,
    },
    Snapshot {
        reply: oneshot::Sender<WorldSnapshot>,
    },
    Shutdown,
}

/// Handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub id: Uuid,
    inbound_tx: mpsc::Sender<Inbound>,
    msg_tx: broadcast::Sender<SessionMsg>,
}

impl SessionHandle {
    /// Submit a command and wait for its outcome
    pub async fn send(&self, command: Command) -> Result<CommandOutcome, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.inbound_tx
            .send(Inbound::Command { command, reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Take a snapshot of the current world
    pub async fn snapshot(&self) -> Result<WorldSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.inbound_tx
            .send(Inbound::Snapshot { reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Receive events and periodic snapshots
    pub fn subscribe(&self) -> broadcast::Receiver<SessionMsg> {
        self.msg_tx.subscribe()
    }

    /// Stop the session loop
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.inbound_tx
            .send(Inbound::Shutdown)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

/// A running game session
pub struct GameSession<R> {
    id: Uuid,
    engine: Engine<R>,
    inbound_rx: mpsc::Receiver<Inbound>,
    msg_tx: broadcast::Sender<SessionMsg>,
    snapshot_builder: SnapshotBuilder,
}

impl<R: RandomSource> GameSession<R> {
    /// Create a new session around an engine
    pub fn new(engine: Engine<R>, snapshot_interval_ticks: u32) -> (Self, SessionHandle) {
        let id = Uuid::new_v4();
        let (inbound_tx, inbound_rx) = mpsc::channel(256);
        let (msg_tx, _) = broadcast::channel(256);

        let handle = SessionHandle {
            id,
            inbound_tx,
            msg_tx: msg_tx.clone(),
        };

        let session = Self {
            id,
            engine,
            inbound_rx,
            msg_tx,
            snapshot_builder: SnapshotBuilder::new(snapshot_interval_ticks),
        };

        (session, handle)
    }

    /// Run the tick loop until shut down or every handle is dropped
    pub async fn run(mut self) {
        info!(session_id = %self.id, "Session started");

        let mut tick_interval = interval(physics_tick_duration());
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    let elapsed_ms = game_millis(last_tick.elapsed());
                    // Carry sub-millisecond remainders into the next tick
                    last_tick += Duration::from_millis(elapsed_ms);
                    self.run_tick(elapsed_ms);
                }
                inbound = self.inbound_rx.recv() => match inbound {
                    Some(Inbound::Command { command, reply }) => self.handle_command(command, reply),
                    Some(Inbound::Snapshot { reply }) => {
                        let _ = reply.send(self.engine.snapshot());
                    }
                    Some(Inbound::Shutdown) | None => break,
                },
            }
        }

        info!(
            session_id = %self.id,
            game_time_secs = self.engine.world().game_time_secs,
            "Session ended"
        );
    }

    fn run_tick(&mut self, elapsed_ms: u64) {
        let events = self.engine.advance(elapsed_ms);
        if !events.is_empty() {
            self.publish(SessionMsg::Events {
                game_time_ms: self.engine.now_ms(),
                events,
            });
        }

        if self.snapshot_builder.should_send() {
            self.publish(SessionMsg::Snapshot(self.engine.snapshot()));
        }
    }

    fn handle_command(&mut self, command: Command, reply: oneshot::Sender<CommandOutcome>) {
        let outcome = self.engine.handle(command);

        if let Ok(events) = &outcome {
            if !events.is_empty() {
                self.publish(SessionMsg::Events {
                    game_time_ms: self.engine.now_ms(),
                    events: events.clone(),
                });
            }
            self.snapshot_builder.force_next();
        }

        if reply.send(outcome).is_err() {
            warn!(session_id = %self.id, "Command issuer went away before the reply");
        }
    }

    fn publish(&self, msg: SessionMsg) {
        // No subscribers is fine; the session runs headless
        if self.msg_tx.send(msg).is_err() {
            debug!(session_id = %self.id, "No session subscribers");
        }
    }
}
