//! The simulation engine: single owner of the world state
//!
//! Commands and clock ticks are the only ways into the world. Both run on
//! `&mut self`, so every write is serialized through this type.

use tracing::{debug, info};

use crate::config::MovementConfig;
use crate::session::protocol::{Command, CommandOutcome, GameEvent, Rejection};
use crate::util::random::{RandomSource, SeededRandom};
use crate::util::time::{AI_TICK_MS, GAME_CLOCK_TICK_MS, PHYSICS_TICK_MS};

use super::ai::ThreatAi;
use super::clock::{Clock, Task};
use super::combat::{Bullet, CombatEngine};
use super::economy::{EconomyInteractions, RobberyState};
use super::mission::MissionTracker;
use super::physics::MovementController;
use super::snapshot::WorldSnapshot;
use super::world::WorldState;

pub struct Engine<R = SeededRandom> {
    world: WorldState,
    clock: Clock,
    movement: MovementController,
    combat: CombatEngine,
    threat: ThreatAi,
    missions: MissionTracker,
    economy: EconomyInteractions,
    rng: R,
}

impl<R: RandomSource> Engine<R> {
    pub fn new(world: WorldState, movement: MovementConfig, rng: R) -> Self {
        let mut clock = Clock::new();
        clock.start_periodic(Task::Physics, PHYSICS_TICK_MS);
        clock.start_periodic(Task::GameClock, GAME_CLOCK_TICK_MS);
        clock.start_periodic(Task::Ai, AI_TICK_MS);

        Self {
            world,
            clock,
            movement: MovementController::new(movement),
            combat: CombatEngine::new(),
            threat: ThreatAi::default(),
            missions: MissionTracker::new(),
            economy: EconomyInteractions::new(),
            rng,
        }
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    /// Game time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn bullets(&self) -> &[Bullet] {
        self.combat.bullets()
    }

    pub fn robbery(&self) -> &RobberyState {
        self.economy.robbery()
    }

    pub fn mission_progress(&self, mission_id: &str) -> u32 {
        self.missions.progress(mission_id)
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(
            &self.world,
            self.clock.now_ms(),
            self.combat.bullets(),
            self.economy.robbery(),
            self.economy.nearby_building(&self.world),
            |id| self.missions.progress(id),
        )
    }

    /// Apply one command. `Err` means nothing changed.
    pub fn handle(&mut self, command: Command) -> CommandOutcome {
        let outcome = self.dispatch(command.clone());

        match outcome {
            Ok(mut events) => {
                if !self.world.paused {
                    events.extend(self.poll_missions());
                }
                Ok(events)
            }
            Err(reason) => {
                debug!(?command, %reason, "Command rejected");
                Err(reason)
            }
        }
    }

    fn dispatch(&mut self, command: Command) -> CommandOutcome {
        if self.world.paused && command != Command::TogglePause {
            return Err(Rejection::Paused);
        }

        match command {
            Command::Move { dx, dy } => self
                .movement
                .move_by(&mut self.world, dx, dy)
                .map(|_| Vec::new()),
            Command::Step { direction } => {
                let (dx, dy) = self.movement.step_delta(&self.world, direction);
                self.movement
                    .move_by(&mut self.world, dx, dy)
                    .map(|_| Vec::new())
            }
            Command::EnterVehicle { vehicle_id } => {
                self.movement.enter_vehicle(&mut self.world, &vehicle_id)
            }
            Command::ExitVehicle => self.movement.exit_vehicle(&mut self.world),
            Command::Fire { target } => {
                let origin = self.world.player.position;
                let now = self.clock.now_ms();
                let outcome = self.combat.fire(&mut self.world, origin, target, now);
                if outcome.is_ok() {
                    debug!(x = target.x, y = target.y, wanted = self.world.player.wanted_level, "Shot fired");
                }
                outcome
            }
            Command::SelectWeapon { index } => self.select_weapon(index),
            Command::InteractBuilding {
                building_id,
                action,
            } => self
                .economy
                .interact(&mut self.world, &mut self.clock, &building_id, action),
            Command::DismissDialog => self.economy.dismiss(&mut self.clock),
            Command::StartMission { mission_id } => self.missions.start(&mut self.world, &mission_id),
            Command::TogglePause => Ok(self.toggle_pause()),
        }
    }

    fn select_weapon(&mut self, index: usize) -> CommandOutcome {
        if index >= self.world.player.weapons.len() {
            return Err(Rejection::UnknownWeaponSlot(index));
        }
        self.world.player.current_weapon = index;
        Ok(vec![GameEvent::WeaponSelected { index }])
    }

    fn toggle_pause(&mut self) -> Vec<GameEvent> {
        self.world.paused = !self.world.paused;
        if !self.world.paused {
            // Schedules resume from a fresh interval, missed ticks are dropped
            self.clock.restart_intervals();
        }
        info!(paused = self.world.paused, game_time_ms = self.clock.now_ms(), "Pause toggled");
        vec![GameEvent::PauseToggled {
            paused: self.world.paused,
        }]
    }

    /// Advance game time, running every task that falls due. No-op while paused.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<GameEvent> {
        if self.world.paused {
            return Vec::new();
        }

        let deadline = self.clock.now_ms().saturating_add(elapsed_ms);
        let mut events = Vec::new();

        while let Some(task) = self.clock.pop_due(deadline) {
            match task {
                Task::Physics => {
                    events.extend(self.combat.advance(&mut self.world));
                    events.extend(self.poll_missions());
                }
                Task::Robbery => {
                    events.extend(self.economy.on_robbery_tick(
                        &mut self.world,
                        &mut self.clock,
                        &mut self.rng,
                    ));
                }
                Task::GameClock => {
                    self.world.game_time_secs += 1;
                }
                Task::Ai => {
                    events.extend(self.threat.decide(&self.world, &mut self.combat, &mut self.rng));
                }
                Task::MissionDeadline => {
                    let completed = self.missions.on_deadline(&mut self.world);
                    events.extend(self.pay_rewards(completed));
                }
            }
        }

        self.clock.settle(deadline);
        events
    }

    fn poll_missions(&mut self) -> Vec<GameEvent> {
        let completed = self.missions.evaluate(&mut self.world, &mut self.clock);
        self.pay_rewards(completed)
    }

    /// Credit rewards for completed missions, keeping the completion events
    fn pay_rewards(&mut self, events: Vec<GameEvent>) -> Vec<GameEvent> {
        let mut out = Vec::with_capacity(events.len() * 2);
        for event in events {
            let reward = match &event {
                GameEvent::MissionCompleted { reward, .. } => Some(*reward),
                _ => None,
            };
            out.push(event);
            if let Some(reward) = reward {
                let delta = self.world.player.credit(reward);
                out.push(GameEvent::MoneyChanged { delta });
            }
        }
        out
    }
}
