//! Read-only world snapshots for renderers

use serde::Serialize;

use super::combat::Bullet;
use super::economy::RobberyState;
use super::world::{Building, MissionStatus, Npc, Player, Vehicle, WorldState};

/// Mission as shown in the mission list
#[derive(Debug, Clone, Serialize)]
pub struct MissionSnapshot {
    pub id: String,
    pub title: String,
    pub description: String,
    pub reward: u64,
    pub objectives: Vec<String>,
    pub status: MissionStatus,
    pub progress: u32,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    /// Game time in milliseconds
    pub game_time_ms: u64,
    /// Whole seconds counted by the game clock
    pub game_time_secs: u64,
    pub paused: bool,
    pub player: Player,
    pub vehicles: Vec<Vehicle>,
    pub npcs: Vec<Npc>,
    pub buildings: Vec<Building>,
    pub missions: Vec<MissionSnapshot>,
    pub bullets: Vec<Bullet>,
    pub robbery: RobberyState,
    /// Closest building whose menu is available
    pub nearby_building: Option<String>,
}

impl WorldSnapshot {
    pub fn capture(
        world: &WorldState,
        game_time_ms: u64,
        bullets: &[Bullet],
        robbery: &RobberyState,
        nearby_building: Option<&Building>,
        progress: impl Fn(&str) -> u32,
    ) -> Self {
        let missions = world
            .missions
            .iter()
            .map(|m| MissionSnapshot {
                id: m.id.clone(),
                title: m.title.clone(),
                description: m.description.clone(),
                reward: m.reward,
                objectives: m.objectives.clone(),
                status: m.status,
                progress: progress(&m.id),
            })
            .collect();

        Self {
            game_time_ms,
            game_time_secs: world.game_time_secs,
            paused: world.paused,
            player: world.player.clone(),
            vehicles: world.vehicles.clone(),
            npcs: world.npcs.clone(),
            buildings: world.buildings.clone(),
            missions,
            bullets: bullets.to_vec(),
            robbery: robbery.clone(),
            nearby_building: nearby_building.map(|b| b.id.clone()),
        }
    }
}

/// Decides when the session publishes a snapshot
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (used after commands)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }
}
