//! Mission state machine: Pending -> Active -> Completed
//!
//! At most one mission is active. The tracker polls the active mission's goal
//! against the world and reports completion; crediting the reward is left to
//! the caller.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::session::protocol::{CommandOutcome, GameEvent, Rejection};

use super::clock::{Clock, Task};
use super::physics::is_inside;
use super::world::{MissionGoal, MissionStatus, WorldState};

/// Tutorial level reached once both objectives hold
pub const TUTORIAL_COMPLETE_LEVEL: u32 = 3;

#[derive(Debug, Default)]
pub struct MissionTracker {
    /// Progress level per mission id
    progress: HashMap<String, u32>,
    /// Mission whose delayed completion is on the clock
    deadline_for: Option<String>,
}

impl MissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self, mission_id: &str) -> u32 {
        self.progress.get(mission_id).copied().unwrap_or(0)
    }

    /// Activate a pending mission, provided nothing else is active
    pub fn start(&mut self, world: &mut WorldState, mission_id: &str) -> CommandOutcome {
        if let Some(active) = world.active_mission() {
            return Err(Rejection::MissionAlreadyActive(active.id.clone()));
        }

        let mission = world
            .mission_mut(mission_id)
            .ok_or_else(|| Rejection::UnknownMission(mission_id.to_string()))?;
        if mission.status != MissionStatus::Pending {
            return Err(Rejection::MissionNotPending(mission_id.to_string()));
        }
        mission.status = MissionStatus::Active;
        self.progress.insert(mission_id.to_string(), 0);

        info!(mission_id, "Mission started");
        Ok(vec![GameEvent::MissionStarted {
            mission_id: mission_id.to_string(),
        }])
    }

    /// Check the active mission's goal against the current world
    pub fn evaluate(&mut self, world: &mut WorldState, clock: &mut Clock) -> Vec<GameEvent> {
        let Some(mission) = world.active_mission() else {
            return Vec::new();
        };
        let mission_id = mission.id.clone();
        let goal = mission.goal.clone();

        match goal {
            MissionGoal::Tutorial { spawn, min_offset } => {
                let pos = world.player.position;
                let moved = (pos.x - spawn.x).abs() > min_offset || (pos.y - spawn.y).abs() > min_offset;
                let drove = world.player.has_entered_vehicle;

                let level = match (moved, drove) {
                    (true, true) => TUTORIAL_COMPLETE_LEVEL,
                    (false, true) => 2,
                    (true, false) => 1,
                    (false, false) => 0,
                };
                self.set_progress(&mission_id, level);

                if level >= TUTORIAL_COMPLETE_LEVEL {
                    return self.complete(world, &mission_id).into_iter().collect();
                }
            }
            MissionGoal::Robbery {
                store,
                radius,
                delay_ms,
            } => {
                let scheduled = self.deadline_for.as_deref() == Some(mission_id.as_str());
                if !scheduled && is_inside(world.player.position, store, radius) {
                    // Completion is not revoked if the player walks off before the delay elapses
                    self.set_progress(&mission_id, 1);
                    self.deadline_for = Some(mission_id.clone());
                    clock.start_once(Task::MissionDeadline, delay_ms);
                    info!(mission_id = %mission_id, delay_ms, "Robbery mission underway");
                }
            }
            MissionGoal::Elimination { target, required } => {
                // Dead NPCs stay in the world, so the full roster is the initial count
                let roster = count_u32(world.npcs.iter().filter(|n| n.kind == target).count());
                let alive = count_u32(world.alive_npcs(target).count());
                let eliminated = roster.saturating_sub(alive);
                self.set_progress(&mission_id, eliminated);

                if eliminated >= required {
                    return self.complete(world, &mission_id).into_iter().collect();
                }
            }
        }

        Vec::new()
    }

    /// The scheduled completion delay has elapsed
    pub fn on_deadline(&mut self, world: &mut WorldState) -> Vec<GameEvent> {
        let Some(mission_id) = self.deadline_for.take() else {
            return Vec::new();
        };
        let still_active = world.mission(&mission_id).is_some_and(|m| m.is_active());
        if !still_active {
            debug!(mission_id = %mission_id, "Deadline fired for inactive mission");
            return Vec::new();
        }
        self.complete(world, &mission_id).into_iter().collect()
    }

    fn set_progress(&mut self, mission_id: &str, level: u32) {
        let previous = self.progress.insert(mission_id.to_string(), level);
        if previous != Some(level) {
            debug!(mission_id, level, "Mission progress");
        }
    }

    fn complete(&mut self, world: &mut WorldState, mission_id: &str) -> Option<GameEvent> {
        let mission = world.mission_mut(mission_id)?;
        mission.status = MissionStatus::Completed;
        let reward = mission.reward;

        info!(mission_id, reward, "Mission completed");
        Some(GameEvent::MissionCompleted {
            mission_id: mission_id.to_string(),
            reward,
        })
    }
}

fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::scenario::{Scenario, ELIMINATION_MISSION, ROBBERY_MISSION, TUTORIAL_MISSION};
    use crate::game::world::{NpcKind, Position};

    fn idle_world() -> WorldState {
        let mut world = Scenario::downtown().world;
        for mission in &mut world.missions {
            mission.status = MissionStatus::Pending;
        }
        world
    }

    #[test]
    fn only_one_mission_may_be_active() {
        let mut world = idle_world();
        let mut tracker = MissionTracker::new();

        tracker.start(&mut world, ROBBERY_MISSION).unwrap();
        assert_eq!(
            tracker.start(&mut world, ELIMINATION_MISSION),
            Err(Rejection::MissionAlreadyActive(ROBBERY_MISSION.to_string()))
        );
        assert_eq!(world.missions.iter().filter(|m| m.is_active()).count(), 1);
    }

    #[test]
    fn unknown_and_completed_missions_cannot_start() {
        let mut world = idle_world();
        let mut tracker = MissionTracker::new();

        assert!(matches!(
            tracker.start(&mut world, "nope"),
            Err(Rejection::UnknownMission(_))
        ));

        world.mission_mut(TUTORIAL_MISSION).unwrap().status = MissionStatus::Completed;
        assert_eq!(
            tracker.start(&mut world, TUTORIAL_MISSION),
            Err(Rejection::MissionNotPending(TUTORIAL_MISSION.to_string()))
        );
    }

    #[test]
    fn tutorial_levels_follow_objectives() {
        let mut world = Scenario::downtown().world;
        let mut clock = Clock::new();
        let mut tracker = MissionTracker::new();
        let spawn = world.player.position;

        assert!(tracker.evaluate(&mut world, &mut clock).is_empty());
        assert_eq!(tracker.progress(TUTORIAL_MISSION), 0);

        world.player.position = Position::new(spawn.x, spawn.y + 51.0);
        tracker.evaluate(&mut world, &mut clock);
        assert_eq!(tracker.progress(TUTORIAL_MISSION), 1);

        world.player.position = spawn;
        world.player.has_entered_vehicle = true;
        tracker.evaluate(&mut world, &mut clock);
        assert_eq!(tracker.progress(TUTORIAL_MISSION), 2);

        world.player.position = Position::new(spawn.x - 60.0, spawn.y);
        let events = tracker.evaluate(&mut world, &mut clock);
        assert_eq!(
            events,
            vec![GameEvent::MissionCompleted {
                mission_id: TUTORIAL_MISSION.to_string(),
                reward: 500,
            }]
        );
        assert!(world.mission(TUTORIAL_MISSION).unwrap().is_completed());
        assert!(world.active_mission().is_none());
    }

    #[test]
    fn robbery_mission_completes_after_delay_even_if_player_leaves() {
        let mut world = idle_world();
        let mut clock = Clock::new();
        let mut tracker = MissionTracker::new();
        tracker.start(&mut world, ROBBERY_MISSION).unwrap();

        world.player.position = Position::new(110.0, 110.0);
        assert!(tracker.evaluate(&mut world, &mut clock).is_empty());
        assert_eq!(tracker.progress(ROBBERY_MISSION), 1);
        assert_eq!(clock.due_in(Task::MissionDeadline), Some(3000));

        // Lingering does not push the deadline back
        clock.settle(1000);
        tracker.evaluate(&mut world, &mut clock);
        assert_eq!(clock.due_in(Task::MissionDeadline), Some(2000));

        world.player.position = Position::new(700.0, 500.0);
        assert_eq!(clock.pop_due(5000), Some(Task::MissionDeadline));
        let events = tracker.on_deadline(&mut world);
        assert!(matches!(events.as_slice(), [GameEvent::MissionCompleted { reward: 1000, .. }]));
    }

    #[test]
    fn elimination_counts_every_fallen_target() {
        let mut world = idle_world();
        let mut clock = Clock::new();
        let mut tracker = MissionTracker::new();
        tracker.start(&mut world, ELIMINATION_MISSION).unwrap();

        let gang: Vec<usize> = world
            .npcs
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == NpcKind::Gang)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(gang.len(), 3);

        for (killed, &idx) in gang.iter().enumerate() {
            assert!(tracker.evaluate(&mut world, &mut clock).is_empty());
            assert_eq!(tracker.progress(ELIMINATION_MISSION), killed as u32);
            world.npcs[idx].health = 0.0;
        }

        let events = tracker.evaluate(&mut world, &mut clock);
        assert!(matches!(events.as_slice(), [GameEvent::MissionCompleted { .. }]));
    }

    #[test]
    fn kills_before_the_mission_still_count() {
        let mut world = idle_world();
        let mut clock = Clock::new();
        let mut tracker = MissionTracker::new();

        let mut gang = world.npcs.iter_mut().filter(|n| n.kind == NpcKind::Gang);
        if let Some(first) = gang.next() {
            first.health = 0.0;
        }

        tracker.start(&mut world, ELIMINATION_MISSION).unwrap();
        assert!(tracker.evaluate(&mut world, &mut clock).is_empty());
        assert_eq!(tracker.progress(ELIMINATION_MISSION), 1);

        for npc in world.npcs.iter_mut().filter(|n| n.kind == NpcKind::Gang) {
            npc.health = 0.0;
        }
        let events = tracker.evaluate(&mut world, &mut clock);
        assert_eq!(
            events,
            vec![GameEvent::MissionCompleted {
                mission_id: ELIMINATION_MISSION.to_string(),
                reward: 2000,
            }]
        );
        assert_eq!(tracker.progress(ELIMINATION_MISSION), 3);
    }
}
