//! Hostile NPC decisions driven by the player's wanted level

use tracing::debug;

use crate::session::protocol::GameEvent;
use crate::util::random::RandomSource;

use super::combat::CombatEngine;
use super::physics::is_inside;
use super::world::{NpcKind, WorldState};

/// How one hostile faction reacts to heat
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreatProfile {
    pub kind: NpcKind,
    /// Lowest wanted level at which this faction engages
    pub min_wanted_level: u8,
    /// Engagement range around the player
    pub range: f32,
    /// Chance that an NPC in range fires on a given AI tick
    pub fire_chance: f64,
    pub bullet_speed: f32,
    pub bullet_damage: f32,
}

impl ThreatProfile {
    pub fn police() -> Self {
        Self {
            kind: NpcKind::Police,
            min_wanted_level: 1,
            range: 150.0,
            fire_chance: 0.3,
            bullet_speed: 8.0,
            bullet_damage: 15.0,
        }
    }

    pub fn gang() -> Self {
        Self {
            kind: NpcKind::Gang,
            min_wanted_level: 3,
            range: 120.0,
            fire_chance: 0.2,
            bullet_speed: 6.0,
            bullet_damage: 20.0,
        }
    }
}

/// Evaluates every hostile faction once per AI tick
#[derive(Debug, Clone)]
pub struct ThreatAi {
    profiles: Vec<ThreatProfile>,
}

impl Default for ThreatAi {
    fn default() -> Self {
        Self::new(vec![ThreatProfile::police(), ThreatProfile::gang()])
    }
}

impl ThreatAi {
    pub fn new(profiles: Vec<ThreatProfile>) -> Self {
        Self { profiles }
    }

    /// Run one decision cycle. Every living NPC in range rolls independently;
    /// each success queues a hostile bullet aimed at the player's current spot.
    pub fn decide<R: RandomSource>(
        &self,
        world: &WorldState,
        combat: &mut CombatEngine,
        rng: &mut R,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let player = world.player.position;
        let wanted = world.player.wanted_level;

        for profile in &self.profiles {
            if wanted < profile.min_wanted_level {
                continue;
            }

            for npc in world.alive_npcs(profile.kind) {
                if !is_inside(npc.position, player, profile.range) {
                    continue;
                }
                if !rng.chance(profile.fire_chance) {
                    continue;
                }

                debug!(npc_id = %npc.id, kind = ?npc.kind, wanted, "Hostile NPC opens fire");
                events.push(combat.fire_hostile(
                    npc.position,
                    player,
                    profile.bullet_speed,
                    profile.bullet_damage,
                ));
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::world::{Npc, Position};
    use crate::util::random::ScriptedRandom;

    fn world_with(npcs: Vec<(NpcKind, f32)>, wanted: u8) -> WorldState {
        let mut world = crate::game::scenario::Scenario::downtown().world;
        let player = world.player.position;
        world.player.wanted_level = wanted;
        world.npcs = npcs
            .into_iter()
            .enumerate()
            .map(|(i, (kind, offset))| Npc {
                id: format!("npc{i}"),
                kind,
                position: Position::new(player.x + offset, player.y),
                health: 100.0,
            })
            .collect();
        world
    }

    #[test]
    fn police_hold_fire_without_heat() {
        let world = world_with(vec![(NpcKind::Police, 10.0), (NpcKind::Police, 20.0)], 0);
        let mut combat = CombatEngine::new();
        let mut rng = ScriptedRandom::constant(0.0);

        for _ in 0..50 {
            assert!(ThreatAi::default().decide(&world, &mut combat, &mut rng).is_empty());
        }
        assert!(combat.bullets().is_empty());
    }

    #[test]
    fn police_fire_when_roll_succeeds_and_in_range() {
        let world = world_with(vec![(NpcKind::Police, 100.0), (NpcKind::Police, 200.0)], 1);
        let mut combat = CombatEngine::new();
        let mut rng = ScriptedRandom::constant(0.29);

        let events = ThreatAi::default().decide(&world, &mut combat, &mut rng);
        assert_eq!(events.len(), 1);
        let bullet = &combat.bullets()[0];
        assert_eq!(bullet.damage, 15.0);
        assert_eq!(bullet.speed, 8.0);
        assert_eq!(bullet.target, world.player.position);
    }

    #[test]
    fn failed_roll_means_no_shot() {
        let world = world_with(vec![(NpcKind::Police, 10.0)], 5);
        let mut combat = CombatEngine::new();
        let mut rng = ScriptedRandom::constant(0.3);

        assert!(ThreatAi::default().decide(&world, &mut combat, &mut rng).is_empty());
    }

    #[test]
    fn gangs_join_in_at_three_stars() {
        let mut combat = CombatEngine::new();
        let mut rng = ScriptedRandom::constant(0.0);

        let calm = world_with(vec![(NpcKind::Gang, 50.0)], 2);
        assert!(ThreatAi::default().decide(&calm, &mut combat, &mut rng).is_empty());

        let hot = world_with(vec![(NpcKind::Gang, 50.0), (NpcKind::Gang, 130.0)], 3);
        let events = ThreatAi::default().decide(&hot, &mut combat, &mut rng);
        assert_eq!(events.len(), 1);
        assert_eq!(combat.bullets()[0].damage, 20.0);
        assert_eq!(combat.bullets()[0].speed, 6.0);
    }

    #[test]
    fn each_npc_rolls_independently() {
        let world = world_with(
            vec![(NpcKind::Police, 10.0), (NpcKind::Police, 20.0), (NpcKind::Police, 30.0)],
            2,
        );
        let mut combat = CombatEngine::new();
        let mut rng = ScriptedRandom::new([0.1, 0.9, 0.2], 1.0);

        let events = ThreatAi::default().decide(&world, &mut combat, &mut rng);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn dead_and_civilian_npcs_never_fire() {
        let mut world = world_with(vec![(NpcKind::Police, 10.0), (NpcKind::Civilian, 10.0)], 5);
        world.npcs[0].health = 0.0;
        let mut combat = CombatEngine::new();
        let mut rng = ScriptedRandom::constant(0.0);

        assert!(ThreatAi::default().decide(&world, &mut combat, &mut rng).is_empty());
    }
}
