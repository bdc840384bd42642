//! Starting world for a new session

use super::world::{
    Ammo, Building, BuildingKind, Mission, MissionGoal, MissionStatus, Npc, NpcKind, Player,
    Position, Vehicle, VehicleKind, Weapon, WorldState, MAX_HEALTH,
};
use crate::util::time::ROBBERY_MISSION_DELAY_MS;

pub const TUTORIAL_MISSION: &str = "welcome";
pub const ROBBERY_MISSION: &str = "first_score";
pub const ELIMINATION_MISSION: &str = "turf_war";

pub const STORE: &str = "store_downtown";
pub const BANK: &str = "bank_central";
pub const HOSPITAL: &str = "hospital_general";
pub const POLICE_STATION: &str = "police_hq";

/// Player spawn point
pub const SPAWN: Position = Position::new(400.0, 300.0);

/// A named starting world
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub world: WorldState,
}

impl Scenario {
    /// The default city block: tutorial active, two more missions waiting
    pub fn downtown() -> Self {
        let player = Player {
            id: "player1".to_string(),
            position: SPAWN,
            health: MAX_HEALTH,
            money: 1000,
            wanted_level: 0,
            weapons: vec![
                Weapon {
                    id: "fists".to_string(),
                    name: "Fists".to_string(),
                    ammo: Ammo::Unlimited,
                    capacity: 0,
                    damage: 10.0,
                    projectile_speed: 10.0,
                },
                Weapon {
                    id: "pistol".to_string(),
                    name: "Pistol".to_string(),
                    ammo: Ammo::Rounds(50),
                    capacity: 50,
                    damage: 25.0,
                    projectile_speed: 10.0,
                },
            ],
            current_weapon: 0,
            vehicle: None,
            has_entered_vehicle: false,
        };

        let vehicles = vec![
            vehicle("car1", VehicleKind::Car, 350.0, 250.0, 5.0, 100.0, "#ff0000"),
            vehicle("car2", VehicleKind::Car, 500.0, 400.0, 4.0, 100.0, "#0000ff"),
            vehicle("bike1", VehicleKind::Motorcycle, 300.0, 350.0, 7.0, 60.0, "#000000"),
            vehicle("truck1", VehicleKind::Truck, 700.0, 200.0, 3.0, 100.0, "#888888"),
        ];

        let npcs = vec![
            npc("npc1", NpcKind::Civilian, 200.0, 200.0),
            npc("npc2", NpcKind::Civilian, 600.0, 300.0),
            npc("npc3", NpcKind::Civilian, 400.0, 500.0),
            npc("cop1", NpcKind::Police, 480.0, 300.0),
            npc("cop2", NpcKind::Police, 700.0, 520.0),
            npc("gang1", NpcKind::Gang, 150.0, 400.0),
            npc("gang2", NpcKind::Gang, 180.0, 430.0),
            npc("gang3", NpcKind::Gang, 220.0, 380.0),
        ];

        let buildings = vec![
            building(STORE, BuildingKind::Store, "24/7 Store", 80.0, 80.0, 40.0, 40.0),
            building(BANK, BuildingKind::Bank, "Central Bank", 600.0, 80.0, 60.0, 50.0),
            building(HOSPITAL, BuildingKind::Hospital, "General Hospital", 80.0, 450.0, 60.0, 60.0),
            building(POLICE_STATION, BuildingKind::PoliceStation, "Police HQ", 620.0, 450.0, 60.0, 60.0),
        ];

        let missions = vec![
            Mission {
                id: TUTORIAL_MISSION.to_string(),
                title: "Welcome to the City".to_string(),
                description: "Get familiar with the controls and explore the city.".to_string(),
                reward: 500,
                objectives: vec![
                    "Move around".to_string(),
                    "Find a vehicle".to_string(),
                    "Drive around the block".to_string(),
                ],
                goal: MissionGoal::Tutorial {
                    spawn: SPAWN,
                    min_offset: 50.0,
                },
                status: MissionStatus::Active,
            },
            Mission {
                id: ROBBERY_MISSION.to_string(),
                title: "First Score".to_string(),
                description: "Rob a convenience store to earn some quick cash.".to_string(),
                reward: 1000,
                objectives: vec![
                    "Find a convenience store".to_string(),
                    "Enter the store".to_string(),
                    "Escape the police".to_string(),
                ],
                goal: MissionGoal::Robbery {
                    store: Position::new(100.0, 100.0),
                    radius: 40.0,
                    delay_ms: ROBBERY_MISSION_DELAY_MS,
                },
                status: MissionStatus::Pending,
            },
            Mission {
                id: ELIMINATION_MISSION.to_string(),
                title: "Turf War".to_string(),
                description: "Clear the gang out of the west side.".to_string(),
                reward: 2000,
                objectives: vec!["Eliminate 3 gang members".to_string()],
                goal: MissionGoal::Elimination {
                    target: NpcKind::Gang,
                    required: 3,
                },
                status: MissionStatus::Pending,
            },
        ];

        Self {
            name: "downtown",
            world: WorldState {
                player,
                vehicles,
                npcs,
                buildings,
                missions,
                game_time_secs: 0,
                paused: false,
            },
        }
    }
}

fn vehicle(id: &str, kind: VehicleKind, x: f32, y: f32, speed: f32, health: f32, color: &str) -> Vehicle {
    Vehicle {
        id: id.to_string(),
        kind,
        position: Position::new(x, y),
        speed,
        health,
        color: color.to_string(),
    }
}

fn npc(id: &str, kind: NpcKind, x: f32, y: f32) -> Npc {
    Npc {
        id: id.to_string(),
        kind,
        position: Position::new(x, y),
        health: MAX_HEALTH,
    }
}

fn building(
    id: &str,
    kind: BuildingKind,
    name: &str,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) -> Building {
    Building {
        id: id.to_string(),
        kind,
        position: Position::new(x, y),
        width,
        height,
        name: name.to_string(),
        interactable: true,
    }
}
