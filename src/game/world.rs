//! Authoritative world state and its entity types
//!
//! Every mutation of bounded quantities (health, wanted level, money, ammo)
//! goes through a helper here that clamps at the mutation site and reports
//! the delta that was actually applied.

use serde::{Deserialize, Serialize};

/// Map extent along X
pub const MAP_WIDTH: f32 = 800.0;
/// Map extent along Y
pub const MAP_HEIGHT: f32 = 600.0;
/// Health ceiling for every actor
pub const MAX_HEALTH: f32 = 100.0;
/// Health at or below which the player is critical
pub const CRITICAL_HEALTH: f32 = 20.0;
/// Wanted level ceiling (stars)
pub const MAX_WANTED_LEVEL: u8 = 5;

/// A point on the map
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Clamp into the playable map
    pub fn clamped_to_map(self) -> Self {
        Self {
            x: self.x.clamp(0.0, MAP_WIDTH),
            y: self.y.clamp(0.0, MAP_HEIGHT),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

fn clamp_health(health: f32) -> f32 {
    health.clamp(0.0, MAX_HEALTH)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleKind {
    Car,
    Motorcycle,
    Truck,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub kind: VehicleKind,
    pub position: Position,
    /// Speed rating from the catalog
    pub speed: f32,
    pub health: f32,
    /// Cosmetic only
    pub color: String,
}

/// Remaining ammunition for a weapon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rounds", rename_all = "snake_case")]
pub enum Ammo {
    Unlimited,
    Rounds(u32),
}

impl Ammo {
    pub fn is_empty(&self) -> bool {
        matches!(self, Ammo::Rounds(0))
    }

    /// Spend one round. Returns false if nothing was left to spend.
    pub fn consume(&mut self) -> bool {
        match self {
            Ammo::Unlimited => true,
            Ammo::Rounds(0) => false,
            Ammo::Rounds(n) => {
                *n -= 1;
                true
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weapon {
    pub id: String,
    pub name: String,
    pub ammo: Ammo,
    /// Rounds restored by a refill (ignored for unlimited weapons)
    pub capacity: u32,
    pub damage: f32,
    /// Distance a fired bullet covers per physics tick
    pub projectile_speed: f32,
}

impl Weapon {
    pub fn refill(&mut self) {
        if let Ammo::Rounds(_) = self.ammo {
            self.ammo = Ammo::Rounds(self.capacity);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub position: Position,
    pub health: f32,
    pub money: u64,
    pub wanted_level: u8,
    pub weapons: Vec<Weapon>,
    pub current_weapon: usize,
    /// Id of the vehicle the player is driving
    pub vehicle: Option<String>,
    /// Set the first time the player gets into any vehicle
    pub has_entered_vehicle: bool,
}

impl Player {
    pub fn is_critical(&self) -> bool {
        self.health <= CRITICAL_HEALTH
    }

    pub fn weapon(&self) -> Option<&Weapon> {
        self.weapons.get(self.current_weapon)
    }

    pub fn weapon_mut(&mut self) -> Option<&mut Weapon> {
        self.weapons.get_mut(self.current_weapon)
    }

    /// Apply a health change, returning the change actually applied
    pub fn change_health(&mut self, delta: f32) -> f32 {
        let before = self.health;
        self.health = clamp_health(self.health + delta);
        self.health - before
    }

    /// Apply a wanted level change, returning the change actually applied
    pub fn change_wanted_level(&mut self, delta: i32) -> i32 {
        let before = i32::from(self.wanted_level);
        let after = before.saturating_add(delta).clamp(0, i32::from(MAX_WANTED_LEVEL));
        self.wanted_level = u8::try_from(after).unwrap_or(MAX_WANTED_LEVEL);
        after - before
    }

    pub fn credit(&mut self, amount: u64) -> i64 {
        self.money = self.money.saturating_add(amount);
        i64::try_from(amount).unwrap_or(i64::MAX)
    }

    /// Take up to `amount`, never going below zero. Returns the (negative) delta.
    pub fn debit(&mut self, amount: u64) -> i64 {
        let taken = amount.min(self.money);
        self.money -= taken;
        -i64::try_from(taken).unwrap_or(i64::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcKind {
    Civilian,
    Police,
    Gang,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    pub id: String,
    pub kind: NpcKind,
    pub position: Position,
    pub health: f32,
}

impl Npc {
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Apply damage, returning the health actually removed
    pub fn take_damage(&mut self, damage: f32) -> f32 {
        let before = self.health;
        self.health = clamp_health(self.health - damage);
        before - self.health
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Store,
    Bank,
    Hospital,
    PoliceStation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub id: String,
    pub kind: BuildingKind,
    /// Top-left corner
    pub position: Position,
    pub width: f32,
    pub height: f32,
    pub name: String,
    pub interactable: bool,
}

impl Building {
    pub fn center(&self) -> Position {
        Position::new(
            self.position.x + self.width / 2.0,
            self.position.y + self.height / 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Pending,
    Active,
    Completed,
}

/// Completion predicate attached to a mission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissionGoal {
    /// Wander away from spawn and get into a vehicle
    Tutorial { spawn: Position, min_offset: f32 },
    /// Reach the store; completion follows after a fixed delay
    Robbery {
        store: Position,
        radius: f32,
        delay_ms: u64,
    },
    /// Take down a number of NPCs of one kind
    Elimination { target: NpcKind, required: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub title: String,
    pub description: String,
    pub reward: u64,
    pub objectives: Vec<String>,
    pub goal: MissionGoal,
    pub status: MissionStatus,
}

impl Mission {
    pub fn is_active(&self) -> bool {
        self.status == MissionStatus::Active
    }

    pub fn is_completed(&self) -> bool {
        self.status == MissionStatus::Completed
    }
}

/// The single authoritative record of the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    pub player: Player,
    pub vehicles: Vec<Vehicle>,
    pub npcs: Vec<Npc>,
    pub buildings: Vec<Building>,
    pub missions: Vec<Mission>,
    /// Whole seconds of unpaused play
    pub game_time_secs: u64,
    pub paused: bool,
}

impl WorldState {
    pub fn vehicle(&self, id: &str) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn vehicle_mut(&mut self, id: &str) -> Option<&mut Vehicle> {
        self.vehicles.iter_mut().find(|v| v.id == id)
    }

    pub fn building(&self, id: &str) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == id)
    }

    pub fn mission(&self, id: &str) -> Option<&Mission> {
        self.missions.iter().find(|m| m.id == id)
    }

    pub fn mission_mut(&mut self, id: &str) -> Option<&mut Mission> {
        self.missions.iter_mut().find(|m| m.id == id)
    }

    pub fn active_mission(&self) -> Option<&Mission> {
        self.missions.iter().find(|m| m.is_active())
    }

    /// Living NPCs of one kind
    pub fn alive_npcs(&self, kind: NpcKind) -> impl Iterator<Item = &Npc> {
        self.npcs
            .iter()
            .filter(move |npc| npc.kind == kind && npc.is_alive())
    }
}
