//! Command, event and rejection definitions
//! These are the types exchanged between the engine and its collaborators

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::combat::BulletSide;
use crate::game::snapshot::WorldSnapshot;
use crate::game::world::{BuildingKind, Position};

/// Directional step for keyboard-style movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit offset in map coordinates (Y grows downwards)
    pub fn unit(self) -> (f32, f32) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }
}

/// Transactions offered from building menus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingAction {
    BuyHealth,
    BuyAmmo,
    Rob,
    FullTreatment,
    EmergencyTreatment,
    Surrender,
}

/// Discrete commands from the input collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Raw positional delta
    Move { dx: f32, dy: f32 },
    /// One configured step in a direction
    Step { direction: Direction },
    EnterVehicle { vehicle_id: String },
    ExitVehicle,
    /// Shoot from the player's position toward `target`
    Fire { target: Position },
    SelectWeapon { index: usize },
    InteractBuilding {
        building_id: String,
        action: BuildingAction,
    },
    /// Close the building dialog, cancelling any robbery in progress
    DismissDialog,
    StartMission { mission_id: String },
    TogglePause,
}

/// Who took damage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Target {
    Player,
    Npc(String),
}

/// Events emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    Damaged {
        target: Target,
        amount: f32,
    },
    MoneyChanged {
        delta: i64,
    },
    WantedLevelChanged {
        delta: i32,
    },
    MissionStarted {
        mission_id: String,
    },
    MissionCompleted {
        mission_id: String,
        reward: u64,
    },
    VehicleEntered {
        vehicle_id: String,
    },
    VehicleExited {
        vehicle_id: String,
    },
    /// Player health dropped to the critical threshold
    HealthCritical,
    ShotFired {
        bullet_id: Uuid,
        side: BulletSide,
        origin: Position,
        target: Position,
    },
    BulletResolved {
        bullet_id: Uuid,
        side: BulletSide,
        hits: u32,
    },
    NpcKilled {
        npc_id: String,
    },
    RobberyStarted {
        building_id: String,
    },
    RobberyProgress {
        building_id: String,
        progress: u8,
    },
    RobberyCancelled {
        building_id: String,
    },
    RobberyCompleted {
        building_id: String,
        payout: u64,
    },
    WeaponSelected {
        index: usize,
    },
    PauseToggled {
        paused: bool,
    },
}

/// Why a command was a no-op. State is untouched whenever one is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("game is paused")]
    Paused,

    #[error("command carries non-finite coordinates")]
    InvalidInput,

    #[error("unknown vehicle: {0}")]
    UnknownVehicle(String),

    #[error("vehicle {vehicle_id} is {distance:.1} units away")]
    VehicleOutOfRange { vehicle_id: String, distance: f32 },

    #[error("already driving {0}")]
    AlreadyInVehicle(String),

    #[error("no weapon equipped")]
    NoWeapon,

    #[error("weapon is out of ammo")]
    OutOfAmmo,

    #[error("weapon cooling down for {remaining_ms} ms")]
    RateLimited { remaining_ms: u64 },

    #[error("no weapon in slot {0}")]
    UnknownWeaponSlot(usize),

    #[error("unknown building: {0}")]
    UnknownBuilding(String),

    #[error("building {0} is not interactable")]
    BuildingClosed(String),

    #[error("building {0} is out of reach")]
    OutOfReach(String),

    #[error("{action:?} is not offered at a {kind:?}")]
    ActionNotOffered {
        action: BuildingAction,
        kind: BuildingKind,
    },

    #[error("costs {required}, have {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("precondition not met: {0}")]
    PreconditionFailed(&'static str),

    #[error("a robbery is in progress")]
    RobberyInProgress,

    #[error("unknown mission: {0}")]
    UnknownMission(String),

    #[error("mission {0} is already active")]
    MissionAlreadyActive(String),

    #[error("mission {0} is not pending")]
    MissionNotPending(String),
}

/// Result of a single command
pub type CommandOutcome = Result<Vec<GameEvent>, Rejection>;

/// Messages broadcast by a running session
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionMsg {
    /// Events produced by periodic tasks
    Events {
        game_time_ms: u64,
        events: Vec<GameEvent>,
    },
    /// Read-only view of the world (sent at regular intervals)
    Snapshot(WorldSnapshot),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_from_tagged_json() {
        let cmd: Command =
            serde_json::from_str(r#"{"type":"fire","target":{"x":10.0,"y":20.5}}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Fire {
                target: Position::new(10.0, 20.5)
            }
        );

        let cmd: Command = serde_json::from_str(
            r#"{"type":"interact_building","building_id":"bank","action":"rob"}"#,
        )
        .unwrap();
        assert!(matches!(
            cmd,
            Command::InteractBuilding {
                action: BuildingAction::Rob,
                ..
            }
        ));
    }

    #[test]
    fn damage_event_names_its_target() {
        let event = GameEvent::Damaged {
            target: Target::Npc("gang1".to_string()),
            amount: 25.0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "damaged");
        assert_eq!(json["target"]["kind"], "npc");
        assert_eq!(json["target"]["id"], "gang1");
    }
}
