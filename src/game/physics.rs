//! Player and vehicle movement

use tracing::{debug, info};

use crate::config::MovementConfig;
use crate::session::protocol::{CommandOutcome, Direction, GameEvent, Rejection};

use super::world::{Position, WorldState};

/// Maximum distance from which a vehicle can be entered
pub const ENTER_VEHICLE_RADIUS: f32 = 30.0;

/// Check if `point` lies inside the circle around `center` (edge inclusive)
pub fn is_within(point: Position, center: Position, radius: f32) -> bool {
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    dx * dx + dy * dy <= radius * radius
}

/// Check if `point` lies strictly inside the circle around `center`
pub fn is_inside(point: Position, center: Position, radius: f32) -> bool {
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    dx * dx + dy * dy < radius * radius
}

/// Applies movement and vehicle occupancy changes to the world
#[derive(Debug, Clone)]
pub struct MovementController {
    config: MovementConfig,
}

impl MovementController {
    pub fn new(config: MovementConfig) -> Self {
        Self { config }
    }

    /// Delta for one step in `direction`, faster while driving
    pub fn step_delta(&self, world: &WorldState, direction: Direction) -> (f32, f32) {
        let speed = if world.player.vehicle.is_some() {
            self.config.vehicle_step
        } else {
            self.config.foot_step
        };
        let (ux, uy) = direction.unit();
        (ux * speed, uy * speed)
    }

    /// Move the controlled actor by a delta, clamped to the map.
    /// While driving, the vehicle is moved along with the player.
    pub fn move_by(&self, world: &mut WorldState, dx: f32, dy: f32) -> Result<Position, Rejection> {
        if !dx.is_finite() || !dy.is_finite() {
            return Err(Rejection::InvalidInput);
        }

        let current = world.player.position;
        let next = Position::new(current.x + dx, current.y + dy).clamped_to_map();
        world.player.position = next;

        if let Some(vehicle_id) = world.player.vehicle.clone() {
            if let Some(vehicle) = world.vehicle_mut(&vehicle_id) {
                vehicle.position = next;
            }
        }

        Ok(next)
    }

    /// Get into a nearby vehicle. The player snaps onto it and drives it from now on.
    pub fn enter_vehicle(&self, world: &mut WorldState, vehicle_id: &str) -> CommandOutcome {
        if let Some(current) = &world.player.vehicle {
            return Err(Rejection::AlreadyInVehicle(current.clone()));
        }

        let vehicle_pos = world
            .vehicle(vehicle_id)
            .map(|v| v.position)
            .ok_or_else(|| Rejection::UnknownVehicle(vehicle_id.to_string()))?;

        let player_pos = world.player.position;
        if !is_within(player_pos, vehicle_pos, ENTER_VEHICLE_RADIUS) {
            let distance = player_pos.distance_to(vehicle_pos);
            debug!(vehicle_id, distance, "Vehicle out of reach");
            return Err(Rejection::VehicleOutOfRange {
                vehicle_id: vehicle_id.to_string(),
                distance,
            });
        }

        world.player.position = vehicle_pos;
        world.player.vehicle = Some(vehicle_id.to_string());
        world.player.has_entered_vehicle = true;

        info!(vehicle_id, "Player entered vehicle");
        Ok(vec![GameEvent::VehicleEntered {
            vehicle_id: vehicle_id.to_string(),
        }])
    }

    /// Leave the current vehicle where it stands. No-op when on foot.
    pub fn exit_vehicle(&self, world: &mut WorldState) -> CommandOutcome {
        match world.player.vehicle.take() {
            Some(vehicle_id) => {
                info!(vehicle_id = %vehicle_id, "Player exited vehicle");
                Ok(vec![GameEvent::VehicleExited { vehicle_id }])
            }
            None => Ok(Vec::new()),
        }
    }
}
