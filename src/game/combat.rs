//! Combat system - firing, bullet flight, hit resolution

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::session::protocol::{CommandOutcome, GameEvent, Rejection, Target};
use crate::util::rate_limit::Cooldown;
use crate::util::time::FIRE_COOLDOWN_MS;

use super::physics::is_inside;
use super::world::{Position, WorldState};

/// Radius around a bullet's target point in which actors are hit
pub const HIT_RADIUS: f32 = 20.0;

/// Which side fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulletSide {
    /// Hits NPCs
    Player,
    /// Hits the player
    Hostile,
}

/// Projectile travelling in a straight line to a fixed point
#[derive(Debug, Clone, Serialize)]
pub struct Bullet {
    pub id: Uuid,
    pub position: Position,
    pub target: Position,
    /// Distance covered per physics tick
    pub speed: f32,
    pub damage: f32,
    pub side: BulletSide,
}

impl Bullet {
    pub fn new(origin: Position, target: Position, speed: f32, damage: f32, side: BulletSide) -> Self {
        Self {
            id: Uuid::new_v4(),
            position: origin,
            target,
            speed,
            damage,
            side,
        }
    }

    /// Advance one physics tick, returns true once the bullet has arrived
    pub fn advance(&mut self) -> bool {
        let dx = self.target.x - self.position.x;
        let dy = self.target.y - self.position.y;
        let remaining = (dx * dx + dy * dy).sqrt();

        if remaining < self.speed || self.speed <= 0.0 {
            return true;
        }

        self.position.x += dx / remaining * self.speed;
        self.position.y += dy / remaining * self.speed;
        false
    }
}

/// Owns in-flight bullets and the fire cooldown of each actor id
#[derive(Debug)]
pub struct CombatEngine {
    bullets: Vec<Bullet>,
    cooldown: Cooldown<String>,
}

impl Default for CombatEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CombatEngine {
    pub fn new() -> Self {
        Self {
            bullets: Vec::new(),
            cooldown: Cooldown::new(FIRE_COOLDOWN_MS),
        }
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    /// Fire the player's current weapon from `origin` toward `target`.
    ///
    /// Accepted shots spend a round (unless unlimited), raise the wanted level
    /// by one and queue a bullet. Rejected shots leave everything untouched.
    pub fn fire(
        &mut self,
        world: &mut WorldState,
        origin: Position,
        target: Position,
        now_ms: u64,
    ) -> CommandOutcome {
        if !origin.is_finite() || !target.is_finite() {
            return Err(Rejection::InvalidInput);
        }

        let weapon = world.player.weapon().ok_or(Rejection::NoWeapon)?;
        if weapon.ammo.is_empty() {
            return Err(Rejection::OutOfAmmo);
        }
        let (speed, damage) = (weapon.projectile_speed, weapon.damage);

        let shooter = world.player.id.clone();
        if !self.cooldown.try_acquire(shooter.clone(), now_ms) {
            let remaining_ms = self.cooldown.remaining(&shooter, now_ms);
            debug!(shooter = %shooter, remaining_ms, "Shot rate limited");
            return Err(Rejection::RateLimited { remaining_ms });
        }

        if let Some(weapon) = world.player.weapon_mut() {
            weapon.ammo.consume();
        }

        let mut events = vec![self.spawn(Bullet::new(origin, target, speed, damage, BulletSide::Player))];

        let delta = world.player.change_wanted_level(1);
        if delta != 0 {
            events.push(GameEvent::WantedLevelChanged { delta });
        }

        Ok(events)
    }

    /// Queue a bullet fired by a hostile NPC
    pub fn fire_hostile(&mut self, origin: Position, target: Position, speed: f32, damage: f32) -> GameEvent {
        self.spawn(Bullet::new(origin, target, speed, damage, BulletSide::Hostile))
    }

    fn spawn(&mut self, bullet: Bullet) -> GameEvent {
        let event = GameEvent::ShotFired {
            bullet_id: bullet.id,
            side: bullet.side,
            origin: bullet.position,
            target: bullet.target,
        };
        self.bullets.push(bullet);
        event
    }

    /// Run one physics tick: move every bullet and resolve the ones that arrived
    pub fn advance(&mut self, world: &mut WorldState) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let in_flight = std::mem::take(&mut self.bullets);

        for mut bullet in in_flight {
            if bullet.advance() {
                events.extend(Self::resolve(world, &bullet));
            } else {
                self.bullets.push(bullet);
            }
        }

        events
    }

    /// Apply a bullet's damage around its target point
    fn resolve(world: &mut WorldState, bullet: &Bullet) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let mut hits = 0;

        match bullet.side {
            BulletSide::Player => {
                for npc in world.npcs.iter_mut() {
                    if !npc.is_alive() || !is_inside(npc.position, bullet.target, HIT_RADIUS) {
                        continue;
                    }
                    hits += 1;
                    let amount = npc.take_damage(bullet.damage);
                    events.push(GameEvent::Damaged {
                        target: Target::Npc(npc.id.clone()),
                        amount,
                    });
                    if !npc.is_alive() {
                        info!(npc_id = %npc.id, kind = ?npc.kind, "NPC killed");
                        events.push(GameEvent::NpcKilled { npc_id: npc.id.clone() });
                    }
                }
            }
            BulletSide::Hostile => {
                if is_inside(world.player.position, bullet.target, HIT_RADIUS) {
                    hits += 1;
                    events.extend(damage_player(world, bullet.damage));
                }
            }
        }

        debug!(bullet_id = %bullet.id, side = ?bullet.side, hits, "Bullet resolved");
        events.push(GameEvent::BulletResolved {
            bullet_id: bullet.id,
            side: bullet.side,
            hits,
        });
        events
    }
}

/// Damage the player, flagging the drop into critical health
pub fn damage_player(world: &mut WorldState, damage: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let was_critical = world.player.is_critical();
    let applied = -world.player.change_health(-damage);

    if applied > 0.0 {
        events.push(GameEvent::Damaged {
            target: Target::Player,
            amount: applied,
        });
    }
    if !was_critical && world.player.is_critical() {
        info!(health = world.player.health, "Player health critical");
        events.push(GameEvent::HealthCritical);
    }
    events
}
