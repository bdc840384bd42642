//! Building transactions: purchases, treatment, surrender and robberies
//!
//! Each building kind offers a fixed menu. Every action validates its
//! precondition before touching state; a failed check is a rejection and
//! leaves the world as it was.

use serde::Serialize;
use tracing::{debug, info};

use crate::session::protocol::{BuildingAction, CommandOutcome, GameEvent, Rejection};
use crate::util::random::RandomSource;
use crate::util::time::ROBBERY_TICK_MS;

use super::clock::{Clock, Task};
use super::physics::is_within;
use super::world::{Building, BuildingKind, WorldState, CRITICAL_HEALTH, MAX_HEALTH};

/// Distance from a building's center at which its menu is available
pub const INTERACTION_RADIUS: f32 = 50.0;

pub const HEALTH_PACK_PRICE: u64 = 100;
pub const HEALTH_PACK_AMOUNT: f32 = 50.0;
pub const AMMO_PRICE: u64 = 50;
pub const FULL_TREATMENT_PRICE: u64 = 200;
pub const EMERGENCY_HEAL_AMOUNT: f32 = 50.0;
/// Highest wanted level at which a bank can still be robbed
pub const BANK_ROBBERY_MAX_WANTED: u8 = 2;
pub const SURRENDER_FINE_CAP: u64 = 500;

pub const ROBBERY_STEP: u8 = 10;
pub const ROBBERY_PAYOUT_MIN: u64 = 200;
pub const ROBBERY_PAYOUT_MAX: u64 = 699;
pub const ROBBERY_HEAT: i32 = 2;

/// Menu offered by each building kind
pub fn offered_actions(kind: BuildingKind) -> &'static [BuildingAction] {
    match kind {
        BuildingKind::Store => &[
            BuildingAction::BuyHealth,
            BuildingAction::BuyAmmo,
            BuildingAction::Rob,
        ],
        BuildingKind::Bank => &[BuildingAction::Rob],
        BuildingKind::Hospital => &[
            BuildingAction::FullTreatment,
            BuildingAction::EmergencyTreatment,
        ],
        BuildingKind::PoliceStation => &[BuildingAction::Surrender],
    }
}

/// Robbery lifecycle. Payout happens on the tick that reaches 100 and drops straight back to idle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RobberyState {
    Idle,
    InProgress { building_id: String, progress: u8 },
}

#[derive(Debug)]
pub struct EconomyInteractions {
    robbery: RobberyState,
}

impl Default for EconomyInteractions {
    fn default() -> Self {
        Self::new()
    }
}

impl EconomyInteractions {
    pub fn new() -> Self {
        Self {
            robbery: RobberyState::Idle,
        }
    }

    pub fn robbery(&self) -> &RobberyState {
        &self.robbery
    }

    pub fn is_robbing(&self) -> bool {
        matches!(self.robbery, RobberyState::InProgress { .. })
    }

    /// Closest interactable building in reach of the player
    pub fn nearby_building<'w>(&self, world: &'w WorldState) -> Option<&'w Building> {
        let player = world.player.position;
        world
            .buildings
            .iter()
            .filter(|b| b.interactable && is_within(player, b.center(), INTERACTION_RADIUS))
            .min_by(|a, b| {
                player
                    .distance_to(a.center())
                    .total_cmp(&player.distance_to(b.center()))
            })
    }

    /// Perform `action` at a building
    pub fn interact(
        &mut self,
        world: &mut WorldState,
        clock: &mut Clock,
        building_id: &str,
        action: BuildingAction,
    ) -> CommandOutcome {
        if self.is_robbing() {
            return Err(Rejection::RobberyInProgress);
        }

        let building = world
            .building(building_id)
            .ok_or_else(|| Rejection::UnknownBuilding(building_id.to_string()))?;
        if !building.interactable {
            return Err(Rejection::BuildingClosed(building_id.to_string()));
        }
        if !is_within(world.player.position, building.center(), INTERACTION_RADIUS) {
            return Err(Rejection::OutOfReach(building_id.to_string()));
        }
        let kind = building.kind;
        if !offered_actions(kind).contains(&action) {
            return Err(Rejection::ActionNotOffered { action, kind });
        }

        let result = match action {
            BuildingAction::BuyHealth => buy_health(world),
            BuildingAction::BuyAmmo => buy_ammo(world),
            BuildingAction::Rob => self.start_robbery(world, clock, building_id, kind),
            BuildingAction::FullTreatment => full_treatment(world),
            BuildingAction::EmergencyTreatment => emergency_treatment(world),
            BuildingAction::Surrender => surrender(world),
        };

        match &result {
            Ok(_) => info!(building_id, ?action, "Building interaction"),
            Err(reason) => debug!(building_id, ?action, %reason, "Building interaction refused"),
        }
        result
    }

    fn start_robbery(
        &mut self,
        world: &WorldState,
        clock: &mut Clock,
        building_id: &str,
        kind: BuildingKind,
    ) -> CommandOutcome {
        if kind == BuildingKind::Bank && world.player.wanted_level > BANK_ROBBERY_MAX_WANTED {
            return Err(Rejection::PreconditionFailed("wanted level too high to rob a bank"));
        }

        self.robbery = RobberyState::InProgress {
            building_id: building_id.to_string(),
            progress: 0,
        };
        clock.start_periodic(Task::Robbery, ROBBERY_TICK_MS);

        Ok(vec![GameEvent::RobberyStarted {
            building_id: building_id.to_string(),
        }])
    }

    /// Advance the running robbery by one step, paying out at 100
    pub fn on_robbery_tick<R: RandomSource>(
        &mut self,
        world: &mut WorldState,
        clock: &mut Clock,
        rng: &mut R,
    ) -> Vec<GameEvent> {
        let RobberyState::InProgress {
            building_id,
            progress,
        } = &mut self.robbery
        else {
            clock.cancel(Task::Robbery);
            return Vec::new();
        };

        *progress = progress.saturating_add(ROBBERY_STEP).min(100);
        let mut events = vec![GameEvent::RobberyProgress {
            building_id: building_id.clone(),
            progress: *progress,
        }];
        if *progress < 100 {
            return events;
        }

        let building_id = building_id.clone();
        self.robbery = RobberyState::Idle;
        clock.cancel(Task::Robbery);

        let payout = rng.between(ROBBERY_PAYOUT_MIN, ROBBERY_PAYOUT_MAX);
        let delta = world.player.credit(payout);
        let heat = world.player.change_wanted_level(ROBBERY_HEAT);

        info!(building_id = %building_id, payout, wanted = world.player.wanted_level, "Robbery paid out");
        events.push(GameEvent::RobberyCompleted {
            building_id,
            payout,
        });
        events.push(GameEvent::MoneyChanged { delta });
        if heat != 0 {
            events.push(GameEvent::WantedLevelChanged { delta: heat });
        }
        events
    }

    /// Close the dialog, abandoning any robbery in progress
    pub fn dismiss(&mut self, clock: &mut Clock) -> CommandOutcome {
        match std::mem::replace(&mut self.robbery, RobberyState::Idle) {
            RobberyState::InProgress {
                building_id,
                progress,
            } => {
                clock.cancel(Task::Robbery);
                info!(building_id = %building_id, progress, "Robbery abandoned");
                Ok(vec![GameEvent::RobberyCancelled { building_id }])
            }
            RobberyState::Idle => Ok(Vec::new()),
        }
    }
}

fn require_funds(world: &WorldState, price: u64) -> Result<(), Rejection> {
    if world.player.money < price {
        return Err(Rejection::InsufficientFunds {
            required: price,
            available: world.player.money,
        });
    }
    Ok(())
}

fn buy_health(world: &mut WorldState) -> CommandOutcome {
    require_funds(world, HEALTH_PACK_PRICE)?;
    let delta = world.player.debit(HEALTH_PACK_PRICE);
    world.player.change_health(HEALTH_PACK_AMOUNT);
    Ok(vec![GameEvent::MoneyChanged { delta }])
}

fn buy_ammo(world: &mut WorldState) -> CommandOutcome {
    require_funds(world, AMMO_PRICE)?;
    if world.player.weapon().is_none() {
        return Err(Rejection::NoWeapon);
    }
    let delta = world.player.debit(AMMO_PRICE);
    if let Some(weapon) = world.player.weapon_mut() {
        weapon.refill();
    }
    Ok(vec![GameEvent::MoneyChanged { delta }])
}

fn full_treatment(world: &mut WorldState) -> CommandOutcome {
    require_funds(world, FULL_TREATMENT_PRICE)?;
    if world.player.health >= MAX_HEALTH {
        return Err(Rejection::PreconditionFailed("already at full health"));
    }
    let delta = world.player.debit(FULL_TREATMENT_PRICE);
    world.player.change_health(MAX_HEALTH);
    Ok(vec![GameEvent::MoneyChanged { delta }])
}

fn emergency_treatment(world: &mut WorldState) -> CommandOutcome {
    if world.player.health > CRITICAL_HEALTH {
        return Err(Rejection::PreconditionFailed("emergency care is for critical patients"));
    }
    // Clamped to the ceiling like every other heal
    world.player.change_health(EMERGENCY_HEAL_AMOUNT);
    Ok(Vec::new())
}

fn surrender(world: &mut WorldState) -> CommandOutcome {
    if world.player.wanted_level == 0 {
        return Err(Rejection::PreconditionFailed("not wanted"));
    }
    let cleared = world.player.change_wanted_level(-i32::from(world.player.wanted_level));
    let fine = (world.player.money / 10).min(SURRENDER_FINE_CAP);
    let delta = world.player.debit(fine);

    let mut events = vec![GameEvent::WantedLevelChanged { delta: cleared }];
    if delta != 0 {
        events.push(GameEvent::MoneyChanged { delta });
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::scenario::{Scenario, BANK, HOSPITAL, POLICE_STATION, STORE};
    use crate::game::world::Ammo;
    use crate::util::random::ScriptedRandom;

    fn at(building_id: &str) -> WorldState {
        let mut world = Scenario::downtown().world;
        world.player.position = world.building(building_id).unwrap().center();
        world
    }

    #[test]
    fn health_pack_costs_one_hundred() {
        let mut world = at(STORE);
        world.player.health = 70.0;
        let mut economy = EconomyInteractions::new();
        let mut clock = Clock::new();

        let events = economy
            .interact(&mut world, &mut clock, STORE, BuildingAction::BuyHealth)
            .unwrap();
        assert_eq!(events, vec![GameEvent::MoneyChanged { delta: -100 }]);
        assert_eq!(world.player.money, 900);
        assert_eq!(world.player.health, 100.0);
    }

    #[test]
    fn broke_player_cannot_buy() {
        let mut world = at(STORE);
        world.player.money = 99;
        let mut economy = EconomyInteractions::new();
        let mut clock = Clock::new();

        assert_eq!(
            economy.interact(&mut world, &mut clock, STORE, BuildingAction::BuyHealth),
            Err(Rejection::InsufficientFunds {
                required: 100,
                available: 99
            })
        );
        assert_eq!(world.player.money, 99);
    }

    #[test]
    fn ammo_refills_current_weapon() {
        let mut world = at(STORE);
        world.player.current_weapon = 1;
        world.player.weapons[1].ammo = Ammo::Rounds(3);
        let mut economy = EconomyInteractions::new();
        let mut clock = Clock::new();

        economy
            .interact(&mut world, &mut clock, STORE, BuildingAction::BuyAmmo)
            .unwrap();
        assert_eq!(world.player.weapons[1].ammo, Ammo::Rounds(50));
        assert_eq!(world.player.money, 950);
    }

    #[test]
    fn too_far_away_is_out_of_reach() {
        let mut world = at(STORE);
        let center = world.building(STORE).unwrap().center();
        world.player.position.x = center.x + 51.0;
        world.player.position.y = center.y;
        let mut economy = EconomyInteractions::new();
        let mut clock = Clock::new();

        assert_eq!(
            economy.interact(&mut world, &mut clock, STORE, BuildingAction::BuyHealth),
            Err(Rejection::OutOfReach(STORE.to_string()))
        );
    }

    #[test]
    fn menus_follow_building_kind() {
        let mut world = at(HOSPITAL);
        let mut economy = EconomyInteractions::new();
        let mut clock = Clock::new();

        assert_eq!(
            economy.interact(&mut world, &mut clock, HOSPITAL, BuildingAction::Rob),
            Err(Rejection::ActionNotOffered {
                action: BuildingAction::Rob,
                kind: BuildingKind::Hospital
            })
        );
    }

    #[test]
    fn full_treatment_needs_money_and_injury() {
        let mut world = at(HOSPITAL);
        let mut economy = EconomyInteractions::new();
        let mut clock = Clock::new();

        assert!(economy
            .interact(&mut world, &mut clock, HOSPITAL, BuildingAction::FullTreatment)
            .is_err());

        world.player.health = 35.0;
        economy
            .interact(&mut world, &mut clock, HOSPITAL, BuildingAction::FullTreatment)
            .unwrap();
        assert_eq!(world.player.health, 100.0);
        assert_eq!(world.player.money, 800);
    }

    #[test]
    fn emergency_treatment_is_free_but_only_when_critical() {
        let mut world = at(HOSPITAL);
        let mut economy = EconomyInteractions::new();
        let mut clock = Clock::new();
        world.player.health = 21.0;
        assert!(economy
            .interact(&mut world, &mut clock, HOSPITAL, BuildingAction::EmergencyTreatment)
            .is_err());

        world.player.health = 20.0;
        economy
            .interact(&mut world, &mut clock, HOSPITAL, BuildingAction::EmergencyTreatment)
            .unwrap();
        assert_eq!(world.player.health, 70.0);
        assert_eq!(world.player.money, 1000);
    }

    #[test]
    fn surrender_fine_is_capped() {
        let mut world = at(POLICE_STATION);
        world.player.money = 6000;
        world.player.wanted_level = 2;
        let mut economy = EconomyInteractions::new();
        let mut clock = Clock::new();

        let events = economy
            .interact(&mut world, &mut clock, POLICE_STATION, BuildingAction::Surrender)
            .unwrap();
        assert_eq!(world.player.money, 5500);
        assert_eq!(world.player.wanted_level, 0);
        assert_eq!(
            events,
            vec![
                GameEvent::WantedLevelChanged { delta: -2 },
                GameEvent::MoneyChanged { delta: -500 },
            ]
        );
    }

    #[test]
    fn surrender_takes_a_tenth_below_the_cap() {
        let mut world = at(POLICE_STATION);
        world.player.money = 1000;
        world.player.wanted_level = 4;
        let mut economy = EconomyInteractions::new();
        let mut clock = Clock::new();

        economy
            .interact(&mut world, &mut clock, POLICE_STATION, BuildingAction::Surrender)
            .unwrap();
        assert_eq!(world.player.money, 900);
    }

    #[test]
    fn bank_refuses_hot_robbers() {
        let mut world = at(BANK);
        world.player.wanted_level = 3;
        let mut economy = EconomyInteractions::new();
        let mut clock = Clock::new();

        assert!(matches!(
            economy.interact(&mut world, &mut clock, BANK, BuildingAction::Rob),
            Err(Rejection::PreconditionFailed(_))
        ));
        assert!(!economy.is_robbing());
        assert!(!clock.is_scheduled(Task::Robbery));
    }

    #[test]
    fn bank_still_open_to_robbers_at_wanted_two() {
        let mut world = at(BANK);
        world.player.wanted_level = 2;
        let mut economy = EconomyInteractions::new();
        let mut clock = Clock::new();

        assert_eq!(
            economy.interact(&mut world, &mut clock, BANK, BuildingAction::Rob),
            Ok(vec![GameEvent::RobberyStarted {
                building_id: BANK.to_string()
            }])
        );
        assert!(economy.is_robbing());
        assert!(clock.is_scheduled(Task::Robbery));
    }

    #[test]
    fn robbery_pays_out_on_tenth_step() {
        let mut world = at(STORE);
        let mut economy = EconomyInteractions::new();
        let mut clock = Clock::new();
        let mut rng = ScriptedRandom::constant(0.5);

        economy
            .interact(&mut world, &mut clock, STORE, BuildingAction::Rob)
            .unwrap();
        assert_eq!(
            economy.interact(&mut world, &mut clock, STORE, BuildingAction::BuyHealth),
            Err(Rejection::RobberyInProgress)
        );

        for _ in 0..9 {
            economy.on_robbery_tick(&mut world, &mut clock, &mut rng);
        }
        assert_eq!(
            economy.robbery(),
            &RobberyState::InProgress {
                building_id: STORE.to_string(),
                progress: 90
            }
        );

        let events = economy.on_robbery_tick(&mut world, &mut clock, &mut rng);
        assert!(events.contains(&GameEvent::RobberyCompleted {
            building_id: STORE.to_string(),
            payout: 450
        }));
        assert_eq!(world.player.money, 1450);
        assert_eq!(world.player.wanted_level, 2);
        assert_eq!(economy.robbery(), &RobberyState::Idle);
        assert!(!clock.is_scheduled(Task::Robbery));
    }

    #[test]
    fn dismiss_cancels_robbery() {
        let mut world = at(STORE);
        let mut economy = EconomyInteractions::new();
        let mut clock = Clock::new();

        economy
            .interact(&mut world, &mut clock, STORE, BuildingAction::Rob)
            .unwrap();
        let events = economy.dismiss(&mut clock).unwrap();
        assert_eq!(
            events,
            vec![GameEvent::RobberyCancelled {
                building_id: STORE.to_string()
            }]
        );
        assert!(!clock.is_scheduled(Task::Robbery));
        assert_eq!(economy.dismiss(&mut clock), Ok(Vec::new()));
    }

    #[test]
    fn nearby_building_picks_closest_in_reach() {
        let world = at(STORE);
        let economy = EconomyInteractions::new();
        assert_eq!(economy.nearby_building(&world).map(|b| b.id.as_str()), Some(STORE));

        let mut far = world.clone();
        far.player.position = crate::game::world::Position::new(400.0, 300.0);
        assert!(economy.nearby_building(&far).is_none());
    }
}
