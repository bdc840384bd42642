//! Game simulation modules

pub mod ai;
pub mod clock;
pub mod combat;
pub mod economy;
pub mod engine;
pub mod mission;
pub mod physics;
pub mod scenario;
pub mod snapshot;
pub mod world;

pub use engine::Engine;
pub use scenario::Scenario;
pub use snapshot::WorldSnapshot;
pub use world::{Position, WorldState};
