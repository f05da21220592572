//! ECS Components для herding симуляции
//!
//! Организация по доменам:
//! - herder: пастух (Herder, HerderConfig, PhysicsBody)
//! - world: объекты мира, которые пастух только читает (Sheep, SafeZone key, PatrolBounds)

pub mod herder;
pub mod world;

// Re-exports для удобного импорта
pub use herder::*;
pub use world::*;
