//! Physics module
//!
//! Movement stage (steering + поворот), collision layers, spawn helpers.

pub mod layers;
pub mod movement;

// Re-export основных типов
pub use movement::{
    heading_rotation,
    herder_bundle,
    move_towards,
    rotate_towards,
    spawn_herder,
    spawn_safe_zone,
    spawn_sheep,
    HerderMovementPlugin,
    SteeringOutput,
};
